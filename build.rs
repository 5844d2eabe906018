fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        // SAFETY: build scripts run single-threaded before any protoc invocation.
        unsafe { std::env::set_var("PROTOC", protoc) };
    }

    tonic_build::compile_protos("proto/tfplugin6.proto")?;
    tonic_build::compile_protos("proto/grpc_controller.proto")?;

    Ok(())
}
