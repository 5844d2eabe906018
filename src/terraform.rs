//! The Terraform side of the plugin: protocol types, values, schemas and the
//! gRPC service Terraform talks to.

pub mod diagnostics;
pub mod handshake;
pub mod plan;
pub mod schema;
pub mod server;
pub mod state;
pub mod value;

/// Generated from `proto/tfplugin6.proto`.
pub mod proto {
    tonic::include_proto!("tfplugin6");
}

/// Generated from `proto/grpc_controller.proto`.
pub mod plugin {
    tonic::include_proto!("plugin");
}
