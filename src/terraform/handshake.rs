//! go-plugin handshake and the gRPC server Terraform connects to.

use std::fmt;
use std::io::Write;
use std::net::SocketAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};

use super::plugin::grpc_controller_server::{GrpcController, GrpcControllerServer};
use super::plugin::Empty;
use super::proto::provider_server::ProviderServer;
use super::server::ProviderService;
use crate::error::PluginError;

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str = "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";
pub const PROTOCOL_VERSIONS_ENV: &str = "PLUGIN_PROTOCOL_VERSIONS";
pub const CLIENT_CERT_ENV: &str = "PLUGIN_CLIENT_CERT";

pub const CORE_PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_VERSION: u32 = 6;

/// Registry address Terraform knows this provider by, used for reattaching.
pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/octopusdeploylabs/octopusdeploy";

/// The line go-plugin expects on stdout once the server is listening.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub addr: SocketAddr,
    /// Base64 DER of the server certificate, when serving TLS.
    pub certificate: Option<String>,
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CORE_PROTOCOL_VERSION}|{PROTOCOL_VERSION}|tcp|{}|grpc|{}",
            self.addr,
            self.certificate.as_deref().unwrap_or_default()
        )
    }
}

/// Refuses to run unless launched by Terraform speaking protocol 6.
pub fn check_environment(env: impl Fn(&str) -> Option<String>) -> Result<(), PluginError> {
    if env(MAGIC_COOKIE_KEY).as_deref() != Some(MAGIC_COOKIE_VALUE) {
        return Err(PluginError::Handshake(
            "this binary is a plugin and is not meant to be executed directly; \
             run Terraform with this provider instead, or pass --debug"
                .to_string(),
        ));
    }

    if let Some(versions) = env(PROTOCOL_VERSIONS_ENV).filter(|v| !v.is_empty()) {
        let supported = versions
            .split(',')
            .any(|v| v.trim().parse::<u32>() == Ok(PROTOCOL_VERSION));
        if !supported {
            return Err(PluginError::UnsupportedProtocol(versions));
        }
    }
    Ok(())
}

pub struct ServerCertificate {
    pub cert_pem: String,
    pub key_pem: String,
    pub der_base64: String,
}

/// Self-signed `localhost` certificate for AutoMTLS.
pub fn generate_certificate() -> Result<ServerCertificate, PluginError> {
    let key_pair = KeyPair::generate()?;
    let mut params = CertificateParams::new(vec!["localhost".to_string()])?;
    params.distinguished_name.push(DnType::OrganizationName, "HashiCorp");
    params.distinguished_name.push(DnType::CommonName, "localhost");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];
    let cert = params.self_signed(&key_pair)?;

    Ok(ServerCertificate {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
        der_base64: STANDARD_NO_PAD.encode(cert.der()),
    })
}

/// The `TF_REATTACH_PROVIDERS` value pointing Terraform at a running debug server.
pub fn reattach_config(addr: SocketAddr, pid: u32) -> serde_json::Value {
    serde_json::json!({
        (PROVIDER_ADDRESS): {
            "Protocol": "grpc",
            "ProtocolVersion": PROTOCOL_VERSION,
            "Pid": pid,
            "Test": true,
            "Addr": {
                "Network": "tcp",
                "String": addr.to_string(),
            },
        }
    })
}

/// Answers `plugin.GRPCController/Shutdown` by stopping the server.
struct Controller {
    shutdown: mpsc::Sender<()>,
}

#[tonic::async_trait]
impl GrpcController for Controller {
    async fn shutdown(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        tracing::info!("shutdown requested by terraform");
        // A full channel means a shutdown is already on its way.
        let _ = self.shutdown.try_send(());
        Ok(Response::new(Empty {}))
    }
}

/// Runs the provider until Terraform asks it to shut down.
pub async fn serve(service: ProviderService, debug_mode: bool) -> Result<(), PluginError> {
    if !debug_mode {
        check_environment(|key| std::env::var(key).ok())?;
    }

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let mut builder = Server::builder();
    let mut certificate = None;
    if !debug_mode && std::env::var_os(CLIENT_CERT_ENV).is_some() {
        let generated = generate_certificate()?;
        let identity = Identity::from_pem(&generated.cert_pem, &generated.key_pem);
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        certificate = Some(generated.der_base64);
        tracing::debug!("serving with AutoMTLS");
    }

    let (mut health, health_service) = tonic_health::server::health_reporter();
    health
        .set_service_status("plugin", tonic_health::ServingStatus::Serving)
        .await;

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let controller = Controller { shutdown: shutdown_tx };

    announce(addr, certificate, debug_mode)?;
    tracing::info!(%addr, debug_mode, "provider listening");

    let shutdown = async move {
        if debug_mode {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        } else {
            let _ = shutdown_rx.recv().await;
        }
    };

    builder
        .add_service(health_service)
        .add_service(GrpcControllerServer::new(controller))
        .add_service(ProviderServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    tracing::info!("provider stopped");
    Ok(())
}

fn announce(addr: SocketAddr, certificate: Option<String>, debug: bool) -> Result<(), PluginError> {
    let mut stdout = std::io::stdout().lock();
    if debug {
        let reattach = reattach_config(addr, std::process::id());
        writeln!(
            stdout,
            "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS environment variable with the following:\n\n\tTF_REATTACH_PROVIDERS='{reattach}'\n"
        )?;
    } else {
        writeln!(stdout, "{}", Handshake { addr, certificate })?;
    }
    stdout.flush()?;
    Ok(())
}
