use thiserror::Error;

use crate::resources::ResourceError;

/// Failures of the plugin binary itself, outside any single RPC.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("terraform requested plugin protocol versions {0}, this provider only speaks version 6")]
    UnsupportedProtocol(String),

    #[error("failed to generate TLS certificate: {0}")]
    Certificate(#[from] rcgen::Error),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_handshake_error_display() {
        let err = PluginError::Handshake("missing magic cookie".to_string());
        assert_eq!(err.to_string(), "handshake failed: missing magic cookie");
    }

    #[test]
    fn test_unsupported_protocol_display() {
        let err = PluginError::UnsupportedProtocol("4,5".to_string());
        assert_eq!(
            err.to_string(),
            "terraform requested plugin protocol versions 4,5, this provider only speaks version 6"
        );
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::AddrInUse, "address in use");
        let err: PluginError = io_err.into();
        assert!(matches!(err, PluginError::Io(_)));
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_resource_error_from_conversion() {
        let err: PluginError = ResourceError::UnknownResource("octopusdeploy_nope".to_string()).into();
        assert!(matches!(err, PluginError::Resource(_)));
        assert_eq!(err.to_string(), "unknown resource type: octopusdeploy_nope");
    }
}
