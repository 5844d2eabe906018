//! Terraform provider for Octopus Deploy
//!
//! Serves the Terraform plugin protocol (version 6) and maps Octopus Deploy
//! REST resources onto Terraform resources and data sources.

pub mod cli;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod mutex;
pub mod octopus;
pub mod output;
pub mod resources;
pub mod terraform;

pub use config::{ConfigError, ProviderConfig};
pub use error::PluginError;
pub use octopus::{Credential, ListQuery, OctopusClient, OctopusError};
pub use resources::{Resource, ResourceError};
pub use terraform::server::ProviderService;
pub use terraform::value::Value;
