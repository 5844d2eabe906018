mod client;
mod error;
pub mod types;

pub use client::{Credential, ListQuery, OctopusClient};
pub use error::OctopusError;
