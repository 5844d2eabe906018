use thiserror::Error;

use crate::octopus::types::{SPACES, Space};
use crate::octopus::{Credential, OctopusClient, OctopusError};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

pub const ADDRESS_ENV: &str = "OCTOPUS_URL";
pub const API_KEY_ENVS: [&str; 2] = ["OCTOPUS_APIKEY", "OCTOPUS_API_KEY"];
pub const ACCESS_TOKEN_ENV: &str = "OCTOPUS_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the Octopus server address is not set; configure \"address\" or set OCTOPUS_URL")]
    MissingAddress,

    #[error(
        "no credential provided; configure \"api_key\" or \"access_token\", or set OCTOPUS_APIKEY or OCTOPUS_ACCESS_TOKEN"
    )]
    MissingCredential,

    #[error("space '{0}' was not found on the Octopus server")]
    SpaceNotFound(String),

    #[error(transparent)]
    Octopus(#[from] OctopusError),
}

/// Resolved provider configuration: attribute values first, environment
/// variables second.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub address: String,
    pub credential: Credential,
    pub space_id: Option<String>,
}

pub fn schema() -> Schema {
    Schema::new(
        "Configures the connection to an Octopus Deploy server.",
        vec![
            Attribute::string("address")
                .optional()
                .validate(Validator::Url)
                .description("The endpoint of the Octopus REST API. Falls back to OCTOPUS_URL."),
            Attribute::string("api_key")
                .optional()
                .sensitive()
                .description(
                    "The API key to use with the Octopus REST API. Falls back to OCTOPUS_APIKEY or OCTOPUS_API_KEY.",
                ),
            Attribute::string("access_token")
                .optional()
                .sensitive()
                .description(
                    "The access token to use with the Octopus REST API. Falls back to OCTOPUS_ACCESS_TOKEN.",
                ),
            Attribute::string("space_id")
                .optional()
                .description("The space ID to target when a resource does not set one."),
        ],
    )
}

impl ProviderConfig {
    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    fn resolve(config: &Value, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let address = config
            .get_non_empty("address")
            .or_else(|| non_empty(env(ADDRESS_ENV)))
            .ok_or(ConfigError::MissingAddress)?;

        let api_key = config
            .get_non_empty("api_key")
            .or_else(|| API_KEY_ENVS.iter().find_map(|key| non_empty(env(key))));
        let access_token = config
            .get_non_empty("access_token")
            .or_else(|| non_empty(env(ACCESS_TOKEN_ENV)));

        let credential = match (api_key, access_token) {
            (Some(key), _) => Credential::ApiKey(key),
            (None, Some(token)) => Credential::AccessToken(token),
            (None, None) => return Err(ConfigError::MissingCredential),
        };

        Ok(Self {
            address,
            credential,
            space_id: config.get_non_empty("space_id"),
        })
    }

    /// Builds the client, checking the configured space exists when one is set.
    pub async fn connect(&self) -> Result<OctopusClient, ConfigError> {
        let client = OctopusClient::new(&self.address, self.credential.clone(), self.space_id.clone())?;

        if let Some(space_id) = &self.space_id {
            match client.get::<Space>(SPACES, None, space_id).await {
                Ok(space) => tracing::info!(%space_id, space = %space.name, "using space"),
                Err(e) if e.is_not_found() => {
                    return Err(ConfigError::SpaceNotFound(space_id.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(address = %self.address, "octopus client configured");
        Ok(client)
    }
}
