use async_trait::async_trait;

use super::DataSource;
use crate::octopus::types::{SPACES, Space};
use crate::octopus::{ListQuery, OctopusClient, OctopusError};
use crate::resources::{Mapping, ResourceError, SpaceMapping};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

/// Looks up one space by its exact name.
pub struct SpaceDataSource;

#[async_trait]
impl DataSource for SpaceDataSource {
    fn type_name(&self) -> &'static str {
        "octopusdeploy_space"
    }

    fn schema(&self) -> Schema {
        let attributes = SpaceMapping::schema()
            .as_data_source()
            .into_iter()
            .map(|attr| match attr.name.as_str() {
                "name" => Attribute::string("name")
                    .required()
                    .validate(Validator::NotEmpty)
                    .description("The name of the space to look up."),
                _ => attr,
            })
            .collect();
        Schema::new("Provides information about an existing space.", attributes)
    }

    async fn read(&self, client: &OctopusClient, config: &Value) -> Result<Value, ResourceError> {
        let name = config
            .get_non_empty("name")
            .ok_or_else(|| ResourceError::InvalidConfig("name must be configured".to_string()))?;
        let query = ListQuery {
            partial_name: Some(name.clone()),
            ..Default::default()
        };

        let spaces: Vec<Space> = client.list_all(SPACES, None, &query).await?;
        let space = spaces
            .iter()
            .find(|space| space.name == name)
            .ok_or_else(|| OctopusError::NotFound {
                resource: format!("spaces?name={name}"),
            })?;
        tracing::debug!(id = space.id.as_deref().unwrap_or_default(), %name, "found space");
        Ok(SpaceMapping::flatten(space))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_the_only_argument() {
        let schema = SpaceDataSource.schema();
        let name = schema.attribute("name").unwrap();
        assert!(name.required && !name.computed);
        for attr in schema.attributes.iter().filter(|a| a.name != "name") {
            assert!(attr.computed && !attr.optional, "{}", attr.name);
        }
    }
}
