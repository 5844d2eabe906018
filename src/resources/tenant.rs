use std::collections::BTreeMap;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, TENANTS, Tenant};
use crate::terraform::schema::{Attribute, AttributeType, Schema};
use crate::terraform::value::Value;

pub struct TenantMapping;

impl Mapping for TenantMapping {
    type Dto = Tenant;

    const TYPE_NAME: &'static str = "octopusdeploy_tenant";
    const DISPLAY: &'static str = "tenant";
    const COLLECTION: Collection = TENANTS;
    const PLURAL: &'static str = "tenants";
    const DATA_SOURCE: &'static str = "octopusdeploy_tenants";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages tenants in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
                Attribute::map(
                    "project_environments",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .optional()
                .description("Environment IDs this tenant can be deployed to, keyed by project ID."),
                common::tenant_tags(),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Tenant, ResourceError> {
        let project_environments: BTreeMap<String, Vec<String>> = value
            .get("project_environments")
            .as_object()
            .map(|projects| {
                projects
                    .iter()
                    .map(|(project, environments)| {
                        let environments = environments
                            .as_list()
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect();
                        (project.clone(), environments)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Tenant {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            project_environments,
            tenant_tags: value.get_strings("tenant_tags"),
        })
    }

    fn flatten(tenant: &Tenant) -> Value {
        let project_environments = if tenant.project_environments.is_empty() {
            Value::Null
        } else {
            Value::object(
                tenant
                    .project_environments
                    .iter()
                    .map(|(project, environments)| (project.as_str(), Value::strings(environments))),
            )
        };

        Value::object([
            ("id", Value::from(tenant.id.clone())),
            ("space_id", Value::optional_string(&tenant.space_id)),
            ("name", Value::from(&tenant.name)),
            ("description", Value::optional_string(&tenant.description)),
            ("project_environments", project_environments),
            ("tenant_tags", Value::strings(&tenant.tenant_tags)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_project_environments() {
        let planned = Value::object([
            ("name", Value::from("Acme")),
            (
                "project_environments",
                Value::object([
                    ("Projects-1", Value::strings(["Environments-1", "Environments-2"])),
                    ("Projects-2", Value::strings(Vec::<String>::new())),
                ]),
            ),
            ("tenant_tags", Value::strings(["Tier/Gold"])),
        ]);
        let tenant = TenantMapping::expand(&planned).unwrap();
        assert_eq!(tenant.project_environments["Projects-1"], vec!["Environments-1", "Environments-2"]);
        assert!(tenant.project_environments["Projects-2"].is_empty());

        let json = serde_json::to_value(&tenant).unwrap();
        assert_eq!(json["ProjectEnvironments"]["Projects-1"][1], "Environments-2");
        assert_eq!(json["TenantTags"][0], "Tier/Gold");
    }

    #[test]
    fn test_flatten_empty_project_environments_is_null() {
        let tenant = Tenant {
            id: Some("Tenants-1".to_string()),
            name: "Acme".to_string(),
            ..Default::default()
        };
        let value = TenantMapping::flatten(&tenant);
        assert!(value.get("project_environments").is_null());
        assert!(value.get_list("tenant_tags").is_empty());
    }
}
