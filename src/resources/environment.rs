use serde_json::json;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, ENVIRONMENTS, Environment, ExtensionSetting};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const JIRA_EXTENSION_ID: &str = "jira-integration";
const JSM_EXTENSION_ID: &str = "jiraservicemanagement-integration";
const SERVICENOW_EXTENSION_ID: &str = "servicenow-integration";

const JIRA_ENVIRONMENT_TYPES: &[&str] = &["development", "production", "staging", "testing", "unmapped"];

pub struct EnvironmentMapping;

impl Mapping for EnvironmentMapping {
    type Dto = Environment;

    const TYPE_NAME: &'static str = "octopusdeploy_environment";
    const DISPLAY: &'static str = "environment";
    const COLLECTION: Collection = ENVIRONMENTS;
    const PLURAL: &'static str = "environments";
    const DATA_SOURCE: &'static str = "octopusdeploy_environments";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages environments in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::slug(Self::DISPLAY),
                common::description(Self::DISPLAY),
                common::sort_order(Self::DISPLAY),
                Attribute::bool("allow_dynamic_infrastructure").default(false),
                Attribute::bool("use_guided_failure").default(false),
                Attribute::list_nested(
                    "jira_extension_settings",
                    vec![
                        Attribute::string("environment_type")
                            .required()
                            .validate(Validator::OneOf(JIRA_ENVIRONMENT_TYPES))
                            .description("The Jira environment type of this Octopus deployment environment."),
                    ],
                )
                .optional()
                .description("Provides extension settings for the Jira integration for this environment."),
                Attribute::list_nested(
                    "jira_service_management_extension_settings",
                    vec![Attribute::bool("is_enabled").required()],
                )
                .optional()
                .description(
                    "Provides extension settings for the Jira Service Management (JSM) integration for this environment.",
                ),
                Attribute::list_nested(
                    "servicenow_extension_settings",
                    vec![Attribute::bool("is_enabled").required()],
                )
                .optional()
                .description("Provides extension settings for the ServiceNow integration for this environment."),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Environment, ResourceError> {
        let mut extension_settings = Vec::new();
        if let Some(jira) = value.get_first("jira_extension_settings") {
            extension_settings.push(ExtensionSetting {
                extension_id: JIRA_EXTENSION_ID.to_string(),
                values: json!({ "JiraEnvironmentType": common::string_or_empty(jira, "environment_type") }),
            });
        }
        if let Some(jsm) = value.get_first("jira_service_management_extension_settings") {
            extension_settings.push(ExtensionSetting {
                extension_id: JSM_EXTENSION_ID.to_string(),
                values: json!({ "JsmChangeControlled": common::bool_or(jsm, "is_enabled", false) }),
            });
        }
        if let Some(servicenow) = value.get_first("servicenow_extension_settings") {
            extension_settings.push(ExtensionSetting {
                extension_id: SERVICENOW_EXTENSION_ID.to_string(),
                values: json!({ "ServiceNowChangeControlled": common::bool_or(servicenow, "is_enabled", false) }),
            });
        }

        Ok(Environment {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            slug: common::string_or_empty(value, "slug"),
            description: common::string_or_empty(value, "description"),
            sort_order: common::int_or(value, "sort_order", 0),
            use_guided_failure: common::bool_or(value, "use_guided_failure", false),
            allow_dynamic_infrastructure: common::bool_or(value, "allow_dynamic_infrastructure", false),
            extension_settings,
        })
    }

    fn flatten(env: &Environment) -> Value {
        let mut jira = Vec::new();
        let mut jsm = Vec::new();
        let mut servicenow = Vec::new();
        for setting in &env.extension_settings {
            let values = &setting.values;
            match setting.extension_id.as_str() {
                JIRA_EXTENSION_ID => jira.push(Value::object([(
                    "environment_type",
                    Value::from(values["JiraEnvironmentType"].as_str().unwrap_or_default()),
                )])),
                JSM_EXTENSION_ID => jsm.push(Value::object([(
                    "is_enabled",
                    Value::from(values["JsmChangeControlled"].as_bool().unwrap_or_default()),
                )])),
                SERVICENOW_EXTENSION_ID => servicenow.push(Value::object([(
                    "is_enabled",
                    Value::from(values["ServiceNowChangeControlled"].as_bool().unwrap_or_default()),
                )])),
                other => tracing::debug!(extension = other, "ignoring extension settings"),
            }
        }

        Value::object([
            ("id", Value::from(env.id.clone())),
            ("space_id", Value::optional_string(&env.space_id)),
            ("name", Value::from(&env.name)),
            ("slug", Value::optional_string(&env.slug)),
            ("description", Value::optional_string(&env.description)),
            ("sort_order", Value::from(env.sort_order)),
            ("allow_dynamic_infrastructure", Value::from(env.allow_dynamic_infrastructure)),
            ("use_guided_failure", Value::from(env.use_guided_failure)),
            ("jira_extension_settings", Value::List(jira)),
            ("jira_service_management_extension_settings", Value::List(jsm)),
            ("servicenow_extension_settings", Value::List(servicenow)),
        ])
    }
}
