use std::collections::HashSet;

use async_trait::async_trait;

use super::common;
use super::{Resource, ResourceError};
use crate::mutex::KeyedMutex;
use crate::octopus::types::{VARIABLES, Variable, VariableScope, VariableSet};
use crate::octopus::{OctopusClient, OctopusError};
use crate::terraform::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const TYPE_NAME: &str = "octopusdeploy_variable";
const SENSITIVE_TYPE: &str = "Sensitive";

const VARIABLE_TYPES: &[&str] = &[
    "AmazonWebServicesAccount",
    "AzureAccount",
    "Certificate",
    "GoogleCloudAccount",
    "Sensitive",
    "String",
    "UsernamePasswordAccount",
    "WorkerPool",
];

const SCOPE_FIELDS: &[&str] = &["environments", "roles", "machines", "channels", "actions", "tenant_tags"];

/// A single variable inside the variable set of a project or library
/// variable set. Every write replaces the whole set, so writes for the same
/// owner are serialized with the keyed mutex.
pub struct VariableResource;

fn owner_of(value: &Value) -> Result<String, ResourceError> {
    value
        .get_non_empty("project_id")
        .or_else(|| value.get_non_empty("owner_id"))
        .ok_or_else(|| ResourceError::InvalidConfig("one of project_id or owner_id must be configured".to_string()))
}

fn variable_set_path(owner: &str) -> String {
    format!("{}/variableset-{}", VARIABLES.path, owner)
}

fn scope_schema() -> Attribute {
    Attribute::list_nested(
        "scope",
        SCOPE_FIELDS
            .iter()
            .map(|name| Attribute::string_list(name).optional())
            .collect(),
    )
    .optional()
    .description("The scope that limits where this variable applies.")
}

fn expand_scope(value: Option<&Value>) -> VariableScope {
    let Some(scope) = value else {
        return VariableScope::default();
    };
    VariableScope {
        environment: scope.get_strings("environments"),
        role: scope.get_strings("roles"),
        machine: scope.get_strings("machines"),
        channel: scope.get_strings("channels"),
        action: scope.get_strings("actions"),
        tenant_tag: scope.get_strings("tenant_tags"),
    }
}

fn flatten_scope(scope: &VariableScope) -> Value {
    if scope.is_empty() {
        return Value::Null;
    }
    Value::List(vec![Value::object([
        ("environments", Value::strings(&scope.environment)),
        ("roles", Value::strings(&scope.role)),
        ("machines", Value::strings(&scope.machine)),
        ("channels", Value::strings(&scope.channel)),
        ("actions", Value::strings(&scope.action)),
        ("tenant_tags", Value::strings(&scope.tenant_tag)),
    ])])
}

fn expand(value: &Value) -> Variable {
    let is_sensitive = common::bool_or(value, "is_sensitive", false);
    let (variable_type, content) = if is_sensitive {
        (SENSITIVE_TYPE.to_string(), value.get_string("sensitive_value"))
    } else {
        (common::string_or_empty(value, "type"), value.get_string("value"))
    };

    Variable {
        id: value.get_non_empty("id"),
        name: common::string_or_empty(value, "name"),
        value: content,
        description: value.get_string("description"),
        variable_type,
        is_sensitive,
        is_editable: common::bool_or(value, "is_editable", true),
        scope: expand_scope(value.get_first("scope")),
    }
}

/// `known` is the plan or prior state; it decides which owner attribute
/// the owner id is reported under.
fn flatten(known: &Value, set: &VariableSet, variable: &Variable) -> Value {
    let (owner_id, project_id) = if known.get_non_empty("project_id").is_some() {
        (known.get("owner_id").clone(), Value::from(&set.owner_id))
    } else {
        (Value::from(&set.owner_id), Value::Null)
    };
    let value = if variable.is_sensitive {
        Value::Null
    } else {
        Value::from(variable.value.clone())
    };

    Value::object([
        ("id", Value::from(variable.id.clone())),
        ("space_id", Value::optional_string(&set.space_id)),
        ("owner_id", owner_id),
        ("project_id", project_id),
        ("name", Value::from(&variable.name)),
        ("type", Value::from(&variable.variable_type)),
        ("value", value),
        ("sensitive_value", Value::Null),
        ("description", Value::from(variable.description.clone())),
        ("is_sensitive", Value::from(variable.is_sensitive)),
        ("is_editable", Value::from(variable.is_editable)),
        ("scope", flatten_scope(&variable.scope)),
    ])
}

fn not_found(owner: &str, id: &str) -> ResourceError {
    OctopusError::NotFound {
        resource: format!("{}/{}", variable_set_path(owner), id),
    }
    .into()
}

#[async_trait]
impl Resource for VariableResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "This resource manages variables in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id("variable"),
                Attribute::string("owner_id")
                    .optional()
                    .force_new()
                    .description("The ID of the project or library variable set that owns this variable."),
                Attribute::string("project_id")
                    .optional()
                    .force_new()
                    .deprecated()
                    .description("The ID of the project that owns this variable. Use owner_id instead."),
                common::name("variable"),
                Attribute::string("type")
                    .required()
                    .validate(Validator::OneOf(VARIABLE_TYPES))
                    .description("The type of variable represented by this resource."),
                Attribute::string("value").optional(),
                Attribute::string("sensitive_value").optional().sensitive(),
                common::description("variable"),
                Attribute::bool("is_sensitive").default(false),
                Attribute::bool("is_editable")
                    .default(true)
                    .description("Indicates whether or not this variable is considered editable."),
                scope_schema(),
            ],
        )
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = self.schema().validate(config);

        let owner_unknown = config.get("owner_id").is_unknown() || config.get("project_id").is_unknown();
        if !owner_unknown && owner_of(config).is_err() {
            diags.push(Diagnostic::error(
                "Invalid resource configuration",
                "one of project_id or owner_id must be configured",
            ));
        }

        let variable_type = config.get_str("type");
        let is_sensitive = config.get_bool("is_sensitive").unwrap_or(false);
        if config.get("is_sensitive").is_unknown() || variable_type.is_none() {
            return diags;
        }
        if is_sensitive && variable_type != Some(SENSITIVE_TYPE) {
            diags.push(
                Diagnostic::error(
                    "Invalid resource configuration",
                    format!("when is_sensitive is set to true, type needs to be '{SENSITIVE_TYPE}'"),
                )
                .at(AttributePath::root("type")),
            );
        } else if !is_sensitive && variable_type == Some(SENSITIVE_TYPE) {
            diags.push(
                Diagnostic::error(
                    "Invalid resource configuration",
                    format!("when type is set to '{SENSITIVE_TYPE}', is_sensitive needs to be true"),
                )
                .at(AttributePath::root("is_sensitive")),
            );
        }
        if !config.get("value").is_null() && !config.get("sensitive_value").is_null() {
            diags.push(Diagnostic::error(
                "Invalid resource configuration",
                "only one of value or sensitive_value can be set",
            ));
        }
        diags
    }

    async fn create(&self, client: &OctopusClient, plan: &Value) -> Result<Value, ResourceError> {
        let owner = owner_of(plan)?;
        let space = common::space_of(plan);
        let path = variable_set_path(&owner);
        let variable = expand(plan);
        tracing::info!(resource = TYPE_NAME, owner = %owner, name = %variable.name, "creating variable");

        let _guard = KeyedMutex::global().lock(&owner).await;
        let mut set: VariableSet = client.get_raw(space.as_deref(), &path).await?;
        let existing: HashSet<String> = set.variables.iter().filter_map(|v| v.id.clone()).collect();
        set.variables.push(Variable { id: None, ..variable.clone() });

        let saved: VariableSet = client.put_raw(space.as_deref(), &path, &set).await?;
        let created = saved
            .variables
            .iter()
            .find(|v| v.name == variable.name && v.id.as_ref().is_some_and(|id| !existing.contains(id)))
            .ok_or_else(|| ResourceError::MissingAfterSave {
                kind: "variable",
                name: variable.name.clone(),
                parent: path.clone(),
            })?;
        tracing::info!(
            resource = TYPE_NAME,
            id = created.id.as_deref().unwrap_or_default(),
            "variable created"
        );
        Ok(flatten(plan, &saved, created))
    }

    async fn read(&self, client: &OctopusClient, state: &Value) -> Result<Value, ResourceError> {
        let id = common::required_id(state)?;
        let owner = owner_of(state)?;
        let space = common::space_of(state);
        tracing::debug!(resource = TYPE_NAME, id, owner = %owner, "reading variable");

        let set: VariableSet = client.get_raw(space.as_deref(), &variable_set_path(&owner)).await?;
        let variable = set
            .variables
            .iter()
            .find(|v| v.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(&owner, id))?;
        Ok(flatten(state, &set, variable))
    }

    async fn update(
        &self,
        client: &OctopusClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ResourceError> {
        let id = common::required_id(prior)?;
        let owner = owner_of(plan)?;
        let space = common::space_of(plan);
        let path = variable_set_path(&owner);
        tracing::info!(resource = TYPE_NAME, id, owner = %owner, "updating variable");

        let _guard = KeyedMutex::global().lock(&owner).await;
        let mut set: VariableSet = client.get_raw(space.as_deref(), &path).await?;
        let slot = set
            .variables
            .iter_mut()
            .find(|v| v.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(&owner, id))?;
        *slot = Variable {
            id: Some(id.to_string()),
            ..expand(plan)
        };

        let saved: VariableSet = client.put_raw(space.as_deref(), &path, &set).await?;
        let updated = saved
            .variables
            .iter()
            .find(|v| v.id.as_deref() == Some(id))
            .ok_or_else(|| ResourceError::MissingAfterSave {
                kind: "variable",
                name: id.to_string(),
                parent: path.clone(),
            })?;
        Ok(flatten(plan, &saved, updated))
    }

    async fn delete(&self, client: &OctopusClient, state: &Value) -> Result<(), ResourceError> {
        let id = common::required_id(state)?;
        let owner = owner_of(state)?;
        let space = common::space_of(state);
        let path = variable_set_path(&owner);
        tracing::info!(resource = TYPE_NAME, id, owner = %owner, "deleting variable");

        let _guard = KeyedMutex::global().lock(&owner).await;
        let mut set: VariableSet = client.get_raw(space.as_deref(), &path).await?;
        let before = set.variables.len();
        set.variables.retain(|v| v.id.as_deref() != Some(id));
        if set.variables.len() == before {
            tracing::warn!(id, owner = %owner, "variable already removed");
            return Ok(());
        }
        let _: VariableSet = client.put_raw(space.as_deref(), &path, &set).await?;
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ResourceError> {
        match id.split_once(':') {
            Some((owner, variable)) if !owner.is_empty() && !variable.is_empty() && !variable.contains(':') => {
                Ok(Value::object([("id", Value::from(variable)), ("owner_id", Value::from(owner))]))
            }
            _ => Err(ResourceError::InvalidConfig(format!(
                "{TYPE_NAME} import must be in the form of OwnerID:VariableID (e.g. Projects-62:0906031f-68ba-4a15-afaa-657c1564e07b), got '{id}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Value {
        Value::object([
            ("owner_id", Value::from("Projects-1")),
            ("name", Value::from("ConnectionString")),
            ("type", Value::from("String")),
            ("value", Value::from("Server=db")),
            ("is_sensitive", Value::Bool(false)),
        ])
    }

    #[test]
    fn test_import_splits_owner_and_id() {
        let state = VariableResource.import("Projects-62:0906031f-68ba").unwrap();
        assert_eq!(state.get_str("owner_id"), Some("Projects-62"));
        assert_eq!(state.get_str("id"), Some("0906031f-68ba"));
        assert!(VariableResource.import("0906031f-68ba").is_err());
        assert!(VariableResource.import(":x").is_err());
    }

    #[test]
    fn test_validate_requires_an_owner() {
        assert!(!VariableResource.validate(&config()).has_errors());
        let mut config = config();
        config.set("owner_id", Value::Null);
        assert!(VariableResource.validate(&config).has_errors());
        config.set("project_id", Value::from("Projects-1"));
        assert!(!VariableResource.validate(&config).has_errors());
    }

    #[test]
    fn test_validate_sensitive_type_consistency() {
        let mut config = config();
        config.set("is_sensitive", Value::Bool(true));
        assert!(VariableResource.validate(&config).has_errors());
        config.set("type", Value::from("Sensitive"));
        config.set("value", Value::Null);
        config.set("sensitive_value", Value::from("hunter2"));
        assert!(!VariableResource.validate(&config).has_errors());
        config.set("is_sensitive", Value::Bool(false));
        assert!(VariableResource.validate(&config).has_errors());
    }

    #[test]
    fn test_expand_sensitive_uses_sensitive_value() {
        let mut plan = config();
        plan.set("is_sensitive", Value::Bool(true));
        plan.set("value", Value::Null);
        plan.set("sensitive_value", Value::from("hunter2"));
        let variable = expand(&plan);
        assert_eq!(variable.variable_type, "Sensitive");
        assert_eq!(variable.value.as_deref(), Some("hunter2"));
        assert!(variable.scope.is_empty());
    }

    #[test]
    fn test_flatten_reports_owner_under_configured_attribute() {
        let set = VariableSet {
            owner_id: "Projects-1".to_string(),
            space_id: "Spaces-1".to_string(),
            ..Default::default()
        };
        let variable = Variable {
            id: Some("abc".to_string()),
            name: "Password".to_string(),
            variable_type: "Sensitive".to_string(),
            is_sensitive: true,
            scope: VariableScope {
                environment: vec!["Environments-1".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        let by_project = flatten(&Value::object([("project_id", Value::from("Projects-1"))]), &set, &variable);
        assert_eq!(by_project.get_str("project_id"), Some("Projects-1"));
        assert!(by_project.get("owner_id").is_null());
        assert!(by_project.get("value").is_null());

        let by_owner = flatten(&Value::object([("owner_id", Value::from("Projects-1"))]), &set, &variable);
        assert_eq!(by_owner.get_str("owner_id"), Some("Projects-1"));
        assert!(by_owner.get("project_id").is_null());
        let scope = &by_owner.get_list("scope")[0];
        assert_eq!(scope.get_strings("environments"), vec!["Environments-1"]);
    }
}
