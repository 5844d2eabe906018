use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, ConnectivityPolicy, PROJECTS, Project};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const GUIDED_FAILURE_MODES: &[&str] = &["EnvironmentDefault", "Off", "On"];
const SKIP_MACHINE_BEHAVIORS: &[&str] = &["None", "SkipUnavailableMachines"];

fn connectivity_policy() -> Attribute {
    Attribute::list_nested(
        "connectivity_policy",
        vec![
            Attribute::bool("allow_deployments_to_no_targets").default(false),
            Attribute::bool("exclude_unhealthy_targets").default(false),
            Attribute::string("skip_machine_behavior")
                .validate(Validator::OneOf(SKIP_MACHINE_BEHAVIORS))
                .default("None"),
            common::string_list("target_roles", "Roles of the deployment targets to consider."),
        ],
    )
    .optional()
    .computed()
}

fn expand_connectivity(value: Option<&Value>) -> ConnectivityPolicy {
    match value {
        Some(policy) => ConnectivityPolicy {
            allow_deployments_to_no_targets: common::bool_or(policy, "allow_deployments_to_no_targets", false),
            exclude_unhealthy_targets: common::bool_or(policy, "exclude_unhealthy_targets", false),
            skip_machine_behavior: policy
                .get_non_empty("skip_machine_behavior")
                .unwrap_or_else(|| "None".to_string()),
            target_roles: policy.get_strings("target_roles"),
        },
        None => ConnectivityPolicy {
            skip_machine_behavior: "None".to_string(),
            ..Default::default()
        },
    }
}

fn flatten_connectivity(policy: Option<&ConnectivityPolicy>) -> Value {
    match policy {
        Some(policy) => Value::List(vec![Value::object([
            ("allow_deployments_to_no_targets", Value::from(policy.allow_deployments_to_no_targets)),
            ("exclude_unhealthy_targets", Value::from(policy.exclude_unhealthy_targets)),
            ("skip_machine_behavior", Value::from(&policy.skip_machine_behavior)),
            ("target_roles", Value::strings(&policy.target_roles)),
        ])]),
        None => Value::Null,
    }
}

pub struct ProjectMapping;

impl Mapping for ProjectMapping {
    type Dto = Project;

    const TYPE_NAME: &'static str = "octopusdeploy_project";
    const DISPLAY: &'static str = "project";
    const COLLECTION: Collection = PROJECTS;
    const PLURAL: &'static str = "projects";
    const DATA_SOURCE: &'static str = "octopusdeploy_projects";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages projects in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::slug(Self::DISPLAY),
                common::description(Self::DISPLAY),
                Attribute::string("lifecycle_id")
                    .required()
                    .validate(Validator::NotEmpty)
                    .description("The lifecycle ID associated with this project."),
                Attribute::string("project_group_id")
                    .required()
                    .validate(Validator::NotEmpty)
                    .description("The project group ID associated with this project."),
                Attribute::bool("is_disabled").default(false),
                Attribute::bool("auto_create_release").default(false),
                Attribute::string("default_guided_failure_mode")
                    .validate(Validator::OneOf(GUIDED_FAILURE_MODES))
                    .default("EnvironmentDefault"),
                Attribute::bool("default_to_skip_if_already_installed").default(false),
                Attribute::bool("discrete_channel_release")
                    .default(false)
                    .description("Treats releases of different channels to the same environment as a separate deployment dimension."),
                common::tenanted_deployment_participation(),
                common::string_list(
                    "included_library_variable_sets",
                    "Library variable set IDs included in this project.",
                ),
                connectivity_policy(),
                Attribute::string("variable_set_id")
                    .computed()
                    .use_state_for_unknown()
                    .description("The ID of the variable set owned by this project."),
                Attribute::string("deployment_process_id")
                    .computed()
                    .use_state_for_unknown(),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Project, ResourceError> {
        Ok(Project {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            slug: common::string_or_empty(value, "slug"),
            description: common::string_or_empty(value, "description"),
            lifecycle_id: common::string_or_empty(value, "lifecycle_id"),
            project_group_id: common::string_or_empty(value, "project_group_id"),
            is_disabled: common::bool_or(value, "is_disabled", false),
            auto_create_release: common::bool_or(value, "auto_create_release", false),
            default_guided_failure_mode: value
                .get_non_empty("default_guided_failure_mode")
                .unwrap_or_else(|| "EnvironmentDefault".to_string()),
            default_to_skip_if_already_installed: common::bool_or(
                value,
                "default_to_skip_if_already_installed",
                false,
            ),
            discrete_channel_release: common::bool_or(value, "discrete_channel_release", false),
            tenanted_deployment_mode: value
                .get_non_empty("tenanted_deployment_participation")
                .unwrap_or_else(|| "Untenanted".to_string()),
            included_library_variable_set_ids: value.get_strings("included_library_variable_sets"),
            project_connectivity_policy: Some(expand_connectivity(value.get_first("connectivity_policy"))),
            variable_set_id: common::string_or_empty(value, "variable_set_id"),
            deployment_process_id: common::string_or_empty(value, "deployment_process_id"),
        })
    }

    fn flatten(project: &Project) -> Value {
        Value::object([
            ("id", Value::from(project.id.clone())),
            ("space_id", Value::optional_string(&project.space_id)),
            ("name", Value::from(&project.name)),
            ("slug", Value::optional_string(&project.slug)),
            ("description", Value::optional_string(&project.description)),
            ("lifecycle_id", Value::from(&project.lifecycle_id)),
            ("project_group_id", Value::from(&project.project_group_id)),
            ("is_disabled", Value::from(project.is_disabled)),
            ("auto_create_release", Value::from(project.auto_create_release)),
            ("default_guided_failure_mode", Value::from(&project.default_guided_failure_mode)),
            (
                "default_to_skip_if_already_installed",
                Value::from(project.default_to_skip_if_already_installed),
            ),
            ("discrete_channel_release", Value::from(project.discrete_channel_release)),
            ("tenanted_deployment_participation", Value::from(&project.tenanted_deployment_mode)),
            (
                "included_library_variable_sets",
                Value::strings(&project.included_library_variable_set_ids),
            ),
            (
                "connectivity_policy",
                flatten_connectivity(project.project_connectivity_policy.as_ref()),
            ),
            ("variable_set_id", Value::optional_string(&project.variable_set_id)),
            ("deployment_process_id", Value::optional_string(&project.deployment_process_id)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_maps_tenanted_participation() {
        let planned = Value::object([
            ("name", Value::from("Octo Pet Shop")),
            ("lifecycle_id", Value::from("Lifecycles-1")),
            ("project_group_id", Value::from("ProjectGroups-1")),
            ("tenanted_deployment_participation", Value::from("TenantedOrUntenanted")),
            ("included_library_variable_sets", Value::strings(["LibraryVariableSets-1"])),
            ("connectivity_policy", Value::Unknown),
            ("variable_set_id", Value::Unknown),
        ]);
        let project = ProjectMapping::expand(&planned).unwrap();
        assert_eq!(project.tenanted_deployment_mode, "TenantedOrUntenanted");
        assert_eq!(project.included_library_variable_set_ids, vec!["LibraryVariableSets-1"]);
        assert_eq!(project.default_guided_failure_mode, "EnvironmentDefault");
        let policy = project.project_connectivity_policy.unwrap();
        assert_eq!(policy.skip_machine_behavior, "None");
        assert!(project.variable_set_id.is_empty());

        let json = serde_json::to_value(ProjectMapping::expand(&planned).unwrap()).unwrap();
        assert_eq!(json["TenantedDeploymentMode"], "TenantedOrUntenanted");
        assert_eq!(json["ProjectConnectivityPolicy"]["SkipMachineBehavior"], "None");
    }

    #[test]
    fn test_flatten_reports_server_ids() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "Id": "Projects-1",
            "SpaceId": "Spaces-1",
            "Name": "Octo Pet Shop",
            "Slug": "octo-pet-shop",
            "LifecycleId": "Lifecycles-1",
            "ProjectGroupId": "ProjectGroups-1",
            "TenantedDeploymentMode": "Untenanted",
            "DefaultGuidedFailureMode": "EnvironmentDefault",
            "VariableSetId": "variableset-Projects-1",
            "DeploymentProcessId": "deploymentprocess-Projects-1",
            "ProjectConnectivityPolicy": {
                "AllowDeploymentsToNoTargets": true,
                "ExcludeUnhealthyTargets": false,
                "SkipMachineBehavior": "None",
                "TargetRoles": []
            }
        }))
        .unwrap();
        let value = ProjectMapping::flatten(&project);
        assert_eq!(value.get_str("variable_set_id"), Some("variableset-Projects-1"));
        assert_eq!(value.get_str("deployment_process_id"), Some("deploymentprocess-Projects-1"));
        let policy = &value.get_list("connectivity_policy")[0];
        assert_eq!(policy.get_bool("allow_deployments_to_no_targets"), Some(true));
        assert!(value.get_list("included_library_variable_sets").is_empty());
    }

    #[test]
    fn test_rejects_unknown_guided_failure_mode() {
        let config = Value::object([
            ("name", Value::from("p")),
            ("lifecycle_id", Value::from("Lifecycles-1")),
            ("project_group_id", Value::from("ProjectGroups-1")),
            ("default_guided_failure_mode", Value::from("Sometimes")),
        ]);
        assert!(ProjectMapping::validate(&config).has_errors());
    }
}
