use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, LIFECYCLES, Lifecycle, Phase, RetentionPeriod};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const RETENTION_UNITS: &[&str] = &["Days", "Items"];

fn retention_policy(name: &str, description: &str) -> Attribute {
    Attribute::list_nested(
        name,
        vec![
            Attribute::int("quantity_to_keep")
                .validate(Validator::AtLeast(0))
                .default(30)
                .description("The number of days/releases to keep. The default value is 30. If 0 then all are kept."),
            Attribute::bool("should_keep_forever")
                .default(false)
                .description("Indicates if items should never be deleted."),
            Attribute::string("unit")
                .validate(Validator::OneOf(RETENTION_UNITS))
                .default("Days")
                .description("The unit of quantity_to_keep."),
        ],
    )
    .description(description)
}

fn phase() -> Attribute {
    Attribute::list_nested(
        "phase",
        vec![
            Attribute::string("id")
                .optional()
                .computed()
                .use_state_for_unknown()
                .description("The ID of this phase."),
            Attribute::string("name").required().validate(Validator::NotEmpty),
            common::string_list(
                "automatic_deployment_targets",
                "Environment IDs in this phase that a release is automatically deployed to when it is eligible for this phase.",
            ),
            common::string_list(
                "optional_deployment_targets",
                "Environment IDs in this phase that a release can be deployed to, but is not automatically deployed to.",
            ),
            Attribute::int("minimum_environments_before_promotion")
                .validate(Validator::AtLeast(0))
                .default(0)
                .description(
                    "The number of units required before a release can enter the next phase. If 0, all environments are required.",
                ),
            Attribute::bool("is_optional_phase")
                .default(false)
                .description("If false a release must be deployed to this phase before it can be deployed to the next phase."),
            retention_policy("release_retention_policy", "Overrides the lifecycle release retention policy.")
                .optional(),
            retention_policy("tentacle_retention_policy", "Overrides the lifecycle tentacle retention policy.")
                .optional(),
        ],
    )
    .optional()
}

fn expand_retention(value: Option<&Value>) -> Option<RetentionPeriod> {
    value.map(|policy| RetentionPeriod {
        quantity_to_keep: common::int_or(policy, "quantity_to_keep", 30),
        should_keep_forever: common::bool_or(policy, "should_keep_forever", false),
        unit: policy.get_non_empty("unit").unwrap_or_else(|| "Days".to_string()),
    })
}

fn flatten_retention(policy: Option<&RetentionPeriod>) -> Value {
    match policy {
        Some(policy) => Value::List(vec![Value::object([
            ("quantity_to_keep", Value::from(policy.quantity_to_keep)),
            ("should_keep_forever", Value::from(policy.should_keep_forever)),
            ("unit", Value::from(&policy.unit)),
        ])]),
        None => Value::Null,
    }
}

fn expand_phase(value: &Value) -> Phase {
    Phase {
        id: value.get_non_empty("id"),
        name: common::string_or_empty(value, "name"),
        automatic_deployment_targets: value.get_strings("automatic_deployment_targets"),
        optional_deployment_targets: value.get_strings("optional_deployment_targets"),
        minimum_environments_before_promotion: common::int_or(value, "minimum_environments_before_promotion", 0),
        is_optional_phase: common::bool_or(value, "is_optional_phase", false),
        release_retention_policy: expand_retention(value.get_first("release_retention_policy")),
        tentacle_retention_policy: expand_retention(value.get_first("tentacle_retention_policy")),
    }
}

fn flatten_phase(phase: &Phase) -> Value {
    Value::object([
        ("id", Value::from(phase.id.clone())),
        ("name", Value::from(&phase.name)),
        ("automatic_deployment_targets", Value::strings(&phase.automatic_deployment_targets)),
        ("optional_deployment_targets", Value::strings(&phase.optional_deployment_targets)),
        (
            "minimum_environments_before_promotion",
            Value::from(phase.minimum_environments_before_promotion),
        ),
        ("is_optional_phase", Value::from(phase.is_optional_phase)),
        ("release_retention_policy", flatten_retention(phase.release_retention_policy.as_ref())),
        ("tentacle_retention_policy", flatten_retention(phase.tentacle_retention_policy.as_ref())),
    ])
}

pub struct LifecycleMapping;

impl Mapping for LifecycleMapping {
    type Dto = Lifecycle;

    const TYPE_NAME: &'static str = "octopusdeploy_lifecycle";
    const DISPLAY: &'static str = "lifecycle";
    const COLLECTION: Collection = LIFECYCLES;
    const PLURAL: &'static str = "lifecycles";
    const DATA_SOURCE: &'static str = "octopusdeploy_lifecycles";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages lifecycles in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
                phase(),
                retention_policy(
                    "release_retention_policy",
                    "Defines how long releases are kept. Defaults to 30 days.",
                )
                .optional()
                .computed(),
                retention_policy(
                    "tentacle_retention_policy",
                    "Defines how long extracted packages and files are kept on Tentacles. Defaults to 30 days.",
                )
                .optional()
                .computed(),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Lifecycle, ResourceError> {
        Ok(Lifecycle {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            phases: value.get_list("phase").iter().map(expand_phase).collect(),
            release_retention_policy: Some(
                expand_retention(value.get_first("release_retention_policy")).unwrap_or_default(),
            ),
            tentacle_retention_policy: Some(
                expand_retention(value.get_first("tentacle_retention_policy")).unwrap_or_default(),
            ),
        })
    }

    fn flatten(lifecycle: &Lifecycle) -> Value {
        Value::object([
            ("id", Value::from(lifecycle.id.clone())),
            ("space_id", Value::optional_string(&lifecycle.space_id)),
            ("name", Value::from(&lifecycle.name)),
            ("description", Value::optional_string(&lifecycle.description)),
            ("phase", Value::List(lifecycle.phases.iter().map(flatten_phase).collect())),
            (
                "release_retention_policy",
                flatten_retention(lifecycle.release_retention_policy.as_ref()),
            ),
            (
                "tentacle_retention_policy",
                flatten_retention(lifecycle.tentacle_retention_policy.as_ref()),
            ),
        ])
    }
}
