use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{CHANNELS, Channel, ChannelRule, Collection, PackageReference};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

fn rule() -> Attribute {
    Attribute::list_nested(
        "rule",
        vec![
            Attribute::string("id")
                .optional()
                .computed()
                .use_state_for_unknown()
                .description("The ID of this rule."),
            Attribute::string("version_range")
                .optional()
                .description("The version range a package must satisfy, in NuGet or Maven syntax."),
            Attribute::string("tag")
                .optional()
                .description("A regular expression the pre-release tag must match."),
            Attribute::list_nested(
                "action_package",
                vec![
                    Attribute::string("deployment_action").optional(),
                    Attribute::string("package_reference").optional(),
                ],
            )
            .required(),
        ],
    )
    .optional()
    .description("Version rules that releases in this channel must satisfy.")
}

fn expand_rule(value: &Value) -> ChannelRule {
    ChannelRule {
        id: value.get_non_empty("id"),
        version_range: common::string_or_empty(value, "version_range"),
        tag: common::string_or_empty(value, "tag"),
        action_packages: value
            .get_list("action_package")
            .iter()
            .map(|package| PackageReference {
                deployment_action: common::string_or_empty(package, "deployment_action"),
                package_reference: common::string_or_empty(package, "package_reference"),
            })
            .collect(),
    }
}

fn flatten_rule(rule: &ChannelRule) -> Value {
    Value::object([
        ("id", Value::from(rule.id.clone())),
        ("version_range", Value::optional_string(&rule.version_range)),
        ("tag", Value::optional_string(&rule.tag)),
        (
            "action_package",
            Value::List(
                rule.action_packages
                    .iter()
                    .map(|package| {
                        Value::object([
                            ("deployment_action", Value::optional_string(&package.deployment_action)),
                            ("package_reference", Value::optional_string(&package.package_reference)),
                        ])
                    })
                    .collect(),
            ),
        ),
    ])
}

pub struct ChannelMapping;

impl Mapping for ChannelMapping {
    type Dto = Channel;

    const TYPE_NAME: &'static str = "octopusdeploy_channel";
    const DISPLAY: &'static str = "channel";
    const COLLECTION: Collection = CHANNELS;
    const PLURAL: &'static str = "channels";
    const DATA_SOURCE: &'static str = "octopusdeploy_channels";

    fn schema() -> Schema {
        Schema::new(
            "This resource manages channels in Octopus Deploy.",
            vec![
                common::id(),
                common::space_id(Self::DISPLAY),
                common::name(Self::DISPLAY),
                common::description(Self::DISPLAY),
                Attribute::string("project_id")
                    .required()
                    .force_new()
                    .validate(Validator::NotEmpty)
                    .description("The project ID associated with this channel."),
                Attribute::string("lifecycle_id")
                    .optional()
                    .description("The lifecycle ID associated with this channel. Unset means the project lifecycle."),
                Attribute::bool("is_default")
                    .default(false)
                    .description("Indicates whether this is the default channel for the associated project."),
                rule(),
                common::tenant_tags(),
            ],
        )
    }

    fn expand(value: &Value) -> Result<Channel, ResourceError> {
        Ok(Channel {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            project_id: common::string_or_empty(value, "project_id"),
            lifecycle_id: value.get_non_empty("lifecycle_id"),
            is_default: common::bool_or(value, "is_default", false),
            rules: value.get_list("rule").iter().map(expand_rule).collect(),
            tenant_tags: value.get_strings("tenant_tags"),
        })
    }

    fn flatten(channel: &Channel) -> Value {
        Value::object([
            ("id", Value::from(channel.id.clone())),
            ("space_id", Value::optional_string(&channel.space_id)),
            ("name", Value::from(&channel.name)),
            ("description", Value::optional_string(&channel.description)),
            ("project_id", Value::from(&channel.project_id)),
            ("lifecycle_id", Value::from(channel.lifecycle_id.clone())),
            ("is_default", Value::from(channel.is_default)),
            ("rule", Value::List(channel.rules.iter().map(flatten_rule).collect())),
            ("tenant_tags", Value::strings(&channel.tenant_tags)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::plan;

    #[test]
    fn test_project_id_forces_replacement() {
        let schema = ChannelMapping::schema();
        let project_id = schema.attribute("project_id").unwrap();
        assert!(project_id.required && project_id.force_new);
    }

    #[test]
    fn test_expand_rules() {
        let planned = Value::object([
            ("name", Value::from("Hotfix")),
            ("project_id", Value::from("Projects-1")),
            ("lifecycle_id", Value::Null),
            (
                "rule",
                Value::List(vec![Value::object([
                    ("id", Value::Unknown),
                    ("version_range", Value::from("[1.0,2.0)")),
                    ("tag", Value::from("^hotfix")),
                    (
                        "action_package",
                        Value::List(vec![Value::object([
                            ("deployment_action", Value::from("Deploy web")),
                            ("package_reference", Value::from("")),
                        ])]),
                    ),
                ])]),
            ),
        ]);
        let channel = ChannelMapping::expand(&planned).unwrap();
        assert_eq!(channel.lifecycle_id, None);
        assert_eq!(channel.rules.len(), 1);
        assert_eq!(channel.rules[0].version_range, "[1.0,2.0)");
        assert_eq!(channel.rules[0].action_packages[0].deployment_action, "Deploy web");

        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["ProjectId"], "Projects-1");
        assert!(json["LifecycleId"].is_null());
        assert!(json["Rules"][0].get("Id").is_none());
    }

    #[test]
    fn test_flatten_rule_ids() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "Id": "Channels-1",
            "Name": "Default",
            "ProjectId": "Projects-1",
            "IsDefault": true,
            "Rules": [{
                "Id": "rule-1",
                "VersionRange": "",
                "Tag": "^$",
                "ActionPackages": [{"DeploymentAction": "Deploy", "PackageReference": ""}]
            }],
            "TenantTags": ["Region/EU"]
        }))
        .unwrap();
        let value = ChannelMapping::flatten(&channel);
        assert_eq!(value.get_bool("is_default"), Some(true));
        assert!(value.get("lifecycle_id").is_null());
        let rule = &value.get_list("rule")[0];
        assert_eq!(rule.get_str("id"), Some("rule-1"));
        assert!(rule.get("version_range").is_null());
        assert_eq!(value.get_strings("tenant_tags"), vec!["Region/EU"]);
    }

    #[test]
    fn test_description_change_keeps_rule_ids() {
        let schema = ChannelMapping::schema();
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "Id": "Channels-1",
            "SpaceId": "Spaces-1",
            "Name": "Hotfix",
            "ProjectId": "Projects-1",
            "Rules": [{
                "Id": "rule-1",
                "VersionRange": "[1.0,2.0)",
                "ActionPackages": [{"DeploymentAction": "Deploy"}]
            }]
        }))
        .unwrap();
        let prior = schema.conform(ChannelMapping::flatten(&channel));

        let config = schema.conform(Value::object([
            ("name", Value::from("Hotfix")),
            ("description", Value::from("Patches only")),
            ("project_id", Value::from("Projects-1")),
            (
                "rule",
                Value::List(vec![Value::object([
                    ("version_range", Value::from("[1.0,2.0)")),
                    (
                        "action_package",
                        Value::List(vec![Value::object([("deployment_action", Value::from("Deploy"))])]),
                    ),
                ])]),
            ),
        ]));
        let mut proposed = prior.clone();
        proposed.set("description", Value::from("Patches only"));

        let planned = plan::plan(&schema, &prior, proposed, &config).planned;
        assert_eq!(planned.get_list("rule")[0].get_str("id"), Some("rule-1"));

        let expanded = ChannelMapping::expand(&planned).unwrap();
        assert_eq!(expanded.rules[0].id.as_deref(), Some("rule-1"));
        let json = serde_json::to_value(&expanded).unwrap();
        assert_eq!(json["Rules"][0]["Id"], "rule-1");
    }
}
