//! Attribute builders and expand helpers shared by the resource schemas.

use super::ResourceError;
use crate::terraform::schema::{Attribute, Validator};
use crate::terraform::value::Value;

pub const TENANTED_DEPLOYMENT_MODES: &[&str] = &["Untenanted", "TenantedOrUntenanted", "Tenanted"];

pub fn id() -> Attribute {
    Attribute::string("id")
        .computed()
        .use_state_for_unknown()
        .description("The unique ID for this resource.")
}

pub fn space_id(display: &str) -> Attribute {
    Attribute::string("space_id")
        .optional()
        .computed()
        .force_new()
        .use_state_for_unknown()
        .description(format!("The space ID associated with this {display}."))
}

pub fn name(display: &str) -> Attribute {
    Attribute::string("name")
        .required()
        .validate(Validator::NotEmpty)
        .description(format!("The name of this {display}."))
}

pub fn description(display: &str) -> Attribute {
    Attribute::string("description")
        .optional()
        .description(format!("The description of this {display}."))
}

pub fn slug(display: &str) -> Attribute {
    Attribute::string("slug")
        .optional()
        .computed()
        .description(format!("The unique slug of this {display}."))
}

pub fn sort_order(display: &str) -> Attribute {
    Attribute::int("sort_order")
        .optional()
        .computed()
        .description(format!("The order number to sort this {display}."))
}

pub fn string_list(name: &str, description: &str) -> Attribute {
    Attribute::string_list(name).optional().description(description)
}

pub fn tenant_tags() -> Attribute {
    string_list(
        "tenant_tags",
        "A list of tenant tags in the format TagSetName/TagName.",
    )
}

pub fn tenanted_deployment_participation() -> Attribute {
    Attribute::string("tenanted_deployment_participation")
        .validate(Validator::OneOf(TENANTED_DEPLOYMENT_MODES))
        .default("Untenanted")
        .description("The tenanted deployment mode of the resource.")
}

pub fn required_id(value: &Value) -> Result<&str, ResourceError> {
    value
        .get_str("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ResourceError::InvalidConfig("resource has no id".to_string()))
}

/// The space a request targets; `None` falls back to the provider's space.
pub fn space_of(value: &Value) -> Option<String> {
    value.get_non_empty("space_id")
}

pub fn string_or_empty(value: &Value, key: &str) -> String {
    value.get_string(key).unwrap_or_default()
}

pub fn int_or(value: &Value, key: &str, default: i64) -> i64 {
    value.get_i64(key).unwrap_or(default)
}

pub fn bool_or(value: &Value, key: &str, default: bool) -> bool {
    value.get_bool(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_id_is_force_new() {
        let attr = space_id("environment");
        assert!(attr.force_new && attr.optional && attr.computed);
        assert_eq!(attr.description, "The space ID associated with this environment.");
    }

    #[test]
    fn test_required_id() {
        let value = Value::object([("id", Value::from("Projects-1"))]);
        assert_eq!(required_id(&value).unwrap(), "Projects-1");
        let value = Value::object([("id", Value::from(""))]);
        assert!(matches!(required_id(&value), Err(ResourceError::InvalidConfig(_))));
        assert!(required_id(&Value::Unknown).is_err());
    }

    #[test]
    fn test_space_of_ignores_unknown_and_empty() {
        assert_eq!(space_of(&Value::object([("space_id", Value::Unknown)])), None);
        assert_eq!(space_of(&Value::object([("space_id", Value::from(""))])), None);
        assert_eq!(
            space_of(&Value::object([("space_id", Value::from("Spaces-1"))])),
            Some("Spaces-1".to_string())
        );
    }

    #[test]
    fn test_scalar_helpers_default_unknowns() {
        let value = Value::object([("sort_order", Value::Unknown), ("flag", Value::Bool(true))]);
        assert_eq!(int_or(&value, "sort_order", 0), 0);
        assert!(bool_or(&value, "flag", false));
        assert_eq!(string_or_empty(&value, "missing"), "");
    }
}
