use super::diagnostics::AttributePath;
use super::schema::{Attribute, AttributeKind, Nesting, Schema};
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned: Value,
    pub requires_replace: Vec<AttributePath>,
}

/// Turns Terraform's proposed new state into the provider's plan.
///
/// Defaults fill unset attributes, and computed attributes the user left
/// unset become unknown whenever the resource is going to change.
pub fn plan(schema: &Schema, prior: &Value, proposed: Value, config: &Value) -> PlannedChange {
    if proposed.is_null() {
        return PlannedChange {
            planned: Value::Null,
            requires_replace: Vec::new(),
        };
    }

    let mut planned = proposed;
    apply_defaults(&schema.attributes, &mut planned, config);

    if prior.is_null() || &planned != prior {
        mark_unknown(&schema.attributes, &mut planned, config);
    }

    let requires_replace = if prior.is_null() {
        Vec::new()
    } else {
        schema
            .attributes
            .iter()
            .filter(|attr| attr.force_new && planned.get(&attr.name) != prior.get(&attr.name))
            .map(|attr| AttributePath::root(&attr.name))
            .collect()
    };

    PlannedChange {
        planned,
        requires_replace,
    }
}

fn apply_defaults(attributes: &[Attribute], planned: &mut Value, config: &Value) {
    let Value::Object(object) = planned else {
        return;
    };
    for attr in attributes {
        let config_value = config.get(&attr.name);
        if let (Some(default), true) = (&attr.default, config_value.is_null()) {
            object.insert(attr.name.clone(), default.clone());
            continue;
        }
        if let Some(slot) = object.get_mut(&attr.name) {
            for_each_nested(attr, slot, config_value, apply_defaults);
        }
    }
}

fn mark_unknown(attributes: &[Attribute], planned: &mut Value, config: &Value) {
    let Value::Object(object) = planned else {
        return;
    };
    for attr in attributes {
        let config_value = config.get(&attr.name);
        let Some(slot) = object.get_mut(&attr.name) else {
            continue;
        };
        if attr.computed && attr.default.is_none() && config_value.is_null() {
            if !(attr.use_state_for_unknown && !slot.is_null()) {
                *slot = Value::Unknown;
            }
            continue;
        }
        for_each_nested(attr, slot, config_value, mark_unknown);
    }
}

fn for_each_nested(
    attr: &Attribute,
    slot: &mut Value,
    config: &Value,
    f: fn(&[Attribute], &mut Value, &Value),
) {
    let AttributeKind::Nested {
        nesting,
        attributes,
    } = &attr.kind
    else {
        return;
    };
    match (nesting, slot) {
        (Nesting::Single, slot) => f(attributes, slot, config),
        (Nesting::List, Value::List(items)) => {
            let config_items = config.as_list();
            for (i, item) in items.iter_mut().enumerate() {
                f(attributes, item, config_items.get(i).unwrap_or(&Value::Null));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "test",
            vec![
                Attribute::string("id").computed().use_state_for_unknown(),
                Attribute::string("space_id")
                    .optional()
                    .computed()
                    .force_new()
                    .use_state_for_unknown(),
                Attribute::string("name").required(),
                Attribute::string("slug").optional().computed(),
                Attribute::bool("use_guided_failure").default(false),
                Attribute::list_nested(
                    "phase",
                    vec![
                        Attribute::string("id").computed(),
                        Attribute::string("name").required(),
                        Attribute::bool("is_optional_phase").default(false),
                    ],
                )
                .optional(),
            ],
        )
    }

    fn config(name: &str) -> Value {
        Value::object([
            ("id", Value::Null),
            ("space_id", Value::Null),
            ("name", Value::from(name)),
            ("slug", Value::Null),
            ("use_guided_failure", Value::Null),
            (
                "phase",
                Value::List(vec![Value::object([
                    ("id", Value::Null),
                    ("name", Value::from("Dev")),
                    ("is_optional_phase", Value::Null),
                ])]),
            ),
        ])
    }

    fn prior() -> Value {
        Value::object([
            ("id", Value::from("Environments-1")),
            ("space_id", Value::from("Spaces-1")),
            ("name", Value::from("Dev")),
            ("slug", Value::from("dev")),
            ("use_guided_failure", Value::Bool(false)),
            (
                "phase",
                Value::List(vec![Value::object([
                    ("id", Value::from("Phases-1")),
                    ("name", Value::from("Dev")),
                    ("is_optional_phase", Value::Bool(false)),
                ])]),
            ),
        ])
    }

    #[test]
    fn test_create_marks_computed_unknown_and_applies_defaults() {
        let config = config("Dev");
        let change = plan(&schema(), &Value::Null, config.clone(), &config);
        let planned = change.planned;
        assert!(planned.get("id").is_unknown());
        assert!(planned.get("space_id").is_unknown());
        assert!(planned.get("slug").is_unknown());
        assert_eq!(planned.get("use_guided_failure"), &Value::Bool(false));
        let phase = &planned.get_list("phase")[0];
        assert!(phase.get("id").is_unknown());
        assert_eq!(phase.get("is_optional_phase"), &Value::Bool(false));
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn test_unchanged_resource_plans_prior_state() {
        let change = plan(&schema(), &prior(), prior(), &config("Dev"));
        assert_eq!(change.planned, prior());
    }

    #[test]
    fn test_update_keeps_state_for_stable_attributes() {
        let mut proposed = prior();
        proposed.set("name", Value::from("Development"));
        let change = plan(&schema(), &prior(), proposed, &config("Development"));
        let planned = change.planned;
        assert_eq!(planned.get_str("id"), Some("Environments-1"));
        assert_eq!(planned.get_str("space_id"), Some("Spaces-1"));
        assert!(planned.get("slug").is_unknown());
        assert_eq!(planned.get_str("name"), Some("Development"));
    }

    #[test]
    fn test_force_new_change_requires_replace() {
        let mut proposed = prior();
        proposed.set("space_id", Value::from("Spaces-2"));
        let mut config = config("Dev");
        config.set("space_id", Value::from("Spaces-2"));
        let change = plan(&schema(), &prior(), proposed, &config);
        assert_eq!(change.requires_replace, vec![AttributePath::root("space_id")]);
    }

    #[test]
    fn test_destroy_plans_null() {
        let change = plan(&schema(), &prior(), Value::Null, &Value::Null);
        assert!(change.planned.is_null());
    }
}
