use super::schema::{Attribute, AttributeKind, Nesting, Schema};
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// After create or update: known planned values are kept as planned,
    /// unknowns are filled in from the API.
    Apply,
    /// After read: the API wins, except where it cannot tell us anything
    /// new (zero values for attributes that were never set, secrets the
    /// API does not echo back).
    Refresh,
}

/// Merges a freshly flattened API object into the state Terraform knows.
pub fn reconcile(schema: &Schema, mode: Reconcile, known: &Value, api: Value) -> Value {
    merge_object(&schema.attributes, mode, known, schema.conform(api))
}

fn merge_object(attributes: &[Attribute], mode: Reconcile, known: &Value, api: Value) -> Value {
    let Value::Object(mut api) = api else {
        return api;
    };
    Value::Object(
        attributes
            .iter()
            .map(|attr| {
                let api_value = api.remove(&attr.name).unwrap_or_default();
                let merged = merge_attribute(attr, mode, known.get(&attr.name), api_value);
                (attr.name.clone(), merged)
            })
            .collect(),
    )
}

fn merge_attribute(attr: &Attribute, mode: Reconcile, known: &Value, api: Value) -> Value {
    match mode {
        Reconcile::Apply => {
            if known.is_known() {
                return known.clone();
            }
            if known.is_unknown() {
                return api;
            }
            merge_nested(attr, mode, known, api)
        }
        Reconcile::Refresh => {
            if attr.sensitive && api.is_zero() {
                return known.clone();
            }
            if api.is_zero() && known.is_zero() && attr.default.as_ref() != Some(&api) {
                return known.clone();
            }
            merge_nested(attr, mode, known, api)
        }
    }
}

fn merge_nested(attr: &Attribute, mode: Reconcile, known: &Value, api: Value) -> Value {
    let AttributeKind::Nested {
        nesting,
        attributes,
    } = &attr.kind
    else {
        return api;
    };
    match (nesting, known, api) {
        (Nesting::Single, Value::Object(_), api @ Value::Object(_)) => {
            merge_object(attributes, mode, known, api)
        }
        (Nesting::List, Value::List(known_items), Value::List(api_items))
            if known_items.len() == api_items.len() =>
        {
            Value::List(
                known_items
                    .iter()
                    .zip(api_items)
                    .map(|(known, api)| merge_object(attributes, mode, known, api))
                    .collect(),
            )
        }
        (_, _, api) => api,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "test",
            vec![
                Attribute::string("id").computed(),
                Attribute::string("name").required(),
                Attribute::string("description").optional(),
                Attribute::string("password").optional().sensitive(),
                Attribute::bool("use_guided_failure").default(false),
                Attribute::list_nested(
                    "phase",
                    vec![
                        Attribute::string("id").computed(),
                        Attribute::string("name").required(),
                    ],
                )
                .optional(),
            ],
        )
    }

    #[test]
    fn test_apply_fills_unknowns_and_keeps_planned() {
        let planned = Value::object([
            ("id", Value::Unknown),
            ("name", Value::from("Dev")),
            ("description", Value::Null),
            ("password", Value::from("secret")),
            ("use_guided_failure", Value::Bool(false)),
            (
                "phase",
                Value::List(vec![Value::object([
                    ("id", Value::Unknown),
                    ("name", Value::from("Dev")),
                ])]),
            ),
        ]);
        let api = Value::object([
            ("id", Value::from("Lifecycles-1")),
            ("name", Value::from("Dev")),
            ("description", Value::from("")),
            ("password", Value::Null),
            ("use_guided_failure", Value::Bool(false)),
            (
                "phase",
                Value::List(vec![Value::object([
                    ("id", Value::from("Phases-9")),
                    ("name", Value::from("Dev")),
                ])]),
            ),
        ]);
        let state = reconcile(&schema(), Reconcile::Apply, &planned, api);
        assert_eq!(state.get_str("id"), Some("Lifecycles-1"));
        assert!(state.get("description").is_null());
        assert_eq!(state.get_str("password"), Some("secret"));
        assert_eq!(state.get_list("phase")[0].get_str("id"), Some("Phases-9"));
    }

    #[test]
    fn test_refresh_detects_drift() {
        let prior = Value::object([("id", Value::from("Environments-1")), ("name", Value::from("Dev"))]);
        let api = Value::object([("id", Value::from("Environments-1")), ("name", Value::from("Test"))]);
        let state = reconcile(&schema(), Reconcile::Refresh, &prior, api);
        assert_eq!(state.get_str("name"), Some("Test"));
    }

    #[test]
    fn test_refresh_keeps_null_for_zero_values_and_secrets() {
        let prior = Value::object([
            ("id", Value::from("Accounts-1")),
            ("description", Value::Null),
            ("password", Value::from("secret")),
        ]);
        let api = Value::object([
            ("id", Value::from("Accounts-1")),
            ("description", Value::from("")),
            ("password", Value::Null),
        ]);
        let state = reconcile(&schema(), Reconcile::Refresh, &prior, api);
        assert!(state.get("description").is_null());
        assert_eq!(state.get_str("password"), Some("secret"));
    }

    #[test]
    fn test_import_refresh_uses_defaults_from_api() {
        let prior = Value::object([("id", Value::from("Environments-1"))]);
        let api = Value::object([
            ("id", Value::from("Environments-1")),
            ("use_guided_failure", Value::Bool(false)),
        ]);
        let state = reconcile(&schema(), Reconcile::Refresh, &prior, api);
        assert_eq!(state.get("use_guided_failure"), &Value::Bool(false));
        assert_eq!(state.as_object().unwrap().len(), 6);
    }
}
