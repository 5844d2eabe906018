use super::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use super::proto;
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// cty's JSON type notation, which is what the protocol expects.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeType::String => serde_json::json!("string"),
            AttributeType::Number => serde_json::json!("number"),
            AttributeType::Bool => serde_json::json!("bool"),
            AttributeType::List(inner) => serde_json::json!(["list", inner.to_json()]),
            AttributeType::Set(inner) => serde_json::json!(["set", inner.to_json()]),
            AttributeType::Map(inner) => serde_json::json!(["map", inner.to_json()]),
        }
    }

    pub fn label(&self) -> String {
        match self {
            AttributeType::String => "string".to_string(),
            AttributeType::Number => "number".to_string(),
            AttributeType::Bool => "bool".to_string(),
            AttributeType::List(inner) => format!("list({})", inner.label()),
            AttributeType::Set(inner) => format!("set({})", inner.label()),
            AttributeType::Map(inner) => format!("map({})", inner.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Single,
    List,
}

#[derive(Debug, Clone)]
pub enum AttributeKind {
    Primitive(AttributeType),
    Nested {
        nesting: Nesting,
        attributes: Vec<Attribute>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    NotEmpty,
    LengthBetween(usize, usize),
    OneOf(&'static [&'static str]),
    Uuid,
    HttpsUrl,
    Url,
    AtLeast(i64),
}

impl Validator {
    fn check(&self, name: &str, value: &Value) -> Option<String> {
        match (self, value) {
            (Validator::NotEmpty, Value::String(s)) if s.is_empty() => {
                Some(format!("expected \"{name}\" to not be an empty string"))
            }
            (Validator::LengthBetween(min, max), Value::String(s)) => {
                let len = s.chars().count();
                (len < *min || len > *max).then(|| {
                    format!(
                        "expected length of {name} to be in the range ({min} - {max}), got {s}"
                    )
                })
            }
            (Validator::OneOf(allowed), Value::String(s)) if !allowed.contains(&s.as_str()) => {
                Some(format!("expected {name} to be one of {allowed:?}, got {s}"))
            }
            (Validator::Uuid, Value::String(s)) if uuid::Uuid::parse_str(s).is_err() => {
                Some(format!("expected \"{name}\" to be a valid UUID, got {s}"))
            }
            (Validator::HttpsUrl, Value::String(s)) => match reqwest::Url::parse(s) {
                Ok(url) if url.scheme() == "https" => None,
                _ => Some(format!("expected \"{name}\" to have a url with schema of: \"https\", got {s}")),
            },
            (Validator::Url, Value::String(s)) => match reqwest::Url::parse(s) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => None,
                _ => Some(format!("expected \"{name}\" to be a valid http(s) url, got {s}")),
            },
            (Validator::AtLeast(min), v) => match v.as_i64() {
                Some(n) if n < *min => {
                    Some(format!("expected {name} to be at least ({min}), got {n}"))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub deprecated: bool,
    pub force_new: bool,
    pub use_state_for_unknown: bool,
    pub default: Option<Value>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            deprecated: false,
            force_new: false,
            use_state_for_unknown: false,
            default: None,
            validators: Vec::new(),
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::String))
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::Bool))
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::Number))
    }

    pub fn string_list(name: &str) -> Self {
        Self::new(
            name,
            AttributeKind::Primitive(AttributeType::List(Box::new(AttributeType::String))),
        )
    }

    pub fn string_set(name: &str) -> Self {
        Self::new(
            name,
            AttributeKind::Primitive(AttributeType::Set(Box::new(AttributeType::String))),
        )
    }

    pub fn map(name: &str, element: AttributeType) -> Self {
        Self::new(
            name,
            AttributeKind::Primitive(AttributeType::Map(Box::new(element))),
        )
    }

    pub fn list_nested(name: &str, attributes: Vec<Attribute>) -> Self {
        Self::new(
            name,
            AttributeKind::Nested {
                nesting: Nesting::List,
                attributes,
            },
        )
    }

    pub fn single_nested(name: &str, attributes: Vec<Attribute>) -> Self {
        Self::new(
            name,
            AttributeKind::Nested {
                nesting: Nesting::Single,
                attributes,
            },
        )
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self.computed = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.required = false;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }

    /// A default requires the attribute to be optional and computed, the
    /// same constraint Terraform places on framework defaults.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.optional().computed()
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn nested_attributes(&self) -> Option<&[Attribute]> {
        match &self.kind {
            AttributeKind::Nested { attributes, .. } => Some(attributes),
            AttributeKind::Primitive(_) => None,
        }
    }

    pub fn type_label(&self) -> String {
        match &self.kind {
            AttributeKind::Primitive(ty) => ty.label(),
            AttributeKind::Nested {
                nesting: Nesting::Single,
                ..
            } => "object".to_string(),
            AttributeKind::Nested {
                nesting: Nesting::List,
                ..
            } => "list(object)".to_string(),
        }
    }

    /// Read-only copy used for data source results.
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.force_new = false;
        self.default = None;
        self.validators.clear();
        if let AttributeKind::Nested { attributes, .. } = &mut self.kind {
            *attributes = std::mem::take(attributes)
                .into_iter()
                .map(Attribute::into_computed)
                .collect();
        }
        self
    }

    fn conform(&self, value: Value) -> Value {
        match (&self.kind, value) {
            (AttributeKind::Nested { nesting: Nesting::Single, attributes }, value) => {
                conform_object(attributes, value)
            }
            (AttributeKind::Nested { nesting: Nesting::List, attributes }, Value::List(items)) => {
                Value::List(
                    items
                        .into_iter()
                        .map(|item| conform_object(attributes, item))
                        .collect(),
                )
            }
            (_, value) => value,
        }
    }

    fn validate_value(&self, value: &Value, path: AttributePath, diags: &mut Diagnostics) {
        if value.is_null() || value.is_unknown() {
            return;
        }
        for validator in &self.validators {
            let targets: Vec<&Value> = match value {
                Value::List(items) => items.iter().collect(),
                other => vec![other],
            };
            for target in targets.into_iter().filter(|v| v.is_known()) {
                if let Some(message) = validator.check(&self.name, target) {
                    diags.push(Diagnostic::error("Invalid attribute value", message).at(path.clone()));
                }
            }
        }
        if let Some(attributes) = self.nested_attributes() {
            match value {
                Value::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        validate_object(attributes, item, path.clone().index(i), diags);
                    }
                }
                item => validate_object(attributes, item, path, diags),
            }
        }
    }

    fn to_proto(&self) -> proto::schema::Attribute {
        let (type_json, nested_type) = match &self.kind {
            AttributeKind::Primitive(ty) => (ty.to_json().to_string().into_bytes(), None),
            AttributeKind::Nested {
                nesting,
                attributes,
            } => {
                let nesting = match nesting {
                    Nesting::Single => proto::schema::object::NestingMode::Single,
                    Nesting::List => proto::schema::object::NestingMode::List,
                };
                let object = proto::schema::Object {
                    attributes: attributes.iter().map(Attribute::to_proto).collect(),
                    nesting: nesting as i32,
                    ..Default::default()
                };
                (Vec::new(), Some(object))
            }
        };
        proto::schema::Attribute {
            name: self.name.clone(),
            r#type: type_json,
            nested_type,
            description: self.description.clone(),
            required: self.required,
            optional: self.optional,
            computed: self.computed,
            sensitive: self.sensitive,
            description_kind: proto::StringKind::Plain as i32,
            deprecated: self.deprecated,
        }
    }
}

fn conform_object(attributes: &[Attribute], value: Value) -> Value {
    match value {
        Value::Object(mut object) => Value::Object(
            attributes
                .iter()
                .map(|attr| {
                    let v = object.remove(&attr.name).unwrap_or_default();
                    (attr.name.clone(), attr.conform(v))
                })
                .collect(),
        ),
        other => other,
    }
}

fn validate_object(attributes: &[Attribute], value: &Value, path: AttributePath, diags: &mut Diagnostics) {
    for attr in attributes {
        attr.validate_value(value.get(&attr.name), path.clone().attribute(&attr.name), diags);
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            version: 0,
            description: description.into(),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Shapes an object so it carries exactly the schema's attributes.
    pub fn conform(&self, value: Value) -> Value {
        conform_object(&self.attributes, value)
    }

    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for attr in &self.attributes {
            attr.validate_value(config.get(&attr.name), AttributePath::root(&attr.name), &mut diags);
        }
        diags
    }

    pub fn as_data_source(&self) -> Vec<Attribute> {
        self.attributes
            .iter()
            .cloned()
            .map(Attribute::into_computed)
            .collect()
    }

    pub fn to_proto(&self) -> proto::Schema {
        proto::Schema {
            version: self.version,
            block: Some(proto::schema::Block {
                version: self.version,
                attributes: self.attributes.iter().map(Attribute::to_proto).collect(),
                block_types: Vec::new(),
                description: self.description.clone(),
                description_kind: proto::StringKind::Plain as i32,
                deprecated: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle_like() -> Schema {
        Schema::new(
            "test",
            vec![
                Attribute::string("id").computed(),
                Attribute::string("name").required().validate(Validator::NotEmpty),
                Attribute::list_nested(
                    "phase",
                    vec![
                        Attribute::string("name").required(),
                        Attribute::int("minimum_environments_before_promotion")
                            .validate(Validator::AtLeast(0))
                            .default(0),
                    ],
                )
                .optional(),
            ],
        )
    }

    #[test]
    fn test_type_json_notation() {
        let ty = AttributeType::Map(Box::new(AttributeType::List(Box::new(AttributeType::String))));
        assert_eq!(ty.to_json(), serde_json::json!(["map", ["list", "string"]]));
        assert_eq!(ty.label(), "map(list(string))");
    }

    #[test]
    fn test_conform_fills_missing_and_drops_extra() {
        let value = Value::object([
            ("name", Value::from("Default")),
            ("unexpected", Value::from("x")),
            (
                "phase",
                Value::List(vec![Value::object([("name", Value::from("Dev"))])]),
            ),
        ]);
        let conformed = lifecycle_like().conform(value);
        let object = conformed.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(conformed.get("id").is_null());
        assert!(conformed.get("unexpected").is_null());
        let phase = &conformed.get_list("phase")[0];
        assert!(phase.get("minimum_environments_before_promotion").is_null());
        assert_eq!(phase.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_reports_nested_paths() {
        let config = Value::object([
            ("name", Value::from("")),
            (
                "phase",
                Value::List(vec![Value::object([
                    ("name", Value::from("Dev")),
                    ("minimum_environments_before_promotion", Value::Int(-1)),
                ])]),
            ),
        ]);
        let diags = lifecycle_like().validate(&config);
        assert_eq!(diags.len(), 2);
        let paths: Vec<String> = diags
            .iter()
            .map(|d| d.attribute.as_ref().unwrap().to_string())
            .collect();
        assert!(paths.contains(&"name".to_string()));
        assert!(paths.contains(&"phase[0].minimum_environments_before_promotion".to_string()));
    }

    #[test]
    fn test_validate_skips_unknown_values() {
        let config = Value::object([("name", Value::Unknown)]);
        assert!(lifecycle_like().validate(&config).is_empty());
    }

    #[test]
    fn test_validators() {
        let check = |v: Validator, value: &str| v.check("attr", &Value::from(value));
        assert!(check(Validator::Uuid, "not-a-uuid").is_some());
        assert!(check(Validator::Uuid, "2f6b0a7e-1c3d-4e5f-8a9b-0c1d2e3f4a5b").is_none());
        assert!(check(Validator::HttpsUrl, "http://example.com").is_some());
        assert!(check(Validator::HttpsUrl, "https://login.microsoftonline.com/").is_none());
        assert!(check(Validator::OneOf(&["Off", "On"]), "Maybe").is_some());
        assert!(check(Validator::LengthBetween(1, 20), "this name is far too long").is_some());
    }

    #[test]
    fn test_default_makes_attribute_optional_computed() {
        let attr = Attribute::bool("is_default").default(false);
        assert!(attr.optional && attr.computed && !attr.required);
    }

    #[test]
    fn test_as_data_source_strips_config_constraints() {
        let attrs = lifecycle_like().as_data_source();
        let name = attrs.iter().find(|a| a.name == "name").unwrap();
        assert!(name.computed && !name.required && name.validators.is_empty());
        let phase = attrs.iter().find(|a| a.name == "phase").unwrap();
        assert!(phase.nested_attributes().unwrap().iter().all(|a| a.computed && !a.optional));
    }

    #[test]
    fn test_to_proto_nested_attribute_has_no_type() {
        let schema = lifecycle_like().to_proto();
        let block = schema.block.unwrap();
        let phase = block.attributes.iter().find(|a| a.name == "phase").unwrap();
        assert!(phase.r#type.is_empty());
        assert_eq!(
            phase.nested_type.as_ref().unwrap().nesting,
            proto::schema::object::NestingMode::List as i32
        );
        let name = block.attributes.iter().find(|a| a.name == "name").unwrap();
        assert_eq!(name.r#type, b"\"string\"".to_vec());
    }
}
