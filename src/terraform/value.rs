use std::collections::BTreeMap;

use thiserror::Error;

/// A Terraform value as it travels over the plugin protocol.
///
/// Lists and sets both decode to `List`; maps and objects both decode to
/// `Object`. The schema decides which one a given attribute really is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Unknown,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("failed to decode msgpack value: {0}")]
    Decode(String),

    #[error("failed to encode msgpack value: {0}")]
    Encode(String),

    #[error("failed to decode json value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported value: {0}")]
    Unsupported(String),
}

static NULL: Value = Value::Null;

// NOTE: cty encodes unknown values as a fixext1 with extension type 0.
const UNKNOWN_EXT_TYPE: i8 = 0;
const RESERVED_MARKER: u8 = 0xc1;

impl Value {
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ValueError> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        // NOTE: rmpv reads the reserved marker as nil.
        if bytes[0] == RESERVED_MARKER {
            return Err(ValueError::Decode("reserved marker 0xc1".to_string()));
        }
        let mut reader = bytes;
        let raw = rmpv::decode::read_value(&mut reader)
            .map_err(|e| ValueError::Decode(e.to_string()))?;
        if !reader.is_empty() {
            return Err(ValueError::Decode(format!(
                "{} trailing bytes after value",
                reader.len()
            )));
        }
        Self::try_from_rmpv(raw)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ValueError> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &self.to_rmpv())
            .map_err(|e| ValueError::Encode(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ValueError> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(Self::from(json))
    }

    fn try_from_rmpv(raw: rmpv::Value) -> Result<Self, ValueError> {
        Ok(match raw {
            rmpv::Value::Nil => Value::Null,
            rmpv::Value::Boolean(b) => Value::Bool(b),
            rmpv::Value::Integer(i) => match i.as_i64() {
                Some(n) => Value::Int(n),
                None => Value::Float(i.as_f64().unwrap_or(f64::MAX)),
            },
            rmpv::Value::F32(f) => float_value(f64::from(f)),
            rmpv::Value::F64(f) => float_value(f),
            rmpv::Value::String(s) => match s.into_str() {
                Some(s) => Value::String(s),
                None => return Err(ValueError::Unsupported("non-utf8 string".to_string())),
            },
            rmpv::Value::Binary(_) => {
                return Err(ValueError::Unsupported("binary data".to_string()));
            }
            rmpv::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Self::try_from_rmpv)
                    .collect::<Result<_, _>>()?,
            ),
            rmpv::Value::Map(entries) => {
                let mut object = BTreeMap::new();
                for (key, value) in entries {
                    let key = match key {
                        rmpv::Value::String(s) => s.into_str().ok_or_else(|| {
                            ValueError::Unsupported("non-utf8 object key".to_string())
                        })?,
                        other => {
                            return Err(ValueError::Unsupported(format!(
                                "object key {other}"
                            )));
                        }
                    };
                    object.insert(key, Self::try_from_rmpv(value)?);
                }
                Value::Object(object)
            }
            rmpv::Value::Ext(_, _) => Value::Unknown,
        })
    }

    fn to_rmpv(&self) -> rmpv::Value {
        match self {
            Value::Null => rmpv::Value::Nil,
            Value::Unknown => rmpv::Value::Ext(UNKNOWN_EXT_TYPE, vec![0]),
            Value::Bool(b) => rmpv::Value::from(*b),
            Value::Int(n) => rmpv::Value::from(*n),
            Value::Float(f) => rmpv::Value::from(*f),
            Value::String(s) => rmpv::Value::from(s.as_str()),
            Value::List(items) => rmpv::Value::Array(items.iter().map(Self::to_rmpv).collect()),
            Value::Object(object) => rmpv::Value::Map(
                object
                    .iter()
                    .map(|(k, v)| (rmpv::Value::from(k.as_str()), v.to_rmpv()))
                    .collect(),
            ),
        }
    }

    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn strings<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Self {
        Value::List(
            items
                .into_iter()
                .map(|s| Value::String(s.as_ref().to_string()))
                .collect(),
        )
    }

    /// Empty strings flatten to null so optional attributes stay unset.
    pub fn optional_string(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        if s.is_empty() {
            Value::Null
        } else {
            Value::String(s.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// True when neither the value nor anything nested in it is unknown.
    pub fn is_known(&self) -> bool {
        match self {
            Value::Unknown => false,
            Value::List(items) => items.iter().all(Value::is_known),
            Value::Object(object) => object.values().all(Value::is_known),
            _ => true,
        }
    }

    /// Zero values are what the API returns for fields nobody set.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Object(object) => object.is_empty(),
            Value::Unknown => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> &[Value] {
        match self {
            Value::List(items) => items,
            _ => &[],
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Attribute lookup; anything missing reads as null.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Object(object) => object.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).as_str()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(str::to_string)
    }

    /// Like `get_string` but an empty string counts as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get_str(key)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_bool()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).as_i64()
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key).as_list()
    }

    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    /// First element of a single-item nested list, the shape used for
    /// optional sub-objects like retention policies.
    pub fn get_first(&self, key: &str) -> Option<&Value> {
        self.get_list(key).first().filter(|v| !v.is_null())
    }

    /// A single nested object, when it is set and fully known.
    pub fn get_object(&self, key: &str) -> Option<&Value> {
        let value = self.get(key);
        (value.as_object().is_some() && value.is_known()).then_some(value)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        if let Value::Object(object) = self {
            object.insert(key.to_string(), value);
        }
    }
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => float_value(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => {
                Value::Object(object.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
