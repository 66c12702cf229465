//! Generic property list value tree.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A decoded property list object.
///
/// Dictionaries keep their keys sorted, so two decodes of the same buffer
/// always compare equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Dictionary(BTreeMap<String, Self>),
    Array(Vec<Self>),
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    /// Raw bytes (`<data>` objects).
    Data(Vec<u8>),
    /// Seconds since 2001-01-01T00:00:00Z.
    Date(f64),
    /// Keyed-archiver object reference.
    Uid(u64),
    Null,
}

impl Value {
    /// Looks up `key` when this value is a dictionary.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> { self.as_dictionary()?.get(key) }

    #[must_use]
    pub const fn as_dictionary(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns integers and reals alike as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Human-readable name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Dictionary(_) => "dictionary",
            Self::Array(_) => "array",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Data(_) => "data",
            Self::Date(_) => "date",
            Self::Uid(_) => "uid",
            Self::Null => "null",
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Dictionary(map) => {
                Self::Object(map.iter().map(|(key, item)| (key.clone(), item.into())).collect())
            }
            Value::Array(items) => Self::Array(items.iter().map(Into::into).collect()),
            Value::Integer(number) => Self::from(*number),
            Value::Real(number) | Value::Date(number) => {
                serde_json::Number::from_f64(*number).map_or(Self::Null, Self::Number)
            }
            Value::String(text) => Self::String(text.clone()),
            Value::Boolean(flag) => Self::Bool(*flag),
            Value::Data(bytes) => Self::String(STANDARD.encode(bytes)),
            Value::Uid(uid) => serde_json::json!({ "CF$UID": uid }),
            Value::Null => Self::Null,
        }
    }
}
