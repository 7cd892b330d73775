//! Property value type definitions
//!
//! Supported semantic types:
//! - string: UTF-8 text
//! - binary: raw byte payload
//! - date: instant with a fixed UTC offset
//! - double: 64-bit floating point
//! - long: 64-bit signed integer
//! - boolean: true/false
//! - name: qualified item name token
//! - path: item path token
//! - reference: identifier of a referenced node
//! - undefined: only valid as a declared type, never carried by a value

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::date::DateValue;

/// Closed set of semantic property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Binary,
    Date,
    Double,
    Long,
    Boolean,
    Name,
    Path,
    Reference,
    Undefined,
}

impl SemanticType {
    /// Every semantic type, in declaration order.
    pub const ALL: [SemanticType; 10] = [
        SemanticType::String,
        SemanticType::Binary,
        SemanticType::Date,
        SemanticType::Double,
        SemanticType::Long,
        SemanticType::Boolean,
        SemanticType::Name,
        SemanticType::Path,
        SemanticType::Reference,
        SemanticType::Undefined,
    ];

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Binary => "binary",
            SemanticType::Date => "date",
            SemanticType::Double => "double",
            SemanticType::Long => "long",
            SemanticType::Boolean => "boolean",
            SemanticType::Name => "name",
            SemanticType::Path => "path",
            SemanticType::Reference => "reference",
            SemanticType::Undefined => "undefined",
        }
    }

    /// Parses a type name as produced by [`SemanticType::type_name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.type_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// An immutable property value.
///
/// Each variant pairs exactly one semantic type with its payload. Values
/// never change in place; conversion always builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    Date(DateValue),
    Double(f64),
    Long(i64),
    Boolean(bool),
    Name(String),
    Path(String),
    Reference(Uuid),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a binary value from anything byte-like
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    /// Create a name value
    pub fn name(s: impl Into<String>) -> Self {
        Value::Name(s.into())
    }

    /// Create a path value
    pub fn path(s: impl Into<String>) -> Self {
        Value::Path(s.into())
    }

    /// Returns the semantic type carried by this value.
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Value::String(_) => SemanticType::String,
            Value::Binary(_) => SemanticType::Binary,
            Value::Date(_) => SemanticType::Date,
            Value::Double(_) => SemanticType::Double,
            Value::Long(_) => SemanticType::Long,
            Value::Boolean(_) => SemanticType::Boolean,
            Value::Name(_) => SemanticType::Name,
            Value::Path(_) => SemanticType::Path,
            Value::Reference(_) => SemanticType::Reference,
        }
    }

    /// Returns the lexical string form of the value, if it has one.
    ///
    /// Binary payloads that are not valid UTF-8 and dates outside the
    /// calendar range have no string form.
    pub fn lexical_form(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Name(s) | Value::Path(s) => Some(s.clone()),
            Value::Binary(bytes) => String::from_utf8(bytes.clone()).ok(),
            Value::Date(d) => d.to_canonical_string(),
            Value::Double(d) => Some(d.to_string()),
            Value::Long(l) => Some(l.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Reference(id) => Some(id.hyphenated().to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Binary(bytes) => write!(f, "binary({} bytes)", bytes.len()),
            Value::Date(d) => write!(f, "{}", d),
            other => match other.lexical_form() {
                Some(s) => write!(f, "{}", s),
                None => write!(f, "<{}>", other.semantic_type()),
            },
        }
    }
}

/// Binary payloads travel as standard base64 in JSON.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
