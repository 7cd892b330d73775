//! Value conversion between semantic types
//!
//! Conversion rules:
//! - binary sources are decoded as strict UTF-8 before any lexical parse
//! - text to date/long/double/boolean/name/path/reference requires a valid literal
//! - date <-> numeric uses milliseconds since the epoch
//! - double to long/date truncates toward zero and saturates at the i64 range
//! - every value converts to string and binary through its lexical form
//!
//! Conversion never panics and never mutates its input.

use uuid::Uuid;

use super::date::DateValue;
use super::errors::{ConversionError, ConversionResult};
use super::lexical::{is_valid_name, is_valid_path, path_as_name};
use super::types::{SemanticType, Value};

/// Stateless converter between semantic types.
pub struct ValueConverter;

impl ValueConverter {
    /// Converts `value` to `target`, producing a new normalized value.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if no bridge exists between the two types
    /// or the value's content is not a valid literal of the target type.
    pub fn convert(value: &Value, target: SemanticType) -> ConversionResult<Value> {
        if value.semantic_type() == target {
            return Ok(value.clone());
        }

        match target {
            SemanticType::Undefined => Ok(value.clone()),
            SemanticType::String => to_string(value).map(Value::String),
            SemanticType::Binary => to_string(value).map(|s| Value::Binary(s.into_bytes())),
            SemanticType::Date => to_date(value).map(Value::Date),
            SemanticType::Double => to_double(value).map(Value::Double),
            SemanticType::Long => to_long(value).map(Value::Long),
            SemanticType::Boolean => to_boolean(value).map(Value::Boolean),
            SemanticType::Name => to_name(value).map(Value::Name),
            SemanticType::Path => to_path(value).map(Value::Path),
            SemanticType::Reference => to_reference(value).map(Value::Reference),
        }
    }

    /// Returns true if `value` converts to `target`.
    pub fn is_convertible(value: &Value, target: SemanticType) -> bool {
        Self::convert(value, target).is_ok()
    }
}

fn no_bridge(value: &Value, target: SemanticType) -> ConversionError {
    ConversionError::NoBridge {
        from: value.semantic_type(),
        to: target,
    }
}

/// Text carried by string and binary values; anything else has no text.
fn text_of(value: &Value, target: SemanticType) -> ConversionResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Binary(bytes) => {
            String::from_utf8(bytes.clone()).map_err(|_| ConversionError::InvalidUtf8)
        }
        other => Err(no_bridge(other, target)),
    }
}

fn to_string(value: &Value) -> ConversionResult<String> {
    match value {
        Value::Binary(_) => text_of(value, SemanticType::String),
        other => other
            .lexical_form()
            .ok_or(ConversionError::Unrepresentable(SemanticType::String)),
    }
}

fn finite(d: f64, target: SemanticType) -> ConversionResult<f64> {
    if d.is_finite() {
        Ok(d)
    } else {
        Err(ConversionError::NonFinite(target))
    }
}

fn to_date(value: &Value) -> ConversionResult<DateValue> {
    match value {
        Value::String(_) | Value::Binary(_) => {
            let text = text_of(value, SemanticType::Date)?;
            DateValue::parse(&text)
        }
        Value::Date(d) => Ok(*d),
        Value::Long(l) => Ok(DateValue::from_epoch_millis(*l)),
        // `as` truncates toward zero and saturates
        Value::Double(d) => {
            finite(*d, SemanticType::Date).map(|d| DateValue::from_epoch_millis(d as i64))
        }
        Value::Boolean(_) | Value::Name(_) | Value::Path(_) | Value::Reference(_) => {
            Err(no_bridge(value, SemanticType::Date))
        }
    }
}

fn to_double(value: &Value) -> ConversionResult<f64> {
    match value {
        Value::String(_) | Value::Binary(_) => {
            let text = text_of(value, SemanticType::Double)?;
            text.parse::<f64>()
                .map_err(|_| ConversionError::lexical(SemanticType::Double, &text))
        }
        Value::Date(d) => Ok(d.epoch_millis() as f64),
        Value::Double(d) => Ok(*d),
        Value::Long(l) => Ok(*l as f64),
        Value::Boolean(_) | Value::Name(_) | Value::Path(_) | Value::Reference(_) => {
            Err(no_bridge(value, SemanticType::Double))
        }
    }
}

fn to_long(value: &Value) -> ConversionResult<i64> {
    match value {
        Value::String(_) | Value::Binary(_) => {
            let text = text_of(value, SemanticType::Long)?;
            text.parse::<i64>()
                .map_err(|_| ConversionError::lexical(SemanticType::Long, &text))
        }
        Value::Date(d) => Ok(d.epoch_millis()),
        Value::Double(d) => finite(*d, SemanticType::Long).map(|d| d as i64),
        Value::Long(l) => Ok(*l),
        Value::Boolean(_) | Value::Name(_) | Value::Path(_) | Value::Reference(_) => {
            Err(no_bridge(value, SemanticType::Long))
        }
    }
}

fn to_boolean(value: &Value) -> ConversionResult<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        _ => {
            let text = text_of(value, SemanticType::Boolean)?;
            if text.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if text.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(ConversionError::lexical(SemanticType::Boolean, &text))
            }
        }
    }
}

fn to_name(value: &Value) -> ConversionResult<String> {
    match value {
        Value::Name(n) => Ok(n.clone()),
        Value::Path(p) => path_as_name(p)
            .map(str::to_string)
            .ok_or_else(|| ConversionError::lexical(SemanticType::Name, p)),
        _ => {
            let text = text_of(value, SemanticType::Name)?;
            if is_valid_name(&text) {
                Ok(text)
            } else {
                Err(ConversionError::lexical(SemanticType::Name, &text))
            }
        }
    }
}

fn to_path(value: &Value) -> ConversionResult<String> {
    match value {
        Value::Path(p) | Value::Name(p) => Ok(p.clone()),
        _ => {
            let text = text_of(value, SemanticType::Path)?;
            if is_valid_path(&text) {
                Ok(text)
            } else {
                Err(ConversionError::lexical(SemanticType::Path, &text))
            }
        }
    }
}

fn to_reference(value: &Value) -> ConversionResult<Uuid> {
    match value {
        Value::Reference(id) => Ok(*id),
        _ => {
            let text = text_of(value, SemanticType::Reference)?;
            // Only the hyphenated form is a reference literal
            if text.len() != 36 {
                return Err(ConversionError::lexical(SemanticType::Reference, &text));
            }
            Uuid::parse_str(&text)
                .map_err(|_| ConversionError::lexical(SemanticType::Reference, &text))
        }
    }
}
