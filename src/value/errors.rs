//! # Conversion Errors

use thiserror::Error;

use super::types::SemanticType;

/// Result type for value conversion
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Reasons a value could not be converted to a target type.
///
/// A conversion failure is an ordinary rejection, never a fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("No conversion from {from} to {to}")]
    NoBridge { from: SemanticType, to: SemanticType },

    #[error("Binary payload is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("'{input}' is not a valid {target} literal")]
    Lexical { target: SemanticType, input: String },

    #[error("Non-finite number cannot be converted to {0}")]
    NonFinite(SemanticType),

    #[error("Value has no {0} representation")]
    Unrepresentable(SemanticType),
}

impl ConversionError {
    /// Lexical failure for the given target; long inputs are truncated.
    pub fn lexical(target: SemanticType, input: &str) -> Self {
        const MAX_ECHO: usize = 64;
        let input = match input.char_indices().nth(MAX_ECHO) {
            Some((idx, _)) => format!("{}...", &input[..idx]),
            None => input.to_string(),
        };
        ConversionError::Lexical { target, input }
    }

    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ConversionError::NoBridge { .. } => "no_bridge",
            ConversionError::InvalidUtf8 => "invalid_utf8",
            ConversionError::Lexical { .. } => "lexical",
            ConversionError::NonFinite(_) => "non_finite",
            ConversionError::Unrepresentable(_) => "unrepresentable",
        }
    }
}
