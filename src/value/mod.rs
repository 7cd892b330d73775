//! Property values and type conversion
//!
//! Values are an exhaustively matched tagged union. Whether a value can be
//! written to a slot of another type is decided in two steps:
//!
//! 1. [`TypeCoercionMatrix`] rules out type pairs that can never convert
//! 2. [`ValueConverter`] attempts the content-dependent conversion
//!
//! Neither step has side effects, and identical inputs always produce
//! identical outcomes.

mod coercion;
mod converter;
mod date;
mod errors;
mod lexical;
mod types;

pub use coercion::TypeCoercionMatrix;
pub use converter::ValueConverter;
pub use date::DateValue;
pub use errors::{ConversionError, ConversionResult};
pub use lexical::{is_valid_name, is_valid_path, normalize_path};
pub use types::{SemanticType, Value};
