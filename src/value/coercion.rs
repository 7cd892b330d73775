//! Static type admissibility table
//!
//! Answers whether a value of one semantic type could ever be converted to
//! another, without looking at the value itself. Admissibility is necessary
//! but not sufficient: content-dependent pairs (text to date, bytes to name,
//! ...) still have to pass the converter.

use super::types::SemanticType;

/// Content-independent conversion lattice.
pub struct TypeCoercionMatrix;

impl TypeCoercionMatrix {
    /// Returns true if `source` values may be convertible to `target`.
    pub fn admissible(source: SemanticType, target: SemanticType) -> bool {
        use SemanticType::*;

        // No value ever carries Undefined
        if source == Undefined {
            return false;
        }
        if source == target {
            return true;
        }

        match target {
            // Every concrete value has a string form (and therefore bytes)
            String | Binary | Undefined => true,
            Date | Double | Long => matches!(source, String | Binary | Date | Double | Long),
            Boolean => matches!(source, String | Binary),
            Name | Path => matches!(source, String | Binary | Name | Path),
            Reference => matches!(source, String | Binary),
        }
    }

    /// All admissible targets for a source type, in declaration order.
    pub fn targets_of(source: SemanticType) -> Vec<SemanticType> {
        SemanticType::ALL
            .iter()
            .copied()
            .filter(|t| Self::admissible(source, *t))
            .collect()
    }
}
