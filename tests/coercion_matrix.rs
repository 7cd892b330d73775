//! Coercion Matrix Tests
//!
//! The admissibility table is fixed and total, and the converter never
//! succeeds where the table says no.

use nodetype::value::{DateValue, SemanticType, TypeCoercionMatrix, Value, ValueConverter};
use uuid::Uuid;

use SemanticType::*;

/// Rows are sources, columns are targets, both in `SemanticType::ALL` order.
const TABLE: [[bool; 10]; 10] = {
    const Y: bool = true;
    const N: bool = false;
    [
        // Str Bin Date Dbl Long Bool Name Path Ref Undef
        [Y, Y, Y, Y, Y, Y, Y, Y, Y, Y], // String
        [Y, Y, Y, Y, Y, Y, Y, Y, Y, Y], // Binary
        [Y, Y, Y, Y, Y, N, N, N, N, Y], // Date
        [Y, Y, Y, Y, Y, N, N, N, N, Y], // Double
        [Y, Y, Y, Y, Y, N, N, N, N, Y], // Long
        [Y, Y, N, N, N, Y, N, N, N, Y], // Boolean
        [Y, Y, N, N, N, N, Y, Y, N, Y], // Name
        [Y, Y, N, N, N, N, Y, Y, N, Y], // Path
        [Y, Y, N, N, N, N, N, N, Y, Y], // Reference
        [N, N, N, N, N, N, N, N, N, N], // Undefined
    ]
};

#[test]
fn test_matrix_matches_table() {
    for (i, source) in SemanticType::ALL.iter().enumerate() {
        for (j, target) in SemanticType::ALL.iter().enumerate() {
            assert_eq!(
                TypeCoercionMatrix::admissible(*source, *target),
                TABLE[i][j],
                "admissible({}, {})",
                source,
                target
            );
        }
    }
}

#[test]
fn test_identity_always_admissible_for_concrete_types() {
    for t in SemanticType::ALL.iter().filter(|t| **t != Undefined) {
        assert!(TypeCoercionMatrix::admissible(*t, *t));
    }
}

fn samples() -> Vec<Value> {
    vec![
        Value::string("2024-01-01T00:00:00.000Z"),
        Value::string("42"),
        Value::string("true"),
        Value::string("test:name"),
        Value::string("/a/b"),
        Value::string("6f1c2a4e-9b1d-4c3e-8f7a-0d2b5e6c7a81"),
        Value::binary(b"1.5".to_vec()),
        Value::binary(vec![0xc3, 0x28]),
        Value::Date(DateValue::from_epoch_millis(0)),
        Value::Double(-12.5),
        Value::Long(1_700_000_000_000),
        Value::Boolean(true),
        Value::name("test:name"),
        Value::path("/a/b"),
        Value::Reference(Uuid::new_v4()),
    ]
}

#[test]
fn test_conversion_implies_admissibility() {
    for value in samples() {
        for target in SemanticType::ALL {
            if ValueConverter::is_convertible(&value, target) {
                assert!(
                    TypeCoercionMatrix::admissible(value.semantic_type(), target),
                    "{:?} converted to {} without an admissible pair",
                    value,
                    target
                );
            }
        }
    }
}

#[test]
fn test_conversion_result_carries_target_type() {
    for value in samples() {
        for target in SemanticType::ALL.iter().filter(|t| **t != Undefined) {
            if let Ok(converted) = ValueConverter::convert(&value, *target) {
                assert_eq!(converted.semantic_type(), *target);
            }
        }
    }
}

#[test]
fn test_date_identity() {
    let value = Value::Date(DateValue::parse("1999-12-31T23:59:59.999-08:00").unwrap());
    assert_eq!(ValueConverter::convert(&value, Date).unwrap(), value);
}

#[test]
fn test_date_to_string_is_canonical() {
    let value = Value::Long(0);
    let converted = ValueConverter::convert(&value, Date).unwrap();
    assert_eq!(
        ValueConverter::convert(&converted, String).unwrap(),
        Value::string("1970-01-01T00:00:00.000Z")
    );
}
