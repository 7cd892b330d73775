//! Value constraint parsing and evaluation
//!
//! Constraint grammar depends on the declared property type:
//!
//! | type      | expression                                   |
//! |-----------|----------------------------------------------|
//! | string    | regular expression, matched against the whole value |
//! | name      | exact name                                   |
//! | path      | exact path, or `<path>/*` for all descendants |
//! | boolean   | `true` or `false`                            |
//! | long      | range `[min, max]`, `(min, max)`, open ends allowed |
//! | double    | range, as for long                           |
//! | date      | range with canonical date bounds             |
//! | binary    | range over the payload length in bytes       |
//! | reference | node type the referenced node must have      |
//!
//! A property's constraints are OR'd. No constraints means unconstrained.
//! An expression that does not parse for its type is a configuration fault,
//! reported separately from a value that simply does not match.

use regex::Regex;
use std::cmp::Ordering;

use super::errors::{CheckError, CheckResult};
use super::registry::SchemaSource;
use crate::value::{is_valid_name, normalize_path, DateValue, SemanticType, Value};

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound<T> {
    pub value: T,
    pub inclusive: bool,
}

/// A range with optional lower and upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint<T> {
    pub lower: Option<Bound<T>>,
    pub upper: Option<Bound<T>>,
}

impl<T> RangeConstraint<T> {
    fn parse<F>(expression: &str, cmp: fn(&T, &T) -> Ordering, parse_bound: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<T>,
    {
        let expr = expression.trim();
        let lower_inclusive = match expr.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err("range must start with '[' or '('".into()),
        };
        let upper_inclusive = match expr.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err("range must end with ']' or ')'".into()),
        };
        if expr.len() < 2 {
            return Err("range is missing its bounds".into());
        }

        let inner = &expr[1..expr.len() - 1];
        let (lo, hi) = inner
            .split_once(',')
            .ok_or_else(|| "range must contain exactly one ','".to_string())?;
        if hi.contains(',') {
            return Err("range must contain exactly one ','".into());
        }

        let bound = |text: &str, inclusive: bool| -> Result<Option<Bound<T>>, String> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            parse_bound(text)
                .map(|value| Some(Bound { value, inclusive }))
                .ok_or_else(|| format!("'{}' is not a valid bound", text))
        };

        let range = Self {
            lower: bound(lo, lower_inclusive)?,
            upper: bound(hi, upper_inclusive)?,
        };

        if let (Some(lo), Some(hi)) = (&range.lower, &range.upper) {
            if cmp(&lo.value, &hi.value) == Ordering::Greater {
                return Err("lower bound exceeds upper bound".into());
            }
        }

        Ok(range)
    }

    fn contains(&self, value: &T, cmp: fn(&T, &T) -> Ordering) -> bool {
        let above = match &self.lower {
            Some(b) => match cmp(value, &b.value) {
                Ordering::Greater => true,
                Ordering::Equal => b.inclusive,
                Ordering::Less => false,
            },
            None => true,
        };
        let below = match &self.upper {
            Some(b) => match cmp(value, &b.value) {
                Ordering::Less => true,
                Ordering::Equal => b.inclusive,
                Ordering::Greater => false,
            },
            None => true,
        };
        above && below
    }
}

fn cmp_long(a: &i64, b: &i64) -> Ordering {
    a.cmp(b)
}

fn cmp_double(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

fn cmp_date(a: &DateValue, b: &DateValue) -> Ordering {
    a.cmp_instant(b)
}

fn parse_finite_double(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

/// A single parsed constraint.
#[derive(Debug, Clone)]
pub enum ValueConstraint {
    Pattern(Regex),
    Name(String),
    Path { path: String, descendants: bool },
    Boolean(bool),
    LongRange(RangeConstraint<i64>),
    DoubleRange(RangeConstraint<f64>),
    DateRange(RangeConstraint<DateValue>),
    BinaryLength(RangeConstraint<i64>),
    ReferenceNodeType(String),
}

impl ValueConstraint {
    /// Parses `expression` for a property of `required_type`.
    ///
    /// # Errors
    ///
    /// Returns NODETYPE_CONSTRAINT_MALFORMED if the expression is not valid
    /// for the type.
    pub fn parse(expression: &str, required_type: SemanticType) -> CheckResult<Self> {
        let malformed = |reason: String| CheckError::constraint_malformed(expression, reason);

        match required_type {
            // The bare expression must parse on its own before it is anchored
            SemanticType::String => Regex::new(expression)
                .and_then(|_| Regex::new(&format!("^(?:{})$", expression)))
                .map(ValueConstraint::Pattern)
                .map_err(|e| malformed(e.to_string())),
            SemanticType::Name => {
                if is_valid_name(expression) {
                    Ok(ValueConstraint::Name(expression.to_string()))
                } else {
                    Err(malformed("not a valid name".into()))
                }
            }
            SemanticType::Path => parse_path_constraint(expression).ok_or_else(|| malformed("not a valid path".into())),
            SemanticType::Boolean => {
                if expression.eq_ignore_ascii_case("true") {
                    Ok(ValueConstraint::Boolean(true))
                } else if expression.eq_ignore_ascii_case("false") {
                    Ok(ValueConstraint::Boolean(false))
                } else {
                    Err(malformed("expected 'true' or 'false'".into()))
                }
            }
            SemanticType::Long => RangeConstraint::parse(expression, cmp_long, |s| s.parse().ok())
                .map(ValueConstraint::LongRange)
                .map_err(malformed),
            SemanticType::Double => {
                RangeConstraint::parse(expression, cmp_double, parse_finite_double)
                    .map(ValueConstraint::DoubleRange)
                    .map_err(malformed)
            }
            SemanticType::Date => {
                RangeConstraint::parse(expression, cmp_date, |s| DateValue::parse(s).ok())
                    .map(ValueConstraint::DateRange)
                    .map_err(malformed)
            }
            SemanticType::Binary => RangeConstraint::parse(expression, cmp_long, |s| {
                s.parse::<i64>().ok().filter(|n| *n >= 0)
            })
            .map(ValueConstraint::BinaryLength)
            .map_err(malformed),
            SemanticType::Reference => {
                if is_valid_name(expression) {
                    Ok(ValueConstraint::ReferenceNodeType(expression.to_string()))
                } else {
                    Err(malformed("not a valid node type name".into()))
                }
            }
            SemanticType::Undefined => Err(malformed(
                "constraints are not permitted on undefined properties".into(),
            )),
        }
    }

    /// Returns true if the (already normalized) value matches.
    ///
    /// A value of a different type than the constraint never matches.
    pub fn matches<S: SchemaSource + ?Sized>(&self, value: &Value, source: &S) -> CheckResult<bool> {
        let matched = match (self, value) {
            (ValueConstraint::Pattern(re), Value::String(s)) => re.is_match(s),
            (ValueConstraint::Name(n), Value::Name(v)) => n == v,
            (ValueConstraint::Path { path, descendants }, Value::Path(v)) => {
                path_matches(path, *descendants, v)
            }
            (ValueConstraint::Boolean(b), Value::Boolean(v)) => b == v,
            (ValueConstraint::LongRange(r), Value::Long(v)) => r.contains(v, cmp_long),
            (ValueConstraint::DoubleRange(r), Value::Double(v)) => {
                !v.is_nan() && r.contains(v, cmp_double)
            }
            (ValueConstraint::DateRange(r), Value::Date(v)) => r.contains(v, cmp_date),
            (ValueConstraint::BinaryLength(r), Value::Binary(bytes)) => {
                let len = i64::try_from(bytes.len()).unwrap_or(i64::MAX);
                r.contains(&len, cmp_long)
            }
            (ValueConstraint::ReferenceNodeType(nt), Value::Reference(id)) => source
                .referenced_node_types(id)?
                .map_or(false, |types| types.iter().any(|t| t == nt)),
            _ => false,
        };
        Ok(matched)
    }
}

/// Constraint paths are stored normalized.
fn parse_path_constraint(expression: &str) -> Option<ValueConstraint> {
    let (path, descendants) = match expression.strip_suffix("/*") {
        Some("") => ("/", true),
        Some(prefix) => (prefix, true),
        None => (expression, false),
    };
    normalize_path(path).map(|path| ValueConstraint::Path { path, descendants })
}

fn path_matches(path: &str, descendants: bool, value: &str) -> bool {
    let normalized = normalize_path(value);
    let value = normalized.as_deref().unwrap_or(value);
    if !descendants {
        return path == value;
    }
    if path == "/" {
        return value.len() > 1 && value.starts_with('/');
    }
    value
        .strip_prefix(path)
        .map_or(false, |rest| rest.len() > 1 && rest.starts_with('/'))
}

/// Parses every constraint for `required_type`.
///
/// All expressions are parsed up front so a malformed one is reported
/// regardless of whether another would match.
pub fn compile_constraints(
    required_type: SemanticType,
    constraints: &[String],
) -> CheckResult<Vec<ValueConstraint>> {
    constraints
        .iter()
        .map(|expr| ValueConstraint::parse(expr, required_type))
        .collect()
}

/// Evaluates a property's constraints against a normalized value.
pub struct ConstraintEvaluator<'a, S: SchemaSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SchemaSource + ?Sized> ConstraintEvaluator<'a, S> {
    /// Creates an evaluator resolving references through `source`.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Returns true if no constraints are declared or any one matches.
    ///
    /// # Errors
    ///
    /// Returns NODETYPE_CONSTRAINT_MALFORMED for a malformed expression, or
    /// the schema source's error when a reference cannot be resolved.
    pub fn satisfies(
        &self,
        value: &Value,
        required_type: SemanticType,
        constraints: &[String],
    ) -> CheckResult<bool> {
        if constraints.is_empty() {
            return Ok(true);
        }
        let compiled = compile_constraints(required_type, constraints)?;
        self.satisfies_compiled(value, &compiled)
    }

    /// As [`satisfies`](Self::satisfies), over already-compiled constraints.
    pub fn satisfies_compiled(&self, value: &Value, compiled: &[ValueConstraint]) -> CheckResult<bool> {
        if compiled.is_empty() {
            return Ok(true);
        }
        for constraint in compiled {
            if constraint.matches(value, self.source)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
