//! Node type subsystem
//!
//! Decides whether values may be written to typed property slots.
//!
//! # Design Principles
//!
//! - Decisions are pure functions of value and schema metadata
//! - The checker never mutates definitions or storage
//! - A refused value is a `false` decision, never an error
//! - Malformed schema metadata and schema source failures are errors
//! - Arrays are all-or-nothing

mod checker;
mod constraint;
mod errors;
mod registry;
mod types;

pub use checker::{Decision, Inapplicability, PropertyAssignabilityChecker, Rejection};
pub use constraint::{compile_constraints, Bound, ConstraintEvaluator, RangeConstraint, ValueConstraint};
pub use errors::{CheckError, CheckErrorCode, CheckResult, FaultCategory, Severity};
pub use registry::{NodeTypeRegistry, SchemaSource};
pub use types::{NodeTypeDefinition, PropertyDefinition, RESIDUAL_NAME};
