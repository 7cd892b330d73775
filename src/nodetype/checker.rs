//! Property assignability checker
//!
//! Decision pipeline for each value:
//! 1. Look up the applicable property definition
//! 2. Check multiplicity and the protected flag
//! 3. Type admissibility (static table)
//! 4. Content conversion to the declared type
//! 5. Value constraints on the converted value
//!
//! Arrays are all-or-nothing: every element runs the full pipeline and a
//! single failing element, at any position, rejects the array.
//!
//! The checker holds no mutable state. Rejections are `Ok` decisions;
//! only configuration faults and schema source failures are `Err`.

use std::fmt;

use super::constraint::{compile_constraints, ConstraintEvaluator, ValueConstraint};
use super::errors::{CheckError, CheckResult, FaultCategory};
use super::registry::SchemaSource;
use super::types::PropertyDefinition;
use crate::observability::{Event, Logger};
use crate::value::{ConversionError, SemanticType, TypeCoercionMatrix, Value, ValueConverter};

/// Why no decision could be made for a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Inapplicability {
    /// No named or residual definition applies
    NoDefinition,
    /// The definition's multiplicity differs from the request
    MultiplicityMismatch { definition_multiple: bool },
}

/// Why a value was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Definition is protected
    Protected,
    /// Type pair can never convert
    NotAdmissible { from: SemanticType, to: SemanticType },
    /// Content does not convert
    ConversionFailed(ConversionError),
    /// Converted value matches no declared constraint
    ConstraintViolated,
    /// Zero-length array not permitted
    EmptyArray,
    /// Definition is mandatory (removal only)
    Mandatory,
}

impl Rejection {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Protected => "protected",
            Rejection::NotAdmissible { .. } => "not_admissible",
            Rejection::ConversionFailed(_) => "conversion_failed",
            Rejection::ConstraintViolated => "constraint_violated",
            Rejection::EmptyArray => "empty_array",
            Rejection::Mandatory => "mandatory",
        }
    }
}

/// Outcome of an assignability check.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Assignable,
    Rejected {
        reason: Rejection,
        /// Failing element for array checks
        index: Option<usize>,
    },
    Inapplicable(Inapplicability),
}

impl Decision {
    fn rejected(reason: Rejection) -> Self {
        Decision::Rejected {
            reason,
            index: None,
        }
    }

    /// Returns true only for [`Decision::Assignable`].
    pub fn is_assignable(&self) -> bool {
        matches!(self, Decision::Assignable)
    }

    /// Short machine-readable reason; empty for assignable.
    pub fn reason(&self) -> &'static str {
        match self {
            Decision::Assignable => "",
            Decision::Rejected { reason, .. } => reason.reason(),
            Decision::Inapplicable(Inapplicability::NoDefinition) => "no_definition",
            Decision::Inapplicable(Inapplicability::MultiplicityMismatch { .. }) => {
                "multiplicity_mismatch"
            }
        }
    }

    fn event(&self) -> Event {
        match self {
            Decision::Assignable => Event::CheckAssignable,
            Decision::Rejected { .. } => Event::CheckRejected,
            Decision::Inapplicable(_) => Event::CheckInapplicable,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Assignable => write!(f, "assignable"),
            Decision::Rejected {
                reason: Rejection::ConversionFailed(e),
                index,
            } => match index {
                Some(i) => write!(f, "rejected at [{}]: {}", i, e),
                None => write!(f, "rejected: {}", e),
            },
            Decision::Rejected { reason, index } => match index {
                Some(i) => write!(f, "rejected at [{}]: {}", i, reason.reason()),
                None => write!(f, "rejected: {}", reason.reason()),
            },
            Decision::Inapplicable(_) => write!(f, "inapplicable: {}", self.reason()),
        }
    }
}

/// Decides whether values may be written to properties of one node type.
pub struct PropertyAssignabilityChecker<'a, S: SchemaSource + ?Sized> {
    source: &'a S,
    node_type: String,
}

impl<'a, S: SchemaSource + ?Sized> PropertyAssignabilityChecker<'a, S> {
    /// Creates a checker for `node_type` backed by `source`.
    pub fn new(source: &'a S, node_type: impl Into<String>) -> Self {
        Self {
            source,
            node_type: node_type.into(),
        }
    }

    /// Node type this checker decides for.
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Returns true if `value` may be set on the single-valued property
    /// `property_name`.
    ///
    /// # Errors
    ///
    /// Malformed constraints and schema source failures are returned as
    /// errors; every other outcome is a boolean.
    pub fn can_set_property(&self, property_name: &str, value: &Value) -> CheckResult<bool> {
        Ok(self.evaluate_property(property_name, value)?.is_assignable())
    }

    /// Returns true if every one of `values` may be set on the multi-valued
    /// property `property_name`.
    pub fn can_set_property_values(&self, property_name: &str, values: &[Value]) -> CheckResult<bool> {
        Ok(self
            .evaluate_property_values(property_name, values)?
            .is_assignable())
    }

    /// Returns true if `property_name` may be removed from the node.
    pub fn can_remove_property(&self, property_name: &str) -> CheckResult<bool> {
        Ok(self.evaluate_removal(property_name)?.is_assignable())
    }

    /// Detailed single-value decision.
    pub fn evaluate_property(&self, property_name: &str, value: &Value) -> CheckResult<Decision> {
        let def = match self.lookup(property_name, Some(false))? {
            Some(def) => def,
            None => {
                return Ok(self.record(
                    property_name,
                    Decision::Inapplicable(Inapplicability::NoDefinition),
                ))
            }
        };

        if def.is_multiple() {
            return Ok(self.record(
                property_name,
                Decision::Inapplicable(Inapplicability::MultiplicityMismatch {
                    definition_multiple: true,
                }),
            ));
        }
        if def.protected {
            return Ok(self.record(property_name, Decision::rejected(Rejection::Protected)));
        }

        let compiled = self.compile(property_name, &def)?;
        let decision = match self.check_value(property_name, &def, &compiled, value)? {
            Some(reason) => Decision::rejected(reason),
            None => Decision::Assignable,
        };
        Ok(self.record(property_name, decision))
    }

    /// Detailed array decision.
    pub fn evaluate_property_values(
        &self,
        property_name: &str,
        values: &[Value],
    ) -> CheckResult<Decision> {
        let def = match self.lookup(property_name, Some(true))? {
            Some(def) => def,
            None => {
                return Ok(self.record(
                    property_name,
                    Decision::Inapplicable(Inapplicability::NoDefinition),
                ))
            }
        };

        if !def.is_multiple() {
            return Ok(self.record(
                property_name,
                Decision::Inapplicable(Inapplicability::MultiplicityMismatch {
                    definition_multiple: false,
                }),
            ));
        }
        if def.protected {
            return Ok(self.record(property_name, Decision::rejected(Rejection::Protected)));
        }

        // Compiled before the empty check so a broken schema always surfaces
        let compiled = self.compile(property_name, &def)?;

        if values.is_empty() {
            let decision = if def.allow_empty {
                Decision::Assignable
            } else {
                Decision::rejected(Rejection::EmptyArray)
            };
            return Ok(self.record(property_name, decision));
        }

        for (index, value) in values.iter().enumerate() {
            if let Some(reason) = self.check_value(property_name, &def, &compiled, value)? {
                return Ok(self.record(
                    property_name,
                    Decision::Rejected {
                        reason,
                        index: Some(index),
                    },
                ));
            }
        }

        Ok(self.record(property_name, Decision::Assignable))
    }

    /// Detailed removal decision.
    pub fn evaluate_removal(&self, property_name: &str) -> CheckResult<Decision> {
        let decision = match self.lookup(property_name, None)? {
            None => Decision::Inapplicable(Inapplicability::NoDefinition),
            Some(def) if def.protected => Decision::rejected(Rejection::Protected),
            Some(def) if def.mandatory => Decision::rejected(Rejection::Mandatory),
            Some(_) => Decision::Assignable,
        };
        Ok(self.record(property_name, decision))
    }

    /// `multiple` selects the definition by multiplicity; removal passes `None`.
    fn lookup(
        &self,
        property_name: &str,
        multiple: Option<bool>,
    ) -> CheckResult<Option<PropertyDefinition>> {
        let found = match multiple {
            Some(m) => self
                .source
                .lookup_property_definition_for(&self.node_type, property_name, m),
            None => self
                .source
                .lookup_property_definition(&self.node_type, property_name),
        };
        found.map_err(|e| self.fault(property_name, e))
    }

    fn compile(&self, property_name: &str, def: &PropertyDefinition) -> CheckResult<Vec<ValueConstraint>> {
        compile_constraints(def.declared_type(), def.constraints())
            .map_err(|e| self.fault(property_name, e))
    }

    /// Runs admissibility, conversion and constraints for one value.
    fn check_value(
        &self,
        property_name: &str,
        def: &PropertyDefinition,
        compiled: &[ValueConstraint],
        value: &Value,
    ) -> CheckResult<Option<Rejection>> {
        let from = value.semantic_type();
        let to = def.declared_type();

        if !TypeCoercionMatrix::admissible(from, to) {
            return Ok(Some(Rejection::NotAdmissible { from, to }));
        }

        let converted = match ValueConverter::convert(value, to) {
            Ok(converted) => converted,
            Err(e) => return Ok(Some(Rejection::ConversionFailed(e))),
        };

        let satisfied = ConstraintEvaluator::new(self.source)
            .satisfies_compiled(&converted, compiled)
            .map_err(|e| self.fault(property_name, e))?;

        if satisfied {
            Ok(None)
        } else {
            Ok(Some(Rejection::ConstraintViolated))
        }
    }

    fn record(&self, property_name: &str, decision: Decision) -> Decision {
        let reason = decision.reason();
        let mut fields = vec![("node_type", self.node_type.as_str()), ("property", property_name)];
        if !reason.is_empty() {
            fields.push(("reason", reason));
        }
        Logger::trace(decision.event().as_str(), &fields);
        decision
    }

    fn fault(&self, property_name: &str, err: CheckError) -> CheckError {
        let err = err.with_context(&self.node_type, property_name);
        let event = match err.category() {
            FaultCategory::ConfigurationFault => Event::ConstraintMalformed,
            _ => Event::SchemaLookupFailed,
        };
        Logger::error(
            event.as_str(),
            &[
                ("code", err.code().code()),
                ("message", err.message()),
                ("node_type", self.node_type.as_str()),
                ("property", property_name),
            ],
        );
        err
    }
}
