//! Node type error types
//!
//! Error codes:
//! - NODETYPE_CONSTRAINT_MALFORMED (FATAL, configuration fault)
//! - NODETYPE_SCHEMA_MALFORMED (FATAL, configuration fault)
//! - NODETYPE_UNKNOWN_NODE_TYPE (FATAL, collaborator failure)
//! - NODETYPE_BROKEN_HIERARCHY (FATAL, collaborator failure)
//! - NODETYPE_SCHEMA_UNAVAILABLE (FATAL, collaborator failure)
//! - NODETYPE_IMMUTABLE (REJECT)
//!
//! A value that cannot be assigned is never an error here; that outcome is
//! a `false` decision. Errors signal a broken schema or a failing schema
//! source.

use std::fmt;

/// Severity levels for node type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, schema state unchanged
    Reject,
    /// The decision cannot be made at all
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Where a fault originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCategory {
    /// Schema metadata is malformed
    ConfigurationFault,
    /// The schema source itself failed
    CollaboratorFailure,
    /// An ordinary refused registration
    Rejection,
}

/// Node type error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckErrorCode {
    /// Constraint expression cannot be parsed for its declared type
    ConstraintMalformed,
    /// Node type definition file is malformed
    SchemaMalformed,
    /// Node type not known to the schema source
    UnknownNodeType,
    /// Supertype missing or cyclic
    BrokenHierarchy,
    /// Schema source could not be consulted
    SchemaUnavailable,
    /// Attempt to redefine an existing node type
    NodeTypeImmutable,
}

impl CheckErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CheckErrorCode::ConstraintMalformed => "NODETYPE_CONSTRAINT_MALFORMED",
            CheckErrorCode::SchemaMalformed => "NODETYPE_SCHEMA_MALFORMED",
            CheckErrorCode::UnknownNodeType => "NODETYPE_UNKNOWN_NODE_TYPE",
            CheckErrorCode::BrokenHierarchy => "NODETYPE_BROKEN_HIERARCHY",
            CheckErrorCode::SchemaUnavailable => "NODETYPE_SCHEMA_UNAVAILABLE",
            CheckErrorCode::NodeTypeImmutable => "NODETYPE_IMMUTABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            CheckErrorCode::NodeTypeImmutable => Severity::Reject,
            _ => Severity::Fatal,
        }
    }

    /// Returns the fault category
    pub fn category(&self) -> FaultCategory {
        match self {
            CheckErrorCode::ConstraintMalformed | CheckErrorCode::SchemaMalformed => {
                FaultCategory::ConfigurationFault
            }
            CheckErrorCode::UnknownNodeType
            | CheckErrorCode::BrokenHierarchy
            | CheckErrorCode::SchemaUnavailable => FaultCategory::CollaboratorFailure,
            CheckErrorCode::NodeTypeImmutable => FaultCategory::Rejection,
        }
    }
}

impl fmt::Display for CheckErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Node type error with context
#[derive(Debug, Clone)]
pub struct CheckError {
    code: CheckErrorCode,
    message: String,
    node_type: Option<String>,
    property: Option<String>,
}

impl CheckError {
    fn new(code: CheckErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            node_type: None,
            property: None,
        }
    }

    /// Create a malformed constraint error
    pub fn constraint_malformed(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            CheckErrorCode::ConstraintMalformed,
            format!(
                "Malformed value constraint '{}': {}",
                expression.into(),
                reason.into()
            ),
        )
    }

    /// Create an error for a malformed node type file
    pub fn schema_malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            CheckErrorCode::SchemaMalformed,
            format!("Malformed node type file '{}': {}", path.into(), reason.into()),
        )
    }

    /// Create an unknown node type error
    pub fn unknown_node_type(node_type: impl Into<String>) -> Self {
        let nt = node_type.into();
        let mut err = Self::new(
            CheckErrorCode::UnknownNodeType,
            format!("Node type '{}' not found", nt),
        );
        err.node_type = Some(nt);
        err
    }

    /// Create a broken hierarchy error
    pub fn broken_hierarchy(node_type: impl Into<String>, reason: impl Into<String>) -> Self {
        let nt = node_type.into();
        let mut err = Self::new(
            CheckErrorCode::BrokenHierarchy,
            format!("Node type '{}' has a broken supertype chain: {}", nt, reason.into()),
        );
        err.node_type = Some(nt);
        err
    }

    /// Create a schema unavailable error
    pub fn schema_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            CheckErrorCode::SchemaUnavailable,
            format!("Schema source unavailable: {}", reason.into()),
        )
    }

    /// Create a node type immutable error
    pub fn node_type_immutable(node_type: impl Into<String>) -> Self {
        let nt = node_type.into();
        let mut err = Self::new(
            CheckErrorCode::NodeTypeImmutable,
            format!("Node type '{}' is already registered", nt),
        );
        err.node_type = Some(nt);
        err
    }

    /// Attach the node type and property the error arose for.
    pub fn with_context(mut self, node_type: &str, property: &str) -> Self {
        self.node_type.get_or_insert_with(|| node_type.to_string());
        self.property.get_or_insert_with(|| property.to_string());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> CheckErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the fault category
    pub fn category(&self) -> FaultCategory {
        self.code.category()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the node type if applicable
    pub fn node_type(&self) -> Option<&str> {
        self.node_type.as_deref()
    }

    /// Returns the property name if applicable
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        if let (Some(nt), Some(prop)) = (&self.node_type, &self.property) {
            write!(f, " (at {}.{})", nt, prop)?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckError {}

/// Result type for node type operations
pub type CheckResult<T> = Result<T, CheckError>;
