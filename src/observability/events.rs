//! Observable events
//!
//! Every log line names exactly one of these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file parsed and validated
    ConfigLoaded,
    /// Configuration rejected (FATAL)
    ConfigInvalid,

    // Schema
    /// Node type definitions loaded from the schema directory
    NodeTypesLoaded,
    /// Node type definition written to the schema directory
    NodeTypeSaved,
    /// Schema directory scaffolded
    SchemaInitialized,
    /// Node type definition failed linting
    NodeTypeLintFailed,

    // Checks
    /// Value may be written
    CheckAssignable,
    /// Value refused by type, conversion, or constraint
    CheckRejected,
    /// No property definition applies
    CheckInapplicable,
    /// Constraint string could not be compiled
    ConstraintMalformed,
    /// Schema source failed to answer
    SchemaLookupFailed,

    // Commands
    /// CLI command started
    CommandStart,
    /// CLI command finished
    CommandComplete,
    /// CLI command failed
    CommandFailed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigInvalid => "CONFIG_INVALID",
            Event::NodeTypesLoaded => "NODETYPES_LOADED",
            Event::NodeTypeSaved => "NODETYPE_SAVED",
            Event::SchemaInitialized => "SCHEMA_INITIALIZED",
            Event::NodeTypeLintFailed => "NODETYPE_LINT_FAILED",
            Event::CheckAssignable => "CHECK_ASSIGNABLE",
            Event::CheckRejected => "CHECK_REJECTED",
            Event::CheckInapplicable => "CHECK_INAPPLICABLE",
            Event::ConstraintMalformed => "CONSTRAINT_MALFORMED",
            Event::SchemaLookupFailed => "SCHEMA_LOOKUP_FAILED",
            Event::CommandStart => "COMMAND_START",
            Event::CommandComplete => "COMMAND_COMPLETE",
            Event::CommandFailed => "COMMAND_FAILED",
        }
    }

    /// Returns true if this event terminates the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ConfigInvalid)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [Event; 14] = [
        Event::ConfigLoaded,
        Event::ConfigInvalid,
        Event::NodeTypesLoaded,
        Event::NodeTypeSaved,
        Event::SchemaInitialized,
        Event::NodeTypeLintFailed,
        Event::CheckAssignable,
        Event::CheckRejected,
        Event::CheckInapplicable,
        Event::ConstraintMalformed,
        Event::SchemaLookupFailed,
        Event::CommandStart,
        Event::CommandComplete,
        Event::CommandFailed,
    ];

    #[test]
    fn test_event_names_unique_and_upper_snake() {
        let names: HashSet<&str> = ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(names.len(), ALL.len());
        for name in names {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::ConfigInvalid.is_fatal());
        assert!(!Event::ConstraintMalformed.is_fatal());
        assert!(!Event::CheckRejected.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::CheckAssignable), "CHECK_ASSIGNABLE");
    }
}
