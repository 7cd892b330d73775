//! Observability
//!
//! Structured JSON logging to stderr, keyed by typed events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. Logging never changes a decision
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use nodetype::observability::{Event, Logger};
//!
//! Logger::trace(Event::CheckRejected.as_str(), &[("property", "test:date")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Verifies no panic
        log_event(Event::CommandStart);
        log_event(Event::CommandComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("schema_dir", "/tmp/schema")]);
    }
}
