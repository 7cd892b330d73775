//! CLI command implementations
//!
//! Every command loads the configuration first, then the schema directory,
//! and only then reads stdin. Responses go to stdout, logs to stderr.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::nodetype::{
    compile_constraints, Decision, NodeTypeRegistry, PropertyAssignabilityChecker, SchemaSource,
};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::value::Value;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_request, read_requests, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let (name, result) = match cmd {
        Command::Init { config } => ("init", init(&config)),
        Command::Check { config } => ("check", check(&config)),
        Command::Batch { config } => ("batch", batch(&config)),
        Command::Lint { config } => ("lint", lint(&config)),
    };
    match &result {
        Ok(()) => log_event_with_fields(Event::CommandComplete, &[("command", name)]),
        Err(e) => Logger::error(
            Event::CommandFailed.as_str(),
            &[("code", e.code_str()), ("command", name), ("message", e.message())],
        ),
    }
    result
}

/// One assignability request.
///
/// Exactly one of `value`, `values` or `remove` selects the check.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRequest {
    pub node_type: String,
    pub property: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    #[serde(default)]
    pub remove: bool,
}

/// A schema problem found by `lint`.
#[derive(Debug, Clone, PartialEq)]
pub struct LintFault {
    pub node_type: String,
    pub property: Option<String>,
    pub code: &'static str,
    pub message: String,
}

impl LintFault {
    fn to_json(&self) -> JsonValue {
        json!({
            "node_type": self.node_type,
            "property": self.property,
            "code": self.code,
            "message": self.message,
        })
    }
}

/// Create the schema directory
///
/// Fails if the directory already holds node type files.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let schema_dir = config.schema_path();

    if holds_node_types(schema_dir)? {
        return Err(CliError::already_initialized(&config.schema_dir));
    }

    fs::create_dir_all(schema_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", schema_dir, e))
    })?;
    log_event_with_fields(Event::SchemaInitialized, &[("schema_dir", config.schema_dir.as_str())]);

    write_response(json!({"initialized": true, "schema_dir": config.schema_dir}))
}

/// Check a single request from stdin
pub fn check(config_path: &Path) -> CliResult<()> {
    let registry = boot(config_path)?;
    let request = read_request()?;

    match evaluate_request(&registry, request) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Check one request per stdin line
///
/// A failing request produces an error line; processing continues.
pub fn batch(config_path: &Path) -> CliResult<()> {
    let registry = boot(config_path)?;

    for request in read_requests() {
        let outcome = match request {
            Ok(request) => evaluate_request(&registry, request),
            Err(e) if e.code() == &CliErrorCode::IoError => return Err(e),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(data) => write_response(data)?,
            Err(e) => write_error(e.code_str(), e.message())?,
        }
    }

    Ok(())
}

/// Validate every node type and constraint in the schema directory
pub fn lint(config_path: &Path) -> CliResult<()> {
    let registry = boot(config_path)?;
    let faults = lint_registry(&registry);

    for fault in &faults {
        Logger::warn(
            Event::NodeTypeLintFailed.as_str(),
            &[
                ("code", fault.code),
                ("node_type", fault.node_type.as_str()),
                ("property", fault.property.as_deref().unwrap_or("")),
            ],
        );
    }

    write_response(json!({
        "node_types": registry.node_type_count(),
        "clean": faults.is_empty(),
        "faults": faults.iter().map(LintFault::to_json).collect::<Vec<_>>(),
    }))?;

    if faults.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(
            CliErrorCode::SchemaError,
            format!("{} schema fault(s) found", faults.len()),
        ))
    }
}

/// Evaluates one JSON request against `source`.
pub fn evaluate_request<S: SchemaSource + ?Sized>(
    source: &S,
    request: JsonValue,
) -> CliResult<JsonValue> {
    let request: CheckRequest = serde_json::from_value(request)?;
    let checker = PropertyAssignabilityChecker::new(source, request.node_type.as_str());

    let decision = match (request.value, request.values, request.remove) {
        (Some(value), None, false) => checker.evaluate_property(&request.property, &value)?,
        (None, Some(values), false) => {
            checker.evaluate_property_values(&request.property, &values)?
        }
        (None, None, true) => checker.evaluate_removal(&request.property)?,
        _ => {
            return Err(CliError::invalid_request(
                "Request must carry exactly one of 'value', 'values' or 'remove'",
            ))
        }
    };

    Ok(decision_json(&decision))
}

fn decision_json(decision: &Decision) -> JsonValue {
    let (kind, index) = match decision {
        Decision::Assignable => ("assignable", None),
        Decision::Rejected { index, .. } => ("rejected", *index),
        Decision::Inapplicable(_) => ("inapplicable", None),
    };
    let reason = Some(decision.reason()).filter(|r| !r.is_empty());
    json!({
        "assignable": decision.is_assignable(),
        "decision": kind,
        "reason": reason,
        "index": index,
        "detail": decision.to_string(),
    })
}

/// Collects hierarchy and constraint faults for every registered node type.
///
/// Faults are ordered by node type name, then declaration order.
pub fn lint_registry(registry: &NodeTypeRegistry) -> Vec<LintFault> {
    let mut node_types: Vec<_> = registry.all_node_types().collect();
    node_types.sort_by(|a, b| a.name.cmp(&b.name));

    let mut faults = Vec::new();
    for node_type in node_types {
        if let Err(e) = registry.effective_node_types(&node_type.name) {
            faults.push(LintFault {
                node_type: node_type.name.clone(),
                property: None,
                code: e.code().code(),
                message: e.message().to_string(),
            });
        }
        for def in &node_type.property_definitions {
            if let Err(e) = compile_constraints(def.declared_type(), def.constraints()) {
                faults.push(LintFault {
                    node_type: node_type.name.clone(),
                    property: Some(def.name.clone()),
                    code: e.code().code(),
                    message: e.message().to_string(),
                });
            }
        }
    }
    faults
}

/// Loads configuration, applies the log level and loads the schema directory.
fn boot(config_path: &Path) -> CliResult<NodeTypeRegistry> {
    let config = load_config(config_path)?;

    let mut registry = NodeTypeRegistry::with_dir(config.schema_path());
    let loaded = registry.load_all()?.to_string();
    log_event_with_fields(
        Event::NodeTypesLoaded,
        &[("count", loaded.as_str()), ("schema_dir", config.schema_dir.as_str())],
    );

    Ok(registry)
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let path = config_path.display().to_string();
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            Logger::fatal(
                Event::ConfigInvalid.as_str(),
                &[("message", e.message()), ("path", path.as_str())],
            );
            return Err(e);
        }
    };
    Logger::set_min_severity(config.log_severity());
    log_event_with_fields(Event::CommandStart, &[("config", path.as_str())]);
    log_event_with_fields(Event::ConfigLoaded, &[("schema_dir", config.schema_dir.as_str())]);
    Ok(config)
}

fn holds_node_types(schema_dir: &Path) -> CliResult<bool> {
    if !schema_dir.exists() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(schema_dir)?;
    entries.try_fold(false, |found, entry| {
        let path = entry?.path();
        Ok(found || path.extension().map_or(false, |ext| ext == "json"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetype::{NodeTypeDefinition, PropertyDefinition};
    use crate::value::SemanticType;
    use tempfile::TempDir;

    fn registry() -> NodeTypeRegistry {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeDefinition::new(
                "test:dates",
                vec![
                    PropertyDefinition::single("test:date", SemanticType::Date),
                    PropertyDefinition::multiple("test:dates", SemanticType::Date),
                    PropertyDefinition::single("test:created", SemanticType::Date).mandatory(),
                    PropertyDefinition::single("test:bounded", SemanticType::Date)
                        .with_constraints(["[2020-01-01T00:00:00.000Z, 2023-01-01T00:00:00.000Z]"]),
                ],
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_evaluate_single_value() {
        let data = evaluate_request(
            &registry(),
            json!({
                "node_type": "test:dates",
                "property": "test:date",
                "value": {"type": "string", "value": "2024-01-01T00:00:00.000Z"}
            }),
        )
        .unwrap();
        assert_eq!(data["assignable"], true);
        assert_eq!(data["decision"], "assignable");
        assert!(data["reason"].is_null());
    }

    #[test]
    fn test_evaluate_array_reports_failing_index() {
        let data = evaluate_request(
            &registry(),
            json!({
                "node_type": "test:dates",
                "property": "test:dates",
                "values": [
                    {"type": "long", "value": 1700000000000i64},
                    {"type": "string", "value": "not-a-date"}
                ]
            }),
        )
        .unwrap();
        assert_eq!(data["assignable"], false);
        assert_eq!(data["reason"], "conversion_failed");
        assert_eq!(data["index"], 1);
    }

    #[test]
    fn test_evaluate_constraint_violation() {
        let data = evaluate_request(
            &registry(),
            json!({
                "node_type": "test:dates",
                "property": "test:bounded",
                "value": {"type": "string", "value": "2024-06-01T00:00:00.000Z"}
            }),
        )
        .unwrap();
        assert_eq!(data["reason"], "constraint_violated");
    }

    #[test]
    fn test_evaluate_removal_of_mandatory() {
        let data = evaluate_request(
            &registry(),
            json!({"node_type": "test:dates", "property": "test:created", "remove": true}),
        )
        .unwrap();
        assert_eq!(data["assignable"], false);
        assert_eq!(data["reason"], "mandatory");
    }

    #[test]
    fn test_evaluate_inapplicable() {
        let data = evaluate_request(
            &registry(),
            json!({
                "node_type": "test:dates",
                "property": "test:other",
                "value": {"type": "boolean", "value": true}
            }),
        )
        .unwrap();
        assert_eq!(data["decision"], "inapplicable");
        assert_eq!(data["reason"], "no_definition");
    }

    #[test]
    fn test_request_needs_exactly_one_selector() {
        let err = evaluate_request(
            &registry(),
            json!({
                "node_type": "test:dates",
                "property": "test:date",
                "value": {"type": "long", "value": 1},
                "remove": true
            }),
        )
        .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidRequest);
    }

    #[test]
    fn test_unknown_node_type_is_schema_error() {
        let err = evaluate_request(
            &registry(),
            json!({"node_type": "test:missing", "property": "p", "remove": true}),
        )
        .unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
    }

    #[test]
    fn test_lint_reports_bad_constraint_and_hierarchy() {
        let mut registry = NodeTypeRegistry::new();
        registry
            .register(NodeTypeDefinition::new(
                "test:broken",
                vec![PropertyDefinition::single("test:when", SemanticType::Date)
                    .with_constraints(["[2024-13-01T00:00:00.000Z,]"])],
            ))
            .unwrap();
        registry
            .register(
                NodeTypeDefinition::new("test:orphan", vec![]).with_supertypes(["test:absent"]),
            )
            .unwrap();

        let faults = lint_registry(&registry);
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].node_type, "test:broken");
        assert_eq!(faults[0].code, "NODETYPE_CONSTRAINT_MALFORMED");
        assert_eq!(faults[0].property.as_deref(), Some("test:when"));
        assert_eq!(faults[1].code, "NODETYPE_BROKEN_HIERARCHY");
    }

    #[test]
    fn test_lint_clean_registry() {
        assert!(lint_registry(&registry()).is_empty());
    }

    #[test]
    fn test_holds_node_types() {
        let temp = TempDir::new().unwrap();
        assert!(!holds_node_types(&temp.path().join("absent")).unwrap());
        assert!(!holds_node_types(temp.path()).unwrap());
        fs::write(temp.path().join("nodetype_test_a.json"), "{}").unwrap();
        assert!(holds_node_types(temp.path()).unwrap());
    }
}
