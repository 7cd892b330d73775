//! Configuration file
//!
//! ```json
//! { "schema_dir": "./schema", "log_level": "warn" }
//! ```
//!
//! `schema_dir` is required. `log_level` is one of trace, info, warn,
//! error, fatal and defaults to warn.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding node type files (required)
    pub schema_dir: String,

    /// Minimum log severity (optional, default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_dir.trim().is_empty() {
            return Err(CliError::config_error("schema_dir must not be empty"));
        }

        if Severity::from_name(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get schema directory as Path
    pub fn schema_path(&self) -> &Path {
        Path::new(&self.schema_dir)
    }

    /// Minimum log severity
    pub fn log_severity(&self) -> Severity {
        Severity::from_name(&self.log_level).unwrap_or(Severity::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"schema_dir": "/tmp/schema"}"#).unwrap();
        assert_eq!(config.schema_path(), Path::new("/tmp/schema"));
        assert_eq!(config.log_severity(), Severity::Warn);
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let config =
            Config::from_json(r#"{"schema_dir": "s", "log_level": "TRACE"}"#).unwrap();
        assert_eq!(config.log_severity(), Severity::Trace);
    }

    #[test]
    fn test_missing_schema_dir_rejected() {
        let err = Config::from_json(r#"{"log_level": "info"}"#).unwrap_err();
        assert_eq!(err.code_str(), "NODETYPE_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_empty_schema_dir_rejected() {
        assert!(Config::from_json(r#"{"schema_dir": "  "}"#).is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let err = Config::from_json(r#"{"schema_dir": "s", "log_level": "loud"}"#).unwrap_err();
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::from_json(r#"{"schema_dir": "s", "data_dir": "d"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nodetype.json");
        fs::write(&path, r#"{"schema_dir": "./schema", "log_level": "error"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_severity(), Severity::Error);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("absent.json")).unwrap_err();
        assert!(err.message().contains("Failed to read config"));
    }
}
