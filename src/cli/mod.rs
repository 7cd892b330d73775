//! CLI module
//!
//! Provides command-line interface for:
//! - init: Create the schema directory
//! - check: One-shot assignability check
//! - batch: Line-delimited assignability checks
//! - lint: Validate node types and constraints

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    batch, check, evaluate_request, init, lint, lint_registry, run, run_command, CheckRequest,
    LintFault,
};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_requests, write_error, write_response};
