//! CLI argument definitions using clap
//!
//! Commands:
//! - nodetype init --config <path>
//! - nodetype check --config <path>
//! - nodetype batch --config <path>
//! - nodetype lint --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nodetype - property assignability checks against node type definitions
#[derive(Parser, Debug)]
#[command(name = "nodetype")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./nodetype.json")]
        config: PathBuf,
    },

    /// Check one request read from stdin and exit
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./nodetype.json")]
        config: PathBuf,
    },

    /// Check one request per stdin line until EOF
    Batch {
        /// Path to configuration file
        #[arg(long, default_value = "./nodetype.json")]
        config: PathBuf,
    },

    /// Validate every node type and constraint in the schema directory
    Lint {
        /// Path to configuration file
        #[arg(long, default_value = "./nodetype.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
