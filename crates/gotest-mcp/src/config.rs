//! Configuration for the gotest-mcp server
//!
//! This module provides the CLI/environment configuration for the MCP
//! server, including logging verbosity and task retention settings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gotest MCP Server - structured go test result analysis for AI tooling
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gotest-mcp")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to MCP server mode)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging (debug level)
    ///
    /// When enabled, logs per-line parser diagnostics and request details.
    /// Logs are written to stderr to avoid interfering with the MCP stdio
    /// transport.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Hours to keep analysis tasks before the periodic cleanup drops them
    #[arg(long, env = "GOTEST_MCP_TASK_RETENTION", default_value = "24")]
    pub task_retention: u32,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a test log once and print the result as JSON
    ///
    /// Reads the file given with --file, or stdin when no file is given.
    /// The format (go test -json event stream or console text) is detected
    /// automatically.
    ///
    /// Example:
    ///   go test -json ./... | gotest-mcp parse
    Parse {
        /// Path to the test log file (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Config {
    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// Task retention as a chrono duration
    #[must_use]
    pub fn task_retention_age(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.task_retention))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.command.is_none());
        assert!(!config.verbose);
        assert!(!config.quiet);
    }

    #[test]
    fn test_log_level_default() {
        let config = Config::default();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_verbose() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_level_quiet() {
        let config = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_task_retention_age() {
        let config = Config {
            task_retention: 48,
            ..Default::default()
        };
        assert_eq!(config.task_retention_age(), chrono::Duration::hours(48));
    }

    #[test]
    fn test_parse_subcommand() {
        let config = Config::parse_from(["gotest-mcp", "parse", "--file", "/tmp/out.log"]);
        match config.command {
            Some(Command::Parse { file }) => {
                assert_eq!(file, Some(PathBuf::from("/tmp/out.log")));
            }
            _ => panic!("expected parse subcommand"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
