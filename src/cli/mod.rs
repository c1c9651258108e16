//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Nimbus using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Nimbus - scheduled Azure inventory exports
#[derive(Parser, Debug)]
#[command(name = "nimbus")]
#[command(version, about, long_about = None)]
#[command(author = "Nimbus Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "nimbus.toml", env = "NIMBUS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "NIMBUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one job once and exit
    Run(commands::run::RunArgs),

    /// Run every enabled job on its interval until interrupted
    Serve(commands::serve::ServeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationStrategy;
    use crate::core::jobs::JobKind;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["nimbus", "run", "disk_inventory"]);
        assert_eq!(cli.config, "nimbus.toml");
        match cli.command {
            Commands::Run(args) => assert_eq!(args.job, JobKind::DiskInventory),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_overrides() {
        let cli = Cli::parse_from([
            "nimbus",
            "run",
            "disk_inventory",
            "--page-size",
            "500",
            "--pagination",
            "continuation_token",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.page_size, Some(500));
                assert_eq!(args.pagination, Some(PaginationStrategy::ContinuationToken));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_unknown_job() {
        assert!(Cli::try_parse_from(["nimbus", "run", "vm_inventory"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["nimbus", "--config", "custom.toml", "serve"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["nimbus", "--log-level", "debug", "serve"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["nimbus", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["nimbus", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
