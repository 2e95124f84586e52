//! CLI argument definitions using clap
//!
//! Commands:
//! - groupqp check-config --config <path>
//! - groupqp sort-bench --rows <n> [--config <path>] [--run-rows <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// groupqp - query execution runtime for group-clustered storage
#[derive(Parser, Debug)]
#[command(name = "groupqp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./groupqp.json")]
        config: PathBuf,
    },

    /// Sort synthetic rows in memory and externally and compare the results
    SortBench {
        /// Number of rows to generate
        #[arg(long, default_value_t = 100_000)]
        rows: u64,

        /// Path to configuration file (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override sort_run_rows
        #[arg(long)]
        run_rows: Option<usize>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_bench() {
        let cli = Cli::try_parse_from(["groupqp", "sort-bench", "--rows", "500", "--run-rows", "50"])
            .unwrap();
        match cli.command {
            Command::SortBench {
                rows,
                config,
                run_rows,
            } => {
                assert_eq!(rows, 500);
                assert!(config.is_none());
                assert_eq!(run_rows, Some(50));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_config_default_path() {
        let cli = Cli::try_parse_from(["groupqp", "check-config"]).unwrap();
        match cli.command {
            Command::CheckConfig { config } => {
                assert_eq!(config, PathBuf::from("./groupqp.json"))
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
