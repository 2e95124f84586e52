//! CLI for groupqp
//!
//! Provides command-line tooling around the runtime:
//! - check-config: validate and print an execution config
//! - sort-bench: compare the in-memory and external sorters on synthetic rows

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, sort_bench, SortBenchReport};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
