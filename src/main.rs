//! groupqp CLI entry point
//!
//! Parses arguments, dispatches to `cli`, reports failures as a JSON error
//! object and exits non-zero.

use groupqp::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
