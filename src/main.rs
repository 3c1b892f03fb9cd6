//! # leadlens command-line front end
//!
//! Loads the two exports, applies the selection given by flags and prints
//! the dashboard tables:
//!
//! ```bash
//! leadlens report --leads hubspot.csv --spend gasto.csv --start 2024-03-01 --end 2024-03-31
//! leadlens report --files exports/hubspot_marco.csv exports/gasto_marco.csv --business-days
//! leadlens export-sends --files hubspot.csv gasto.csv -o sends.csv
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // Reports go to stdout, early failures to stderr

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    // Logging is best effort; the report still runs without a log directory
    if let Err(err) = leadlens::logging::init() {
        eprintln!("leadlens: logging disabled: {err:#}");
    }

    let cli = cli::Cli::parse();
    cli::run_command(cli.command)
}
