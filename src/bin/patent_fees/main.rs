//! patentfees - Look up Korean patent renewal fees from the KIPRIS registry.
//!
//! Queries all patents registered to a patent office customer number,
//! calculates the current annuity year, fee, payment deadline and late payment windows,
//! and exports the result as CSV and Excel reports.

mod config;
mod logger;
mod shell;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use patent_fees::patent::CustomerNumber;

use crate::config::Config;
use crate::shell::PatentShell;

/// Look up Korean patent renewal fees from the KIPRIS registry.
///
/// Without customer numbers, starts the interactive menu.
/// With customer numbers, queries each one and exports the last result.
#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Look up Korean patent renewal fees from the KIPRIS registry"
)]
struct PatentFeesArgs {
    /// 12-digit customer numbers to query without the interactive menu
    #[arg(name = "CUSTOMER_NUMBER")]
    customer_numbers: Vec<CustomerNumber>,

    /// Output directory for reports
    #[arg(short = 'o', long, name = "DIR", value_hint = clap::ValueHint::DirPath)]
    output: Option<String>,

    /// Evaluate fee status on the given date instead of today (YYYY-MM-DD)
    #[arg(short = 'd', long, name = "DATE")]
    date: Option<NaiveDate>,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = PatentFeesArgs::parse();
    if let Some(ref shell) = args.completion {
        patent_fees::generate_shell_completion(*shell, PatentFeesArgs::command(), env!("CARGO_BIN_NAME"));
        Ok(())
    } else {
        let config = Config::from_args(args)?;
        PatentShell::new(config)?.run().await;
        Ok(())
    }
}
