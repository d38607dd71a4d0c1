mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::underwrite::{CashflowArgs, ScheduleArgs, UnderwriteArgs};

/// Quick-look underwriting for development deals
#[derive(Parser)]
#[command(
    name = "qlk",
    version,
    about = "Quick-look underwriting for development deals",
    long_about = "A CLI for quick-look development underwriting with decimal precision. \
                  Projects monthly unlevered cash flows from a handful of deal inputs \
                  and reports IRR, equity multiple, and yield on cost."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Underwrite a deal and report its return metrics
    Underwrite(UnderwriteArgs),
    /// Print the full monthly cash-flow projection
    Cashflow(CashflowArgs),
    /// Derive the development schedule from the deal dates
    Schedule(ScheduleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Underwrite(args) => commands::underwrite::run_underwrite(args),
        Commands::Cashflow(args) => commands::underwrite::run_cashflow(args),
        Commands::Schedule(args) => commands::underwrite::run_schedule(args),
        Commands::Version => {
            println!("qlk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
