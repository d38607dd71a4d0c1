use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use quicklook_core::underwriting::{self, DealInput};

use crate::input;

/// Arguments for deal underwriting
#[derive(Args)]
pub struct UnderwriteArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Anchor date for the projection window (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_underwrite(args: UnderwriteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = read_deal(&args.input)?;
    let result = match args.as_of {
        Some(as_of) => underwriting::underwrite_as_of(&deal, as_of)?,
        None => underwriting::underwrite(&deal)?,
    };
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the monthly cash-flow projection
#[derive(Args)]
pub struct CashflowArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Anchor date for the projection window (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_cashflow(args: CashflowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = read_deal(&args.input)?;
    let result = match args.as_of {
        Some(as_of) => underwriting::project_deal_as_of(&deal, as_of)?,
        None => underwriting::project_deal(&deal)?,
    };
    Ok(serde_json::to_value(result)?)
}

/// Arguments for schedule derivation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = read_deal(&args.input)?;
    let schedule = underwriting::derive_schedule(&deal)?;
    Ok(serde_json::to_value(schedule)?)
}

/// Resolve the deal from a file argument or piped stdin.
fn read_deal(path: &Option<String>) -> Result<DealInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <file.json> or piped stdin required".into())
    }
}
