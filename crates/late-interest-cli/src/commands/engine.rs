use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use late_interest_core::engine::{run_engine, EngineInput};

use crate::input;

/// Arguments for the full cascade calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to a JSON engine-input file (assumptions, partners, capital
    /// calls); JSON can also be piped via stdin
    #[arg(long)]
    pub input: Option<String>,

    /// Override the report's calculation date (YYYY-MM-DD)
    #[arg(long)]
    pub calculation_date: Option<NaiveDate>,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut engine_input: EngineInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or piped stdin required for calculate".into());
    };

    if let Some(date) = args.calculation_date {
        engine_input.calculation_date = Some(date);
    }

    let result = run_engine(&engine_input)?;
    Ok(serde_json::to_value(result)?)
}
