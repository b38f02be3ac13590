mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::accrual::{AccrueArgs, RateAtArgs};
use commands::engine::CalculateArgs;

/// Late interest calculations for fund subsequent closes
#[derive(Parser)]
#[command(
    name = "licalc",
    version,
    about = "Late interest and pro-rata allocation calculations",
    long_about = "Computes the late interest owed by LPs admitted at subsequent closes \
                  and its pro-rata allocation to existing LPs, with decimal precision. \
                  Supports simple and compound accrual against a flat rate or a \
                  historical base rate plus spread, cascading across any number of closes."
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
    /// Run the full late-interest cascade for a fund
    Calculate(CalculateArgs),
    /// Accrue interest on a principal over a date range
    Accrue(AccrueArgs),
    /// Resolve the interest rate in effect on a date
    RateAt(RateAtArgs),
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
        Commands::Calculate(args) => commands::engine::run_calculate(args),
        Commands::Accrue(args) => commands::accrual::run_accrue(args),
        Commands::RateAt(args) => commands::accrual::run_rate_at(args),
        Commands::Version => {
            println!("licalc {}", env!("CARGO_PKG_VERSION"));
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
