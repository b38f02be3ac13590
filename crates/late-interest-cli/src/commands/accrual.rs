use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use late_interest_core::accrual::AccrualCalculator;
use late_interest_core::rates::RateResolver;
use late_interest_core::types::{
    AccrualMethod, CompoundingFrequency, EndDateBasis, FundAssumptions, RateBasis, RateChange,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Simple,
    Compound,
}

impl From<MethodArg> for AccrualMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Simple => AccrualMethod::Simple,
            MethodArg::Compound => AccrualMethod::Compound,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl From<FrequencyArg> for CompoundingFrequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Daily => CompoundingFrequency::Daily,
            FrequencyArg::Monthly => CompoundingFrequency::Monthly,
            FrequencyArg::Quarterly => CompoundingFrequency::Quarterly,
            FrequencyArg::SemiAnnual => CompoundingFrequency::SemiAnnual,
            FrequencyArg::Annual => CompoundingFrequency::Annual,
        }
    }
}

/// Arguments for a one-off interest accrual
#[derive(Args)]
pub struct AccrueArgs {
    /// Principal amount
    #[arg(long)]
    pub principal: Decimal,

    /// Accrual start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Accrual end date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Flat annual rate as a percentage (e.g. 9.5)
    #[arg(long)]
    pub flat_rate: Option<Decimal>,

    /// Path to a JSON rate-history file: [{"effective_date", "rate"}, ...]
    #[arg(long, conflicts_with = "flat_rate")]
    pub rate_history: Option<String>,

    /// Spread added to the historical base rate, as a percentage
    #[arg(long, default_value = "0")]
    pub spread: Decimal,

    /// Accrual method
    #[arg(long, value_enum, default_value = "simple")]
    pub method: MethodArg,

    /// Compounding frequency (compound method only; defaults to daily)
    #[arg(long, value_enum)]
    pub frequency: Option<FrequencyArg>,
}

pub fn run_accrue(args: AccrueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = ad_hoc_assumptions(
        args.flat_rate,
        args.rate_history.as_deref(),
        args.spread,
        args.method.into(),
        args.frequency.map(Into::into),
    )?;
    let calculator = AccrualCalculator::new(&assumptions)?;
    let accrual = calculator.accrue(args.principal, args.start, args.end)?;

    Ok(serde_json::json!({
        "principal": args.principal,
        "start": args.start,
        "end": args.end,
        "inclusive_days": (args.end - args.start).num_days() + 1,
        "interest": accrual.interest.round_dp(2),
        "effective_rate": accrual.effective_rate.round_dp(4),
    }))
}

/// Arguments for a point-in-time rate lookup
#[derive(Args)]
pub struct RateAtArgs {
    /// Date to resolve (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Flat annual rate as a percentage
    #[arg(long)]
    pub flat_rate: Option<Decimal>,

    /// Path to a JSON rate-history file
    #[arg(long, conflicts_with = "flat_rate")]
    pub rate_history: Option<String>,

    /// Spread added to the historical base rate, as a percentage
    #[arg(long, default_value = "0")]
    pub spread: Decimal,
}

pub fn run_rate_at(args: RateAtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = ad_hoc_assumptions(
        args.flat_rate,
        args.rate_history.as_deref(),
        args.spread,
        AccrualMethod::Simple,
        None,
    )?;
    let resolver = RateResolver::new(&assumptions)?;
    let rate = resolver.rate_at(args.date);

    Ok(serde_json::json!({
        "date": args.date,
        "rate": rate,
    }))
}

/// Build a minimal assumptions bundle for one-off commands.
fn ad_hoc_assumptions(
    flat_rate: Option<Decimal>,
    rate_history_path: Option<&str>,
    spread: Decimal,
    method: AccrualMethod,
    frequency: Option<CompoundingFrequency>,
) -> Result<FundAssumptions, Box<dyn std::error::Error>> {
    let (rate_basis, rate_history) = match (flat_rate, rate_history_path) {
        (Some(rate), _) => (RateBasis::Flat { rate }, Vec::new()),
        (None, Some(path)) => {
            let history: Vec<RateChange> = input::file::read_json(path)?;
            (RateBasis::History { spread }, history)
        }
        (None, None) => {
            return Err("either --flat-rate or --rate-history is required".into());
        }
    };

    Ok(FundAssumptions {
        fund_name: "ad-hoc".into(),
        method,
        frequency,
        rate_basis,
        rate_history,
        end_date_basis: EndDateBasis::IssueDate,
        mgmt_fee: None,
        calc_rounding: 2,
        sum_rounding: 2,
    })
}
