use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as percentages (9.5 = 9.5%), matching fund documents.
pub type Rate = Decimal;

/// Interest accrual method for late interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualMethod {
    Simple,
    Compound,
}

/// Compounding frequency when the accrual method is compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingFrequency {
    Daily,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl CompoundingFrequency {
    /// Compounding periods per year (n in P(1 + r/n)^(nt)).
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            CompoundingFrequency::Daily => dec!(365),
            CompoundingFrequency::Monthly => dec!(12),
            CompoundingFrequency::Quarterly => dec!(4),
            CompoundingFrequency::SemiAnnual => dec!(2),
            CompoundingFrequency::Annual => dec!(1),
        }
    }
}

/// Base for the late-interest rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// A constant rate for every date.
    Flat { rate: Rate },
    /// Historical base-rate changes (e.g. prime) plus a spread.
    History { spread: Rate },
}

/// One historical change in a variable base rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub effective_date: NaiveDate,
    /// As a percentage, e.g. 7.25 for 7.25%
    pub rate: Rate,
}

/// Which date ends the late-interest accrual period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDateBasis {
    /// Accrue through the LP's admission (issue) date.
    IssueDate,
    /// Accrue only to the capital call's own due date.
    DueDate,
}

/// Management-fee carve-out parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManagementFeeTerms {
    /// Annual fee rate as a percentage, e.g. 2 for 2%
    pub annual_rate: Rate,
    /// Date the fee would have started accruing for a timely LP
    pub fee_start_date: NaiveDate,
}

/// Fund-level calculation configuration. Created once per run; immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundAssumptions {
    pub fund_name: String,
    pub method: AccrualMethod,
    /// Required only when `method` is compound; daily when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<CompoundingFrequency>,
    pub rate_basis: RateBasis,
    /// Base-rate history; must be non-empty when `rate_basis` is history.
    #[serde(default)]
    pub rate_history: Vec<RateChange>,
    pub end_date_basis: EndDateBasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mgmt_fee: Option<ManagementFeeTerms>,
    /// Decimal places for per-line calculations
    pub calc_rounding: u32,
    /// Decimal places for summed totals
    pub sum_rounding: u32,
}

/// LP/Partner in the fund. The same name may appear at several closes
/// with commitment deltas; each occurrence is an independent ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub name: String,
    /// Admission date into the fund
    pub issue_date: NaiveDate,
    pub commitment: Money,
    pub close_number: u32,
}

/// A capital call, applying uniformly to every partner regardless of close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalCall {
    pub call_number: u32,
    pub due_date: NaiveDate,
    /// As a percentage of commitment, e.g. 20 for 20%
    pub call_percentage: Rate,
}

impl CapitalCall {
    /// Capital owed under this call for a given commitment.
    pub fn call_amount(&self, commitment: Money) -> Money {
        commitment * (self.call_percentage / dec!(100))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
