use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::{AllocationEngine, CloseAllocation, ExistingLpAllocation};
use crate::error::LateInterestError;
use crate::late_interest::{LateInterestComputer, NewLpResult};
use crate::types::{CapitalCall, ComputationOutput, FundAssumptions, Money, Partner, with_metadata};
use crate::LateInterestResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Complete input for an engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInput {
    pub assumptions: FundAssumptions,
    /// Need not be pre-sorted; the engine sorts by close number.
    pub partners: Vec<Partner>,
    pub capital_calls: Vec<CapitalCall>,
    /// Report stamp; today when absent. Tests pass a fixed date so reruns
    /// are byte-identical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_date: Option<NaiveDate>,
}

/// Per-close reconciliation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSummary {
    pub close_number: u32,
    pub new_lps_count: usize,
    pub existing_lps_count: usize,
    pub total_collected: Money,
    pub total_allocated: Money,
    /// Collected minus allocated: rounding residue plus any fee carve-out.
    pub difference: Money,
}

/// Full report of a calculation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub fund_name: String,
    pub calculation_date: NaiveDate,
    pub total_late_interest_collected: Money,
    pub total_late_interest_allocated: Money,
    pub total_mgmt_fee_allocation: Money,
    pub new_lps: Vec<NewLpResult>,
    pub existing_lps: Vec<ExistingLpAllocation>,
    pub summary_by_close: Vec<CloseSummary>,
    /// Echo of the assumptions the run used
    pub settings: FundAssumptions,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Run the full late-interest cascade: walk the distinct closes in ascending
/// order (the first close is the baseline and neither pays nor receives),
/// compute each newly admitted LP's obligation, and distribute each close's
/// net pool across every partner admitted earlier.
///
/// One run is one pure computation; the cascade is strictly forward, so no
/// close's processing depends on a later close's output.
pub fn run_engine(input: &EngineInput) -> LateInterestResult<ComputationOutput<EngineReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let computer = LateInterestComputer::new(&input.assumptions)?;
    let allocator = AllocationEngine::new(&input.assumptions);

    let mut partners = input.partners.clone();
    partners.sort_by_key(|p| p.close_number);

    let mut closes: Vec<u32> = partners.iter().map(|p| p.close_number).collect();
    closes.dedup();

    let mut new_lps: Vec<NewLpResult> = Vec::new();
    let mut allocations_by_close: Vec<(u32, Vec<CloseAllocation>)> = Vec::new();
    let mut summary_by_close: Vec<CloseSummary> = Vec::new();
    let mut grand_collected = Decimal::ZERO;
    let mut grand_allocated = Decimal::ZERO;
    let mut grand_fee = Decimal::ZERO;

    // First (lowest) close is skipped: it is the baseline.
    for &close in closes.iter().skip(1) {
        let admitted: Vec<&Partner> =
            partners.iter().filter(|p| p.close_number == close).collect();
        let existing_count = partners.iter().filter(|p| p.close_number < close).count();

        let mut collected = Decimal::ZERO;
        let mut pool = Decimal::ZERO;

        for lp in &admitted {
            let result = computer.compute_for_new_lp(lp, &input.capital_calls)?;

            if result.lp_allocation < Decimal::ZERO {
                return Err(LateInterestError::InvalidInput {
                    field: "mgmt_fee".into(),
                    reason: format!(
                        "management fee {} exceeds late interest {} for partner '{}' at close {}",
                        result.mgmt_fee_allocation,
                        result.total_late_interest_due,
                        result.partner_name,
                        close,
                    ),
                });
            }

            collected += result.total_late_interest_due;
            grand_fee += result.mgmt_fee_allocation;
            pool += result.lp_allocation;
            new_lps.push(result);
        }

        let (rows, allocated) = allocator.allocate(pool, &partners, close)?;
        if !pool.is_zero() && rows.is_empty() {
            warnings.push(format!(
                "close {close}: pool of {pool} had no existing partners to receive it"
            ));
        }

        grand_collected += collected;
        grand_allocated += allocated;

        summary_by_close.push(CloseSummary {
            close_number: close,
            new_lps_count: admitted.len(),
            existing_lps_count: existing_count,
            total_collected: collected,
            total_allocated: allocated,
            difference: collected - allocated,
        });
        allocations_by_close.push((close, rows));
    }

    let existing_lps = allocator.aggregate(&allocations_by_close);

    let calculation_date = input
        .calculation_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let report = EngineReport {
        fund_name: input.assumptions.fund_name.clone(),
        calculation_date,
        total_late_interest_collected: grand_collected,
        total_late_interest_allocated: grand_allocated,
        total_mgmt_fee_allocation: grand_fee,
        new_lps,
        existing_lps,
        summary_by_close,
        settings: input.assumptions.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Late Interest Cascade (subsequent closes)",
        &serde_json::json!({
            "fund_name": input.assumptions.fund_name,
            "num_partners": input.partners.len(),
            "num_capital_calls": input.capital_calls.len(),
            "num_closes": closes.len(),
        }),
        warnings,
        elapsed,
        report,
    ))
}
