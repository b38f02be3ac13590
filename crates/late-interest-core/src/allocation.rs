use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LateInterestError;
use crate::types::{FundAssumptions, Money, Partner, Rate};
use crate::LateInterestResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One existing partner's share of one admitting close's distributable pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseAllocation {
    pub partner_name: String,
    pub commitment: Money,
    /// The partner's own close, not the admitting close
    pub close_number: u32,
    /// Fraction of the pool (commitment / total existing commitment)
    pub pro_rata_share: Rate,
    pub allocation: Money,
}

/// One (partner, own close) ledger row aggregated across every admitting
/// close processed. A partner who increased their commitment holds one row
/// per close, each accruing allocations independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingLpAllocation {
    pub partner_name: String,
    pub commitment: Money,
    pub close_number: u32,
    pub total_allocation: Money,
    /// Admitting close number -> amount received from that close's pool
    pub allocation_by_admitting_close: BTreeMap<u32, Money>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Distributes an admitting close's net interest pool to previously admitted
/// partners pro-rata by commitment, and aggregates per-partner allocations
/// across closes.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    calc_rounding: u32,
    sum_rounding: u32,
}

impl AllocationEngine {
    pub fn new(assumptions: &FundAssumptions) -> Self {
        AllocationEngine {
            calc_rounding: assumptions.calc_rounding,
            sum_rounding: assumptions.sum_rounding,
        }
    }

    /// Allocate `pool` across every partner record whose own close number is
    /// below `admitting_close`. Partner records are taken by identity, never
    /// deduplicated by name: a partner present at closes 1 and 2 receives
    /// through both records.
    ///
    /// Per-row amounts are rounded at the calculation precision, so the
    /// returned total can differ from the pool within rounding tolerance;
    /// that discrepancy is expected and never corrected by a plug row.
    pub fn allocate(
        &self,
        pool: Money,
        all_partners: &[Partner],
        admitting_close: u32,
    ) -> LateInterestResult<(Vec<CloseAllocation>, Money)> {
        let existing: Vec<&Partner> = all_partners
            .iter()
            .filter(|p| p.close_number < admitting_close)
            .collect();

        if existing.is_empty() || pool.is_zero() {
            return Ok((Vec::new(), Decimal::ZERO));
        }

        let total_commitment: Money = existing.iter().map(|p| p.commitment).sum();
        if total_commitment.is_zero() {
            return Err(LateInterestError::DivisionByZero {
                context: format!(
                    "total existing commitment for admitting close {admitting_close}"
                ),
            });
        }

        let mut rows = Vec::with_capacity(existing.len());
        let mut total_allocated = Decimal::ZERO;

        for partner in existing {
            let pro_rata_share = partner.commitment / total_commitment;
            let allocation = (pool * pro_rata_share).round_dp(self.calc_rounding);
            total_allocated += allocation;

            rows.push(CloseAllocation {
                partner_name: partner.name.clone(),
                commitment: partner.commitment,
                close_number: partner.close_number,
                pro_rata_share,
                allocation,
            });
        }

        Ok((rows, total_allocated.round_dp(self.sum_rounding)))
    }

    /// Merge per-close allocations into one row per (partner name, own close
    /// number), each carrying a per-admitting-close breakdown and a running
    /// total re-rounded at the sum precision after each addition. Rows come
    /// back ordered by partner name, then own close number ascending.
    pub fn aggregate(
        &self,
        allocations_by_close: &[(u32, Vec<CloseAllocation>)],
    ) -> Vec<ExistingLpAllocation> {
        let mut merged: BTreeMap<(String, u32), ExistingLpAllocation> = BTreeMap::new();

        for (admitting_close, rows) in allocations_by_close {
            for row in rows {
                let entry = merged
                    .entry((row.partner_name.clone(), row.close_number))
                    .or_insert_with(|| ExistingLpAllocation {
                        partner_name: row.partner_name.clone(),
                        commitment: row.commitment,
                        close_number: row.close_number,
                        total_allocation: Decimal::ZERO,
                        allocation_by_admitting_close: BTreeMap::new(),
                    });
                entry.total_allocation =
                    (entry.total_allocation + row.allocation).round_dp(self.sum_rounding);
                entry
                    .allocation_by_admitting_close
                    .insert(*admitting_close, row.allocation);
            }
        }

        merged.into_values().collect()
    }
}
