use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LateInterestError;
use crate::rates::RateResolver;
use crate::types::{AccrualMethod, CompoundingFrequency, FundAssumptions, Money, Rate};
use crate::LateInterestResult;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Interest accrued over a period, with the annualized rate it implies.
/// The effective rate is a derived figure for audit display only; it feeds
/// no further computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accrual {
    pub interest: Money,
    pub effective_rate: Rate,
}

impl Accrual {
    fn zero() -> Self {
        Accrual {
            interest: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
        }
    }
}

/// Computes simple or compound interest over a date range, segmented at any
/// rate changes inside the range.
///
/// Day counting is inclusive: a period's day count is the calendar
/// difference plus one, matching the spreadsheet convention the fund's
/// historical figures were produced under. When the period spans rate
/// changes, only the final segment carries the +1; interior boundaries use
/// the plain calendar difference so no day is counted twice.
#[derive(Debug, Clone)]
pub struct AccrualCalculator {
    method: AccrualMethod,
    frequency: CompoundingFrequency,
    resolver: RateResolver,
}

impl AccrualCalculator {
    /// Build a calculator from fund assumptions. Compound accrual with no
    /// configured frequency defaults to daily compounding.
    pub fn new(assumptions: &FundAssumptions) -> LateInterestResult<Self> {
        Ok(AccrualCalculator {
            method: assumptions.method,
            frequency: assumptions
                .frequency
                .unwrap_or(CompoundingFrequency::Daily),
            resolver: RateResolver::new(assumptions)?,
        })
    }

    /// Accrue interest on `principal` over [start, end] inclusive.
    pub fn accrue(
        &self,
        principal: Money,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LateInterestResult<Accrual> {
        if end < start {
            return Err(LateInterestError::DateError(format!(
                "accrual end date {end} precedes start date {start}"
            )));
        }
        if principal.is_zero() {
            return Ok(Accrual::zero());
        }

        match self.method {
            AccrualMethod::Simple => Ok(self.accrue_simple(principal, start, end)),
            AccrualMethod::Compound => Ok(self.accrue_compound(principal, start, end)),
        }
    }

    fn accrue_simple(&self, principal: Money, start: NaiveDate, end: NaiveDate) -> Accrual {
        let total_days = (end - start).num_days() + 1;
        let changes = self.resolver.changes_within(start, end);

        if changes.is_empty() {
            // Constant rate across the whole period
            let rate = self.resolver.rate_at(start);
            let interest = principal
                * (rate / dec!(100))
                * (Decimal::from(total_days) / DAYS_PER_YEAR);
            return Accrual {
                interest,
                effective_rate: rate,
            };
        }

        let mut total_interest = Decimal::ZERO;
        let mut cursor = start;

        for change in &changes {
            // Interior segment: plain calendar difference, no +1
            let segment_days = (change.effective_date - cursor).num_days();
            if segment_days > 0 {
                let rate = self.resolver.rate_at(cursor);
                total_interest += principal
                    * (rate / dec!(100))
                    * (Decimal::from(segment_days) / DAYS_PER_YEAR);
            }
            cursor = change.effective_date;
        }

        // Final segment carries the inclusive +1
        let final_days = (end - cursor).num_days() + 1;
        if final_days > 0 {
            let rate = self.resolver.rate_at(cursor);
            total_interest += principal
                * (rate / dec!(100))
                * (Decimal::from(final_days) / DAYS_PER_YEAR);
        }

        // Weighted average annual rate across the segments
        let effective_rate = (total_interest / principal)
            * (DAYS_PER_YEAR / Decimal::from(total_days))
            * dec!(100);

        Accrual {
            interest: total_interest,
            effective_rate,
        }
    }

    fn accrue_compound(&self, principal: Money, start: NaiveDate, end: NaiveDate) -> Accrual {
        let total_days = (end - start).num_days() + 1;
        let n = self.frequency.periods_per_year();
        let changes = self.resolver.changes_within(start, end);

        let mut balance = principal;
        let mut cursor = start;

        for change in &changes {
            let segment_days = (change.effective_date - cursor).num_days();
            if segment_days > 0 {
                let rate = self.resolver.rate_at(cursor) / dec!(100);
                let t = Decimal::from(segment_days) / DAYS_PER_YEAR;
                balance *= (Decimal::ONE + rate / n).powd(n * t);
            }
            cursor = change.effective_date;
        }

        let final_days = (end - cursor).num_days() + 1;
        if final_days > 0 {
            let rate = self.resolver.rate_at(cursor) / dec!(100);
            let t = Decimal::from(final_days) / DAYS_PER_YEAR;
            balance *= (Decimal::ONE + rate / n).powd(n * t);
        }

        let interest = balance - principal;

        // Annualized rate implied by the final balance
        let t_total = Decimal::from(total_days) / DAYS_PER_YEAR;
        let effective_rate =
            ((balance / principal).powd(Decimal::ONE / t_total) - Decimal::ONE) * dec!(100);

        Accrual {
            interest,
            effective_rate,
        }
    }
}
