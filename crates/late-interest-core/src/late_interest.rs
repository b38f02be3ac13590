use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::accrual::AccrualCalculator;
use crate::types::{
    CapitalCall, EndDateBasis, FundAssumptions, ManagementFeeTerms, Money, Partner, Rate,
};
use crate::LateInterestResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One capital call's contribution to one LP's obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateInterestLineItem {
    pub call_number: u32,
    pub due_date: NaiveDate,
    pub call_percentage: Rate,
    pub capital_amount: Money,
    pub late_interest: Money,
    pub days_late: i64,
    /// Rate actually applied (weighted average when the period crosses
    /// rate changes); audit display only.
    pub effective_rate: Rate,
}

/// Audit trail for the management-fee carve-out: every intermediate value,
/// captured for downstream display. Part of the contract, not optional
/// instrumentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementFeeAudit {
    pub fee_start_date: NaiveDate,
    pub issue_date: NaiveDate,
    /// Inclusive days between fee start and admission
    pub fee_days: i64,
    pub annual_fee_rate: Rate,
    pub time_weighted_rate: Decimal,
    pub catch_up_ratio: Decimal,
    pub total_late_interest: Money,
    pub fee: Money,
    pub time_weighted_rate_formula: String,
    pub fee_formula: String,
}

/// One admitted LP's full obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLpResult {
    pub partner_name: String,
    pub issue_date: NaiveDate,
    pub commitment: Money,
    pub close_number: u32,
    /// Capital the LP must contribute to catch up on missed calls
    pub total_catch_up: Money,
    pub total_late_interest_due: Money,
    /// Portion of the interest diverted to management fees
    pub mgmt_fee_allocation: Money,
    /// Net amount distributable to existing LPs
    pub lp_allocation: Money,
    pub breakdown: Vec<LateInterestLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgmt_fee_audit: Option<ManagementFeeAudit>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Computes the late-interest obligation of one newly admitted LP across
/// the fund's capital call schedule.
#[derive(Debug, Clone)]
pub struct LateInterestComputer {
    accrual: AccrualCalculator,
    end_date_basis: EndDateBasis,
    mgmt_fee: Option<ManagementFeeTerms>,
    calc_rounding: u32,
    sum_rounding: u32,
}

impl LateInterestComputer {
    pub fn new(assumptions: &FundAssumptions) -> LateInterestResult<Self> {
        Ok(LateInterestComputer {
            accrual: AccrualCalculator::new(assumptions)?,
            end_date_basis: assumptions.end_date_basis,
            mgmt_fee: assumptions.mgmt_fee,
            calc_rounding: assumptions.calc_rounding,
            sum_rounding: assumptions.sum_rounding,
        })
    }

    /// Full obligation for one new LP: every capital call due strictly
    /// before the LP's admission date contributes a line item; calls due on
    /// or after admission incur nothing.
    pub fn compute_for_new_lp(
        &self,
        new_lp: &Partner,
        capital_calls: &[CapitalCall],
    ) -> LateInterestResult<NewLpResult> {
        let mut missed: Vec<&CapitalCall> = capital_calls
            .iter()
            .filter(|call| call.due_date < new_lp.issue_date)
            .collect();
        missed.sort_by_key(|call| call.call_number);

        let mut breakdown = Vec::with_capacity(missed.len());
        let mut total_catch_up = Decimal::ZERO;
        let mut total_late_interest = Decimal::ZERO;

        for call in missed {
            let line = self.line_item_for_call(new_lp, call)?;
            total_catch_up += line.capital_amount;
            total_late_interest += line.late_interest;
            breakdown.push(line);
        }

        let total_catch_up = total_catch_up.round_dp(self.sum_rounding);
        let total_late_interest = total_late_interest.round_dp(self.sum_rounding);

        let (fee, audit) = self.management_fee(new_lp, total_catch_up, total_late_interest);
        let lp_allocation = (total_late_interest - fee).round_dp(self.sum_rounding);

        Ok(NewLpResult {
            partner_name: new_lp.name.clone(),
            issue_date: new_lp.issue_date,
            commitment: new_lp.commitment,
            close_number: new_lp.close_number,
            total_catch_up,
            total_late_interest_due: total_late_interest,
            mgmt_fee_allocation: fee,
            lp_allocation,
            breakdown,
            mgmt_fee_audit: audit,
        })
    }

    /// Convenience over a batch of new LPs admitted at the same close.
    pub fn compute_for_new_lps(
        &self,
        new_lps: &[Partner],
        capital_calls: &[CapitalCall],
    ) -> LateInterestResult<Vec<NewLpResult>> {
        new_lps
            .iter()
            .map(|lp| self.compute_for_new_lp(lp, capital_calls))
            .collect()
    }

    fn line_item_for_call(
        &self,
        new_lp: &Partner,
        call: &CapitalCall,
    ) -> LateInterestResult<LateInterestLineItem> {
        let capital_amount = call.call_amount(new_lp.commitment);

        let end_date = match self.end_date_basis {
            EndDateBasis::IssueDate => new_lp.issue_date,
            // Collapses days late to zero; meaningful only when a separate
            // catch-up due date is layered on by a caller.
            EndDateBasis::DueDate => call.due_date,
        };

        let days_late = (end_date - call.due_date).num_days();
        if days_late <= 0 {
            // Not actually late: capital is still owed, interest is not
            return Ok(LateInterestLineItem {
                call_number: call.call_number,
                due_date: call.due_date,
                call_percentage: call.call_percentage,
                capital_amount: capital_amount.round_dp(self.calc_rounding),
                late_interest: Decimal::ZERO,
                days_late: 0,
                effective_rate: Decimal::ZERO,
            });
        }

        let accrual = self.accrual.accrue(capital_amount, call.due_date, end_date)?;

        Ok(LateInterestLineItem {
            call_number: call.call_number,
            due_date: call.due_date,
            call_percentage: call.call_percentage,
            capital_amount: capital_amount.round_dp(self.calc_rounding),
            late_interest: accrual.interest.round_dp(self.calc_rounding),
            days_late,
            effective_rate: accrual.effective_rate.round_dp(self.calc_rounding),
        })
    }

    /// Management-fee carve-out. Back-solves a fee proportional to how much
    /// of the commitment was late relative to how long the fee would have
    /// accrued, scaled against the interest pool itself:
    ///
    ///   timeWeightedRate = (feeDays / 365) x (annualRate / 100)
    ///   catchUpRatio     = totalCatchUp / commitment
    ///   fee              = (timeWeightedRate / catchUpRatio) x totalInterest
    ///
    /// A non-positive fee day count disables the fee for this LP only.
    fn management_fee(
        &self,
        new_lp: &Partner,
        total_catch_up: Money,
        total_late_interest: Money,
    ) -> (Money, Option<ManagementFeeAudit>) {
        let Some(terms) = self.mgmt_fee else {
            return (Decimal::ZERO, None);
        };
        if total_catch_up <= Decimal::ZERO {
            return (Decimal::ZERO, None);
        }

        let fee_days = (new_lp.issue_date - terms.fee_start_date).num_days() + 1;
        if fee_days <= 0 {
            return (Decimal::ZERO, None);
        }

        let time_weighted_rate =
            Decimal::from(fee_days) / dec!(365) * (terms.annual_rate / dec!(100));
        let catch_up_ratio = total_catch_up / new_lp.commitment;
        let fee = (time_weighted_rate / catch_up_ratio * total_late_interest)
            .round_dp(self.calc_rounding);

        let audit = ManagementFeeAudit {
            fee_start_date: terms.fee_start_date,
            issue_date: new_lp.issue_date,
            fee_days,
            annual_fee_rate: terms.annual_rate,
            time_weighted_rate,
            catch_up_ratio,
            total_late_interest,
            fee,
            time_weighted_rate_formula: format!(
                "({fee_days} / 365) x ({rate}% / 100) = {time_weighted_rate}",
                rate = terms.annual_rate,
            ),
            fee_formula: format!(
                "({time_weighted_rate} / {catch_up_ratio}) x {total_late_interest} = {fee}"
            ),
        };

        (fee, Some(audit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccrualMethod, RateBasis};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_assumptions(rate: Rate) -> FundAssumptions {
        FundAssumptions {
            fund_name: "Test Fund".into(),
            method: AccrualMethod::Simple,
            frequency: None,
            rate_basis: RateBasis::Flat { rate },
            rate_history: vec![],
            end_date_basis: EndDateBasis::IssueDate,
            mgmt_fee: None,
            calc_rounding: 2,
            sum_rounding: 2,
        }
    }

    fn calls() -> Vec<CapitalCall> {
        vec![
            CapitalCall {
                call_number: 1,
                due_date: date(2022, 1, 15),
                call_percentage: dec!(10),
            },
            CapitalCall {
                call_number: 2,
                due_date: date(2022, 4, 20),
                call_percentage: dec!(20),
            },
            CapitalCall {
                call_number: 3,
                due_date: date(2022, 9, 1),
                call_percentage: dec!(15),
            },
        ]
    }

    #[test]
    fn test_calls_on_or_after_admission_excluded() {
        let computer = LateInterestComputer::new(&flat_assumptions(dec!(9.5))).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2022, 4, 20),
            commitment: dec!(1000000),
            close_number: 2,
        };
        let result = computer.compute_for_new_lp(&lp, &calls()).unwrap();
        // Call 2 due exactly on admission day and call 3 after it are excluded
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].call_number, 1);
        assert_eq!(result.total_catch_up, dec!(100000));
    }

    #[test]
    fn test_concrete_single_call_scenario() {
        let computer = LateInterestComputer::new(&flat_assumptions(dec!(9.5))).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2022, 7, 1),
            commitment: dec!(3000000),
            close_number: 2,
        };
        let one_call = vec![CapitalCall {
            call_number: 1,
            due_date: date(2022, 1, 15),
            call_percentage: dec!(10),
        }];
        let result = computer.compute_for_new_lp(&lp, &one_call).unwrap();

        let line = &result.breakdown[0];
        assert_eq!(line.capital_amount, dec!(300000));
        assert_eq!(line.days_late, 167);
        // 168 inclusive days: 300000 x 0.095 x 168/365
        assert_eq!(line.late_interest, dec!(13117.81));
        assert_eq!(line.effective_rate, dec!(9.5));
        assert_eq!(result.total_late_interest_due, dec!(13117.81));
        assert_eq!(result.lp_allocation, dec!(13117.81));
        assert_eq!(result.mgmt_fee_allocation, Decimal::ZERO);
        assert!(result.mgmt_fee_audit.is_none());
    }

    #[test]
    fn test_due_date_basis_yields_zero_interest() {
        let assumptions = FundAssumptions {
            end_date_basis: EndDateBasis::DueDate,
            ..flat_assumptions(dec!(9.5))
        };
        let computer = LateInterestComputer::new(&assumptions).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2023, 1, 1),
            commitment: dec!(1000000),
            close_number: 2,
        };
        let result = computer.compute_for_new_lp(&lp, &calls()).unwrap();
        assert_eq!(result.breakdown.len(), 3);
        for line in &result.breakdown {
            assert_eq!(line.days_late, 0);
            assert_eq!(line.late_interest, Decimal::ZERO);
            assert_eq!(line.effective_rate, Decimal::ZERO);
            // Capital is still owed
            assert!(line.capital_amount > Decimal::ZERO);
        }
        assert_eq!(result.total_late_interest_due, Decimal::ZERO);
        assert_eq!(result.total_catch_up, dec!(450000));
    }

    #[test]
    fn test_historical_golden_dataset() {
        // Reconciled against the fund's historical spreadsheet: $5M
        // commitment admitted 2025-10-31 against six calls at an effective
        // 9.5% (prime 7.5% + 2% spread), simple accrual.
        let assumptions = FundAssumptions {
            rate_basis: RateBasis::History { spread: dec!(2) },
            rate_history: vec![crate::types::RateChange {
                effective_date: date(2020, 1, 1),
                rate: dec!(7.5),
            }],
            ..flat_assumptions(dec!(0))
        };
        let computer = LateInterestComputer::new(&assumptions).unwrap();
        let lp = Partner {
            name: "New LP".into(),
            issue_date: date(2025, 10, 31),
            commitment: dec!(5000000),
            close_number: 2,
        };
        let schedule = vec![
            (1, date(2022, 4, 20), dec!(20)),
            (2, date(2023, 1, 23), dec!(10)),
            (3, date(2023, 7, 11), dec!(3)),
            (4, date(2024, 3, 15), dec!(17)),
            (5, date(2024, 9, 26), dec!(5)),
            (6, date(2025, 3, 13), dec!(15)),
        ]
        .into_iter()
        .map(|(call_number, due_date, call_percentage)| CapitalCall {
            call_number,
            due_date,
            call_percentage,
        })
        .collect::<Vec<_>>();

        let result = computer.compute_for_new_lp(&lp, &schedule).unwrap();

        let expected = [
            dec!(336013.70),
            dec!(131828.77),
            dec!(32950.68),
            dec!(131854.79),
            dec!(26092.47),
            dec!(45482.88),
        ];
        for (line, want) in result.breakdown.iter().zip(expected) {
            assert_eq!(line.late_interest, want, "call {}", line.call_number);
        }
        assert_eq!(result.total_catch_up, dec!(3500000));
        assert_eq!(result.total_late_interest_due, dec!(704223.29));
    }

    #[test]
    fn test_management_fee_carve_out() {
        let assumptions = FundAssumptions {
            mgmt_fee: Some(ManagementFeeTerms {
                annual_rate: dec!(2),
                fee_start_date: date(2022, 1, 1),
            }),
            ..flat_assumptions(dec!(9.5))
        };
        let computer = LateInterestComputer::new(&assumptions).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2022, 7, 1),
            commitment: dec!(3000000),
            close_number: 2,
        };
        let one_call = vec![CapitalCall {
            call_number: 1,
            due_date: date(2022, 1, 15),
            call_percentage: dec!(10),
        }];
        let result = computer.compute_for_new_lp(&lp, &one_call).unwrap();

        // fee_days = (2022-07-01 - 2022-01-01) + 1 = 182
        // timeWeightedRate = 182/365 x 0.02
        // catchUpRatio = 300000 / 3000000 = 0.1
        // fee = (timeWeightedRate / 0.1) x 13117.81
        let twr = Decimal::from(182) / dec!(365) * dec!(0.02);
        let expected_fee = (twr / dec!(0.1) * dec!(13117.81)).round_dp(2);
        assert_eq!(result.mgmt_fee_allocation, expected_fee);
        assert_eq!(
            result.lp_allocation,
            (dec!(13117.81) - expected_fee).round_dp(2)
        );

        let audit = result.mgmt_fee_audit.expect("audit record is part of the contract");
        assert_eq!(audit.fee_days, 182);
        assert_eq!(audit.catch_up_ratio, dec!(0.1));
        assert_eq!(audit.fee, expected_fee);
        assert!(audit.fee_formula.contains(&expected_fee.to_string()));
    }

    #[test]
    fn test_management_fee_disabled_when_fee_starts_after_admission() {
        let assumptions = FundAssumptions {
            mgmt_fee: Some(ManagementFeeTerms {
                annual_rate: dec!(2),
                fee_start_date: date(2023, 1, 1),
            }),
            ..flat_assumptions(dec!(9.5))
        };
        let computer = LateInterestComputer::new(&assumptions).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2022, 7, 1),
            commitment: dec!(3000000),
            close_number: 2,
        };
        let result = computer.compute_for_new_lp(&lp, &calls()[..1].to_vec()).unwrap();
        assert_eq!(result.mgmt_fee_allocation, Decimal::ZERO);
        assert!(result.mgmt_fee_audit.is_none());
        assert_eq!(result.lp_allocation, result.total_late_interest_due);
    }

    #[test]
    fn test_no_missed_calls_means_no_obligation() {
        let computer = LateInterestComputer::new(&flat_assumptions(dec!(9.5))).unwrap();
        let lp = Partner {
            name: "LP A".into(),
            issue_date: date(2022, 1, 1),
            commitment: dec!(1000000),
            close_number: 1,
        };
        let result = computer.compute_for_new_lp(&lp, &calls()).unwrap();
        assert!(result.breakdown.is_empty());
        assert_eq!(result.total_catch_up, Decimal::ZERO);
        assert_eq!(result.total_late_interest_due, Decimal::ZERO);
        assert_eq!(result.lp_allocation, Decimal::ZERO);
    }

    #[test]
    fn test_batch_computation_matches_single() {
        let computer = LateInterestComputer::new(&flat_assumptions(dec!(9.5))).unwrap();
        let lps = vec![
            Partner {
                name: "LP A".into(),
                issue_date: date(2022, 7, 1),
                commitment: dec!(3000000),
                close_number: 2,
            },
            Partner {
                name: "LP B".into(),
                issue_date: date(2022, 7, 1),
                commitment: dec!(1000000),
                close_number: 2,
            },
        ];
        let batch = computer.compute_for_new_lps(&lps, &calls()).unwrap();
        assert_eq!(batch.len(), 2);
        let single = computer.compute_for_new_lp(&lps[1], &calls()).unwrap();
        assert_eq!(batch[1].total_late_interest_due, single.total_late_interest_due);
    }
}
