use chrono::NaiveDate;

use crate::error::LateInterestError;
use crate::types::{FundAssumptions, Rate, RateBasis, RateChange};
use crate::LateInterestResult;

/// Resolves the interest rate in effect at any point in time, from either a
/// flat configured rate or a base-rate history plus spread.
#[derive(Debug, Clone)]
pub struct RateResolver {
    mode: ResolverMode,
}

#[derive(Debug, Clone)]
enum ResolverMode {
    Flat { rate: Rate },
    /// Changes sorted descending by effective date.
    History { changes: Vec<RateChange>, spread: Rate },
}

impl RateResolver {
    /// Build a resolver from fund assumptions. History mode with no rate
    /// history is a configuration error and fails before any computation.
    pub fn new(assumptions: &FundAssumptions) -> LateInterestResult<Self> {
        match assumptions.rate_basis {
            RateBasis::Flat { rate } => Ok(RateResolver {
                mode: ResolverMode::Flat { rate },
            }),
            RateBasis::History { spread } => {
                if assumptions.rate_history.is_empty() {
                    return Err(LateInterestError::InsufficientData(format!(
                        "fund '{}' uses a historical rate basis but no rate history was supplied",
                        assumptions.fund_name
                    )));
                }
                let mut changes = assumptions.rate_history.clone();
                changes.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
                Ok(RateResolver {
                    mode: ResolverMode::History { changes, spread },
                })
            }
        }
    }

    /// Rate in effect on `date`, as a percentage. In history mode this is the
    /// most recent change on or before `date` plus the spread; dates before
    /// every recorded change resolve to the oldest record's rate plus spread.
    pub fn rate_at(&self, date: NaiveDate) -> Rate {
        match &self.mode {
            ResolverMode::Flat { rate } => *rate,
            ResolverMode::History { changes, spread } => {
                for change in changes {
                    if date >= change.effective_date {
                        return change.rate + spread;
                    }
                }
                // Constructor guarantees at least one record.
                changes[changes.len() - 1].rate + spread
            }
        }
    }

    /// Rate changes strictly inside the half-open interval (start, end],
    /// ascending by effective date. These are the segmentation points for
    /// accrual over [start, end]. Always empty in flat mode.
    pub fn changes_within(&self, start: NaiveDate, end: NaiveDate) -> Vec<RateChange> {
        match &self.mode {
            ResolverMode::Flat { .. } => Vec::new(),
            ResolverMode::History { changes, .. } => {
                let mut within: Vec<RateChange> = changes
                    .iter()
                    .filter(|rc| start < rc.effective_date && rc.effective_date <= end)
                    .copied()
                    .collect();
                within.sort_by_key(|rc| rc.effective_date);
                within
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccrualMethod, EndDateBasis};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history_assumptions(history: Vec<RateChange>, spread: Rate) -> FundAssumptions {
        FundAssumptions {
            fund_name: "Test Fund".into(),
            method: AccrualMethod::Simple,
            frequency: None,
            rate_basis: RateBasis::History { spread },
            rate_history: history,
            end_date_basis: EndDateBasis::IssueDate,
            mgmt_fee: None,
            calc_rounding: 2,
            sum_rounding: 2,
        }
    }

    #[test]
    fn test_flat_rate_is_constant() {
        let mut assumptions = history_assumptions(vec![], dec!(0));
        assumptions.rate_basis = RateBasis::Flat { rate: dec!(9.5) };
        let resolver = RateResolver::new(&assumptions).unwrap();
        assert_eq!(resolver.rate_at(date(2020, 1, 1)), dec!(9.5));
        assert_eq!(resolver.rate_at(date(2030, 12, 31)), dec!(9.5));
    }

    #[test]
    fn test_history_picks_most_recent_change() {
        let assumptions = history_assumptions(
            vec![
                RateChange {
                    effective_date: date(2022, 1, 1),
                    rate: dec!(7.0),
                },
                RateChange {
                    effective_date: date(2022, 6, 1),
                    rate: dec!(7.75),
                },
            ],
            dec!(2),
        );
        let resolver = RateResolver::new(&assumptions).unwrap();
        assert_eq!(resolver.rate_at(date(2022, 3, 1)), dec!(9.0));
        // Boundary: the change date itself uses the new rate
        assert_eq!(resolver.rate_at(date(2022, 6, 1)), dec!(9.75));
        assert_eq!(resolver.rate_at(date(2023, 1, 1)), dec!(9.75));
    }

    #[test]
    fn test_date_before_all_history_uses_oldest() {
        let assumptions = history_assumptions(
            vec![RateChange {
                effective_date: date(2022, 1, 1),
                rate: dec!(7.0),
            }],
            dec!(2),
        );
        let resolver = RateResolver::new(&assumptions).unwrap();
        assert_eq!(resolver.rate_at(date(2019, 1, 1)), dec!(9.0));
    }

    #[test]
    fn test_empty_history_fails_fast() {
        let assumptions = history_assumptions(vec![], dec!(2));
        let result = RateResolver::new(&assumptions);
        assert!(matches!(
            result,
            Err(LateInterestError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_changes_within_half_open_interval() {
        let assumptions = history_assumptions(
            vec![
                RateChange {
                    effective_date: date(2022, 1, 1),
                    rate: dec!(7.0),
                },
                RateChange {
                    effective_date: date(2022, 6, 1),
                    rate: dec!(7.75),
                },
                RateChange {
                    effective_date: date(2022, 9, 1),
                    rate: dec!(8.5),
                },
            ],
            dec!(0),
        );
        let resolver = RateResolver::new(&assumptions).unwrap();

        // A change exactly at start is excluded; one exactly at end included.
        let within = resolver.changes_within(date(2022, 6, 1), date(2022, 9, 1));
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].effective_date, date(2022, 9, 1));

        // Ascending order across multiple changes
        let within = resolver.changes_within(date(2021, 12, 31), date(2022, 12, 31));
        assert_eq!(within.len(), 3);
        assert!(within[0].effective_date < within[1].effective_date);
        assert!(within[1].effective_date < within[2].effective_date);
    }
}
