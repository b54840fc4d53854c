//! Budget hierarchy: AIP -> Project -> {Expense, Milestone}, plus the
//! transaction ledger that expenses can be linked to.

pub mod aip;
pub mod expenses;
pub mod milestones;
pub mod projects;
pub mod transactions;

use serde::Serialize;

/// Share of `total_cost` consumed by `total_expenses`, as a whole percent
/// clamped to `0..=100`. A project with no cost reports 0.
pub fn budget_utilization(total_expenses: f64, total_cost: f64) -> u32 {
    if total_cost <= 0.0 || !total_cost.is_finite() {
        return 0;
    }
    let percent = (total_expenses / total_cost * 100.0).round();
    if percent.is_nan() || percent <= 0.0 {
        0
    } else {
        percent.min(100.0) as u32
    }
}

/// Spending position of a single project
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_cost: f64,
    pub total_expenses: f64,
    pub remaining: f64,
    pub utilization: u32,
    pub over_budget: bool,
}

impl BudgetSummary {
    pub fn new(total_cost: f64, total_expenses: f64) -> Self {
        Self {
            total_cost,
            total_expenses,
            remaining: total_cost - total_expenses,
            utilization: budget_utilization(total_expenses, total_cost),
            over_budget: total_expenses > total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_rounds_and_clamps() {
        assert_eq!(budget_utilization(0.0, 1000.0), 0);
        assert_eq!(budget_utilization(333.0, 1000.0), 33);
        assert_eq!(budget_utilization(335.0, 1000.0), 34);
        assert_eq!(budget_utilization(1000.0, 1000.0), 100);
        assert_eq!(budget_utilization(2500.0, 1000.0), 100);
    }

    #[test]
    fn test_utilization_zero_cost() {
        assert_eq!(budget_utilization(500.0, 0.0), 0);
        assert_eq!(budget_utilization(500.0, -10.0), 0);
    }

    #[test]
    fn test_summary_flags_overrun() {
        let summary = BudgetSummary::new(1000.0, 1200.0);
        assert!(summary.over_budget);
        assert_eq!(summary.remaining, -200.0);
        assert_eq!(summary.utilization, 100);
    }
}
