//! Projection of budget entries onto accounts and periods.
//!
//! Two views are computed from the same entries:
//!
//! - **Profit & loss**: `Income` adds, `Expense` subtracts, `Transfer` is ignored.
//! - **Balance sheet**: every kind moves balances. On the entry's own account `Income` adds and
//!   `Expense`/`Transfer` subtract; on the counter account `Income` adds, `Expense` subtracts and
//!   `Transfer` adds (the destination leg).

use crate::recurrence::count_occurrences;
use crate::schema::{BudgetEntry, BudgetEntryKind, Scenario};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, Sub};

/// One amount per scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAmounts {
    pub actual: f64,
    pub best_case: f64,
    pub worst_case: f64,
}

impl ScenarioAmounts {
    pub fn uniform(amount: f64) -> Self {
        Self {
            actual: amount,
            best_case: amount,
            worst_case: amount,
        }
    }

    pub fn of_entry(entry: &BudgetEntry) -> Self {
        Self {
            actual: entry.amount_for(Scenario::Actual),
            best_case: entry.amount_for(Scenario::BestCase),
            worst_case: entry.amount_for(Scenario::WorstCase),
        }
    }

    pub fn get(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Actual => self.actual,
            Scenario::BestCase => self.best_case,
            Scenario::WorstCase => self.worst_case,
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self {
            actual: self.actual * factor,
            best_case: self.best_case * factor,
            worst_case: self.worst_case * factor,
        }
    }
}

impl AddAssign for ScenarioAmounts {
    fn add_assign(&mut self, other: Self) {
        self.actual += other.actual;
        self.best_case += other.best_case;
        self.worst_case += other.worst_case;
    }
}

impl Sub for ScenarioAmounts {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            actual: self.actual - other.actual,
            best_case: self.best_case - other.best_case,
            worst_case: self.worst_case - other.worst_case,
        }
    }
}

/// Profit & loss sign of `entry` when summed for `account_id`, or `None` if it does not apply.
fn profit_and_loss_sign(entry: &BudgetEntry, account_id: &str) -> Option<f64> {
    if entry.account_id != account_id {
        return None;
    }
    match entry.kind {
        BudgetEntryKind::Income { .. } => Some(1.0),
        BudgetEntryKind::Expense { .. } => Some(-1.0),
        BudgetEntryKind::Transfer { .. } => None,
    }
}

/// Balance-sheet sign of `entry` when summed for `account_id`, depending on which leg it is.
fn balance_sheet_sign(entry: &BudgetEntry, account_id: &str) -> Option<f64> {
    let on_account = entry.account_id == account_id;
    let on_counter = entry.counter_account_id() == Some(account_id);

    let own_leg = match entry.kind {
        BudgetEntryKind::Income { .. } => 1.0,
        BudgetEntryKind::Expense { .. } | BudgetEntryKind::Transfer { .. } => -1.0,
    };
    let counter_leg = match entry.kind {
        BudgetEntryKind::Income { .. } | BudgetEntryKind::Transfer { .. } => 1.0,
        BudgetEntryKind::Expense { .. } => -1.0,
    };

    match (on_account, on_counter) {
        (false, false) => None,
        (true, false) => Some(own_leg),
        (false, true) => Some(counter_leg),
        (true, true) => Some(own_leg + counter_leg),
    }
}

fn project<F>(
    budget_entries: &[BudgetEntry],
    period_start: NaiveDate,
    period_end: NaiveDate,
    sign_of: F,
) -> ScenarioAmounts
where
    F: Fn(&BudgetEntry) -> Option<f64>,
{
    let mut total = ScenarioAmounts::default();

    for entry in budget_entries {
        let Some(sign) = sign_of(entry) else {
            continue;
        };
        if sign == 0.0 {
            continue;
        }

        let occurrences = count_occurrences(entry, period_start, period_end);
        if occurrences == 0 {
            continue;
        }

        total += ScenarioAmounts::of_entry(entry).scale(sign * occurrences as f64);
    }

    total
}

/// Projected profit & loss amounts for `account_id` in every scenario, transfers excluded.
pub fn project_profit_and_loss(
    budget_entries: &[BudgetEntry],
    account_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> ScenarioAmounts {
    project(budget_entries, period_start, period_end, |entry| {
        profit_and_loss_sign(entry, account_id)
    })
}

/// Projected balance-sheet flow for `account_id` in every scenario, transfers included.
pub fn project_balance_sheet(
    budget_entries: &[BudgetEntry],
    account_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> ScenarioAmounts {
    project(budget_entries, period_start, period_end, |entry| {
        balance_sheet_sign(entry, account_id)
    })
}

/// Projected profit & loss amount for `account_id` in one scenario.
pub fn aggregate_budget(
    budget_entries: &[BudgetEntry],
    account_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
    scenario: Scenario,
) -> f64 {
    project_profit_and_loss(budget_entries, account_id, period_start, period_end).get(scenario)
}

/// Projected balance-sheet flow for `account_id` in one scenario.
pub fn aggregate_balance_sheet_budget(
    budget_entries: &[BudgetEntry],
    account_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
    scenario: Scenario,
) -> f64 {
    project_balance_sheet(budget_entries, account_id, period_start, period_end).get(scenario)
}
