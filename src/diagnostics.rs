//! Non-fatal findings about the input data.
//!
//! None of these stop a report: the aggregators skip or zero the affected contribution. They are
//! collected here so callers can tell schema drift or dangling references apart from real zeros.

use crate::classification::AccountClassifier;
use crate::recurrence::try_count_occurrences;
use crate::schema::{BudgetEntry, JournalEntry};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    UnsupportedRecurrence {
        entry_id: Option<String>,
        account_id: String,
    },
    UnknownBudgetAccount {
        entry_id: Option<String>,
        account_id: String,
    },
    UnknownJournalAccount {
        entry_id: Option<String>,
        date: NaiveDate,
        account_id: String,
    },
    UnbalancedJournalEntry {
        entry_id: Option<String>,
        date: NaiveDate,
        debit: f64,
        credit: f64,
    },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedRecurrence {
                entry_id,
                account_id,
            } => write!(
                f,
                "budget entry {} on account '{}' has an unsupported recurrence and was counted as zero",
                entry_id.as_deref().unwrap_or("<unnamed>"),
                account_id
            ),
            Self::UnknownBudgetAccount {
                entry_id,
                account_id,
            } => write!(
                f,
                "budget entry {} references unknown account '{}'",
                entry_id.as_deref().unwrap_or("<unnamed>"),
                account_id
            ),
            Self::UnknownJournalAccount {
                entry_id,
                date,
                account_id,
            } => write!(
                f,
                "journal entry {} on {} references unknown account '{}'",
                entry_id.as_deref().unwrap_or("<unnamed>"),
                date,
                account_id
            ),
            Self::UnbalancedJournalEntry {
                entry_id,
                date,
                debit,
                credit,
            } => write!(
                f,
                "journal entry {} on {} is unbalanced: debit {} != credit {}",
                entry_id.as_deref().unwrap_or("<unnamed>"),
                date,
                debit,
                credit
            ),
        }
    }
}

/// Reports journal entries inside `[start, end]` that do not balance or that post to accounts
/// missing from the chart.
pub fn scan_journal_entries(
    journal_entries: &[JournalEntry],
    classifier: &AccountClassifier<'_>,
    start: NaiveDate,
    end: NaiveDate,
    tolerance: f64,
) -> Vec<ReportWarning> {
    let mut warnings = Vec::new();

    for entry in journal_entries
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
    {
        let debit = entry.total_debit();
        let credit = entry.total_credit();
        if (debit - credit).abs() > tolerance {
            warnings.push(ReportWarning::UnbalancedJournalEntry {
                entry_id: entry.id.clone(),
                date: entry.date,
                debit,
                credit,
            });
        }

        for line in &entry.lines {
            if !classifier.contains(&line.account_id) {
                warnings.push(ReportWarning::UnknownJournalAccount {
                    entry_id: entry.id.clone(),
                    date: entry.date,
                    account_id: line.account_id.clone(),
                });
            }
        }
    }

    log_warnings(&warnings);
    warnings
}

/// Reports budget entries active in `[start, end]` with an unsupported recurrence or a
/// reference to an account missing from the chart.
pub fn scan_budget_entries(
    budget_entries: &[BudgetEntry],
    classifier: &AccountClassifier<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ReportWarning> {
    let mut warnings = Vec::new();

    for entry in budget_entries {
        if try_count_occurrences(entry, start, end).is_unsupported() {
            warnings.push(ReportWarning::UnsupportedRecurrence {
                entry_id: entry.id.clone(),
                account_id: entry.account_id.clone(),
            });
        }

        let referenced = std::iter::once(entry.account_id.as_str()).chain(entry.counter_account_id());
        for account_id in referenced {
            if !classifier.contains(account_id) {
                warnings.push(ReportWarning::UnknownBudgetAccount {
                    entry_id: entry.id.clone(),
                    account_id: account_id.to_string(),
                });
            }
        }
    }

    log_warnings(&warnings);
    warnings
}

fn log_warnings(warnings: &[ReportWarning]) {
    for warning in warnings {
        warn!("{}", warning);
    }
}
