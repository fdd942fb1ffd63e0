//! Expansion of (possibly recurring) budget entries into occurrences inside a period.
//!
//! Occurrence `k` of a recurring entry falls on `start_date + k * step` calendar months, clamped
//! to the end of shorter months. Dates are always derived from the anchor rather than from the
//! previous occurrence, so a series started on the 31st returns to the 31st after February.

use crate::schema::BudgetEntry;
use crate::utils::{add_months, in_range, months_between};
use chrono::NaiveDate;
use log::warn;

/// Result of expanding an entry, keeping an unsupported recurrence apart from a genuine zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceCount {
    Counted(u32),
    UnsupportedRecurrence,
}

impl OccurrenceCount {
    /// The number of occurrences, treating an unsupported recurrence as zero.
    pub fn get(self) -> u32 {
        match self {
            Self::Counted(count) => count,
            Self::UnsupportedRecurrence => 0,
        }
    }

    pub fn is_unsupported(self) -> bool {
        matches!(self, Self::UnsupportedRecurrence)
    }
}

/// Counts how often `entry` occurs inside `[period_start, period_end]`.
///
/// Unsupported recurrence values count as zero and are logged.
pub fn count_occurrences(entry: &BudgetEntry, period_start: NaiveDate, period_end: NaiveDate) -> u32 {
    let count = try_count_occurrences(entry, period_start, period_end);
    if count.is_unsupported() {
        warn!(
            "Budget entry {} on account '{}' has an unsupported recurrence; counting zero occurrences",
            entry.id.as_deref().unwrap_or("<unnamed>"),
            entry.account_id
        );
    }
    count.get()
}

pub fn try_count_occurrences(
    entry: &BudgetEntry,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> OccurrenceCount {
    let mut count = 0u32;
    let outcome = walk_occurrences(entry, period_start, period_end, |_| count += 1);
    match outcome {
        Walk::Done => OccurrenceCount::Counted(count),
        Walk::Unsupported => OccurrenceCount::UnsupportedRecurrence,
    }
}

/// The concrete dates counted by [`count_occurrences`], in ascending order.
pub fn occurrence_dates(
    entry: &BudgetEntry,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    walk_occurrences(entry, period_start, period_end, |date| dates.push(date));
    dates
}

enum Walk {
    Done,
    Unsupported,
}

fn walk_occurrences<F>(
    entry: &BudgetEntry,
    period_start: NaiveDate,
    period_end: NaiveDate,
    mut visit: F,
) -> Walk
where
    F: FnMut(NaiveDate),
{
    let Some(first) = entry.start_date else {
        return Walk::Done;
    };

    if entry.end_date.is_some_and(|end| end < period_start) {
        return Walk::Done;
    }

    if first > period_end {
        return Walk::Done;
    }

    if !entry.repeats() {
        if in_range(first, period_start, period_end) {
            visit(first);
        }
        return Walk::Done;
    }

    let Some(step) = entry.recurrence.month_step() else {
        return Walk::Unsupported;
    };

    // Jump close to the window; the loop below settles the last few steps.
    let mut index = fast_forward_index(first, period_start, step);

    while let Some(date) = nth_occurrence(first, index, step) {
        if date > period_end || entry.end_date.is_some_and(|end| date > end) {
            break;
        }
        if date >= period_start {
            visit(date);
        }
        index += 1;
    }

    Walk::Done
}

fn nth_occurrence(first: NaiveDate, index: u32, step: u32) -> Option<NaiveDate> {
    add_months(first, index.checked_mul(step)?)
}

/// Largest occurrence index known to fall before `period_start`, or 0.
fn fast_forward_index(first: NaiveDate, period_start: NaiveDate, step: u32) -> u32 {
    if first >= period_start {
        return 0;
    }
    let months = months_between(first, period_start).max(0) as u32;
    (months / step).saturating_sub(1)
}
