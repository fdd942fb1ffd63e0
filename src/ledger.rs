use crate::schema::{JournalEntry, MainType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;

/// Summed debit and credit activity on one account. `net` is always `debit - credit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub debit: f64,
    pub credit: f64,
    pub net: f64,
}

impl Movement {
    pub fn new(debit: f64, credit: f64) -> Self {
        Self {
            debit,
            credit,
            net: debit - credit,
        }
    }

    /// Net movement expressed as an increase on the account's normal side.
    pub fn signed_for(&self, main_type: MainType) -> f64 {
        self.net * main_type.normal_sign()
    }

    /// Effect on profit: positive for revenue earned, negative for expense incurred.
    pub fn profit_impact(&self) -> f64 {
        -self.net
    }
}

impl AddAssign for Movement {
    fn add_assign(&mut self, other: Self) {
        self.debit += other.debit;
        self.credit += other.credit;
        self.net = self.debit - self.credit;
    }
}

/// Sums the lines posted to `account_id` by entries dated inside `[period_start, period_end]`.
///
/// Entries are not required to balance; whatever is present is summed.
pub fn aggregate_movements(
    journal_entries: &[JournalEntry],
    account_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Movement {
    let mut debit = 0.0;
    let mut credit = 0.0;

    for entry in journal_entries
        .iter()
        .filter(|e| e.date >= period_start && e.date <= period_end)
    {
        for line in entry.lines.iter().filter(|l| l.account_id == account_id) {
            debit += line.debit_amount();
            credit += line.credit_amount();
        }
    }

    Movement::new(debit, credit)
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    date: NaiveDate,
    debit: f64,
    credit: f64,
}

/// Journal lines pre-indexed by account and sorted by date, so repeated per-period queries cost
/// a binary search instead of a scan over every entry.
#[derive(Debug, Default)]
pub struct MovementIndex {
    postings: HashMap<String, Vec<Posting>>,
}

impl MovementIndex {
    pub fn build(journal_entries: &[JournalEntry]) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();

        for entry in journal_entries {
            for line in &entry.lines {
                postings
                    .entry(line.account_id.clone())
                    .or_default()
                    .push(Posting {
                        date: entry.date,
                        debit: line.debit_amount(),
                        credit: line.credit_amount(),
                    });
            }
        }

        for list in postings.values_mut() {
            list.sort_by_key(|p| p.date);
        }

        Self { postings }
    }

    pub fn movement(&self, account_id: &str, period_start: NaiveDate, period_end: NaiveDate) -> Movement {
        let Some(list) = self.postings.get(account_id) else {
            return Movement::default();
        };
        if period_end < period_start {
            return Movement::default();
        }

        let from = list.partition_point(|p| p.date < period_start);
        let to = list.partition_point(|p| p.date <= period_end);

        let (debit, credit) = list[from..to]
            .iter()
            .fold((0.0, 0.0), |(d, c), p| (d + p.debit, c + p.credit));
        Movement::new(debit, credit)
    }

    /// Everything posted strictly before `date`.
    pub fn movement_before(&self, account_id: &str, date: NaiveDate) -> Movement {
        let Some(list) = self.postings.get(account_id) else {
            return Movement::default();
        };
        let to = list.partition_point(|p| p.date < date);
        let (debit, credit) = list[..to]
            .iter()
            .fold((0.0, 0.0), |(d, c), p| (d + p.debit, c + p.credit));
        Movement::new(debit, credit)
    }

    /// Total activity on the account regardless of date.
    pub fn total(&self, account_id: &str) -> Movement {
        let Some(list) = self.postings.get(account_id) else {
            return Movement::default();
        };
        let (debit, credit) = list
            .iter()
            .fold((0.0, 0.0), |(d, c), p| (d + p.debit, c + p.credit));
        Movement::new(debit, credit)
    }
}
