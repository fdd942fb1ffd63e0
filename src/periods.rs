use crate::error::{ReportingError, Result};
use crate::schema::FiscalYear;
use crate::utils::{clamp_date, first_day_of_month, last_day_of_month, start_of_iso_week};
use chrono::{Datelike, Days, Months, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

/// A reporting bucket with inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    pub sort_key: String,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Buckets `[start, end]` into calendar days, ISO weeks or calendar months.
///
/// The first and last buckets are clamped to the range, so they may be partial. Buckets are
/// returned in ascending `sort_key` order and never overlap. An inverted range yields no buckets.
pub fn generate_periods(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<Period> {
    let mut periods = Vec::new();
    if end < start {
        return periods;
    }

    let mut cursor = match granularity {
        Granularity::Daily => start,
        Granularity::Weekly => start_of_iso_week(start),
        Granularity::Monthly => first_day_of_month(start),
    };

    while cursor <= end {
        let bucket_end = match granularity {
            Granularity::Daily => cursor,
            Granularity::Weekly => cursor.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX),
            Granularity::Monthly => last_day_of_month(cursor),
        };

        periods.push(Period {
            start: clamp_date(cursor, start, end),
            end: clamp_date(bucket_end, start, end),
            label: period_label(cursor, granularity),
            sort_key: period_sort_key(cursor, granularity),
        });

        let Some(next) = bucket_end.succ_opt() else {
            break;
        };
        cursor = next;
    }

    periods
}

fn period_sort_key(bucket_start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => bucket_start.format("%Y-%m-%d").to_string(),
        // ISO week-year, so 2024-12-30 sorts as 2025-W01 rather than 2024-W01
        Granularity::Weekly => {
            let week = bucket_start.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        Granularity::Monthly => bucket_start.format("%Y-%m").to_string(),
    }
}

fn period_label(bucket_start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => bucket_start.format("%d %b %Y").to_string(),
        Granularity::Weekly => {
            let week = bucket_start.iso_week();
            format!("Week {} {}", week.week(), week.year())
        }
        Granularity::Monthly => bucket_start.format("%b %Y").to_string(),
    }
}

/// An inclusive reporting window. Constructors that depend on "today" take it as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(ReportingError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn from_fiscal_year(fiscal_year: &FiscalYear) -> Result<Self> {
        Self::new(fiscal_year.start_date, fiscal_year.end_date)
    }

    pub fn calendar_year_of(today: NaiveDate) -> Self {
        let start = today.with_ordinal(1).unwrap_or(today);
        Self {
            start,
            end: start
                .checked_add_months(Months::new(12))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn year_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_ordinal(1).unwrap_or(today),
            end: today,
        }
    }

    /// The last `months` calendar months up to and including the month of `today`.
    pub fn trailing_months(today: NaiveDate, months: u32) -> Self {
        let back = months.saturating_sub(1);
        let start = first_day_of_month(today)
            .checked_sub_months(Months::new(back))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: last_day_of_month(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn periods(&self, granularity: Granularity) -> Vec<Period> {
        generate_periods(self.start, self.end, granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_ordered_and_disjoint(periods: &[Period]) {
        for pair in periods.windows(2) {
            assert!(
                pair[0].sort_key < pair[1].sort_key,
                "{} should sort before {}",
                pair[0].sort_key,
                pair[1].sort_key
            );
            assert!(pair[0].end < pair[1].start, "periods overlap: {:?}", pair);
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
        }
    }

    #[test]
    fn test_monthly_periods_are_clamped() {
        let periods = generate_periods(ymd(2024, 1, 15), ymd(2024, 3, 10), Granularity::Monthly);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].start, ymd(2024, 1, 15));
        assert_eq!(periods[0].end, ymd(2024, 1, 31));
        assert_eq!(periods[1].start, ymd(2024, 2, 1));
        assert_eq!(periods[1].end, ymd(2024, 2, 29));
        assert_eq!(periods[2].end, ymd(2024, 3, 10));
        assert_eq!(periods[0].sort_key, "2024-01");
        assert_eq!(periods[0].label, "Jan 2024");
    }

    #[test]
    fn test_fourteen_month_window_across_year_boundary() {
        let start = ymd(2023, 11, 1);
        let end = ymd(2024, 12, 31);

        for granularity in [Granularity::Daily, Granularity::Weekly, Granularity::Monthly] {
            let periods = generate_periods(start, end, granularity);
            assert!(!periods.is_empty());
            assert_eq!(periods.first().unwrap().start, start);
            assert_eq!(periods.last().unwrap().end, end);
            assert_ordered_and_disjoint(&periods);
        }

        assert_eq!(generate_periods(start, end, Granularity::Monthly).len(), 14);
        assert_eq!(generate_periods(start, end, Granularity::Daily).len(), 427);
    }

    #[test]
    fn test_weekly_uses_iso_week_year() {
        let periods = generate_periods(ymd(2024, 12, 23), ymd(2025, 1, 12), Granularity::Weekly);
        let keys: Vec<&str> = periods.iter().map(|p| p.sort_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-W52", "2025-W01", "2025-W02"]);
        assert_eq!(periods[1].start, ymd(2024, 12, 30));
        assert_eq!(periods[1].end, ymd(2025, 1, 5));
    }

    #[test]
    fn test_weekly_partial_first_week() {
        // 2021-01-01 is a Friday in ISO week 2020-W53
        let periods = generate_periods(ymd(2021, 1, 1), ymd(2021, 1, 10), Granularity::Weekly);
        assert_eq!(periods[0].sort_key, "2020-W53");
        assert_eq!(periods[0].start, ymd(2021, 1, 1));
        assert_eq!(periods[0].end, ymd(2021, 1, 3));
        assert_eq!(periods[0].num_days(), 3);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(generate_periods(ymd(2024, 2, 1), ymd(2024, 1, 1), Granularity::Daily).is_empty());
    }

    #[test]
    fn test_report_windows() {
        let today = ymd(2024, 5, 17);

        let year = ReportWindow::calendar_year_of(today);
        assert_eq!(year.start, ymd(2024, 1, 1));
        assert_eq!(year.end, ymd(2024, 12, 31));

        let ytd = ReportWindow::year_to_date(today);
        assert_eq!(ytd.start, ymd(2024, 1, 1));
        assert_eq!(ytd.end, today);

        let trailing = ReportWindow::trailing_months(today, 6);
        assert_eq!(trailing.start, ymd(2023, 12, 1));
        assert_eq!(trailing.end, ymd(2024, 5, 31));
        assert_eq!(trailing.periods(Granularity::Monthly).len(), 6);

        assert!(ReportWindow::new(ymd(2024, 2, 1), ymd(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_windows_and_periods_at_calendar_limit() {
        let year = ReportWindow::calendar_year_of(NaiveDate::MAX);
        assert_eq!(year.end, NaiveDate::MAX);

        let start = first_day_of_month(NaiveDate::MAX);
        for granularity in [Granularity::Daily, Granularity::Weekly, Granularity::Monthly] {
            let periods = generate_periods(start, NaiveDate::MAX, granularity);
            assert!(!periods.is_empty());
            assert_eq!(periods.last().unwrap().end, NaiveDate::MAX);
        }
    }
}
