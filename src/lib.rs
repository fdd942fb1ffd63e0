//! # Budget Projection Engine
//!
//! A library that turns a tenant's chart of accounts, posted journal entries and planned budget
//! entries into financial summaries and actual-versus-budget reports.
//!
//! ## Core Concepts
//!
//! - **Effective Main Type**: Every account group resolves to one of Asset, Liability, Equity,
//!   Revenue or Expense by walking up to its nearest fixed ancestor
//! - **Movements**: Debit and credit totals of an account over an inclusive date range
//! - **Budget Entries**: Planned amounts that may repeat monthly, quarterly, half-yearly or yearly
//! - **Scenarios**: Each budget entry carries an actual, best-case and worst-case amount
//! - **Accounting Integrity**: Assets = Liabilities + Equity + Net Profit/Loss is checked, never forced
//!
//! ## Example
//!
//! ```rust,ignore
//! use budget_projection_engine::*;
//! use chrono::NaiveDate;
//!
//! let snapshot: TenantSnapshot = serde_json::from_str(&std::fs::read_to_string("tenant.json")?)?;
//!
//! let engine = ReportingEngine::new(ReportingConfig::default());
//! let summary = engine.summarize(&snapshot)?;
//! println!("Net profit: {:.2}", summary.net_profit_loss);
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let report = engine.budget_report(&snapshot, ReportWindow::trailing_months(today, 12))?;
//! for row in &report.table_data {
//!     println!("{} {}: {:.2} vs {:.2}", row.account_number, row.account_name, row.actual, row.budget.actual);
//! }
//! ```

pub mod budget;
pub mod chart_of_accounts;
pub mod classification;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod periods;
pub mod recurrence;
pub mod schema;
pub mod summary;
pub mod utils;

pub use budget::{
    aggregate_balance_sheet_budget, aggregate_budget, project_balance_sheet,
    project_profit_and_loss, ScenarioAmounts,
};
pub use chart_of_accounts::{AccountEntry, ChartOverview};
pub use classification::{
    resolve_main_type, AccountClassifier, ClassifiedAccount, GroupIndex,
    DEFAULT_MAX_HIERARCHY_DEPTH,
};
pub use config::ReportingConfig;
pub use diagnostics::{scan_budget_entries, scan_journal_entries, ReportWarning};
pub use engine::{
    build_budget_report, AccountRow, BalancePoint, BudgetReportBuilder, BudgetReportData,
    PeriodRow,
};
pub use error::{ClassificationError, ReportingError, Result};
pub use ledger::{aggregate_movements, Movement, MovementIndex};
pub use periods::{generate_periods, Granularity, Period, ReportWindow};
pub use recurrence::{count_occurrences, occurrence_dates, try_count_occurrences, OccurrenceCount};
pub use schema::*;
pub use summary::{
    calculate_summary, calculate_summary_with_breakdown, running_balances, AccountBalance,
    FinancialSummary, FinancialSummaryCalculator, PeriodBreakdown,
};
pub use utils::*;

use log::{debug, info};

/// Runs summaries and budget reports against a [`TenantSnapshot`] with one configuration.
pub struct ReportingEngine {
    config: ReportingConfig,
}

impl ReportingEngine {
    pub fn new(config: ReportingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Financial summary over the snapshot's fiscal year, or over all postings when it has none.
    pub fn summarize(&self, snapshot: &TenantSnapshot) -> Result<FinancialSummary> {
        self.config.validate()?;

        info!(
            "Summarizing tenant {} ({} journal entries)",
            snapshot.chart.tenant_id,
            snapshot.journal_entries.len()
        );

        FinancialSummaryCalculator::new(self.config.clone()).calculate(
            &snapshot.chart,
            &snapshot.journal_entries,
            snapshot.fiscal_year.as_ref(),
            None,
        )
    }

    /// Like [`summarize`](Self::summarize), with a periodical breakdown at the configured
    /// granularity. Requires a fiscal year.
    pub fn summarize_with_breakdown(&self, snapshot: &TenantSnapshot) -> Result<FinancialSummary> {
        self.config.validate()?;

        let fiscal_year = snapshot.fiscal_year.as_ref().ok_or_else(|| {
            ReportingError::MissingFiscalYear("produce a periodical breakdown".to_string())
        })?;

        debug!(
            "Breaking down fiscal year {} by {:?}",
            fiscal_year.name, self.config.granularity
        );

        FinancialSummaryCalculator::new(self.config.clone()).calculate(
            &snapshot.chart,
            &snapshot.journal_entries,
            Some(fiscal_year),
            Some(self.config.granularity),
        )
    }

    pub fn budget_report(
        &self,
        snapshot: &TenantSnapshot,
        window: ReportWindow,
    ) -> Result<BudgetReportData> {
        info!(
            "Budget report for tenant {} ({} budget entries)",
            snapshot.chart.tenant_id,
            snapshot.budget_entries.len()
        );

        let mut builder = BudgetReportBuilder::new(&snapshot.chart).with_config(self.config.clone());
        if let Some(fiscal_year) = snapshot.fiscal_year.as_ref() {
            builder = builder.with_fiscal_year(fiscal_year);
        }

        let report = builder.build(
            &snapshot.journal_entries,
            &snapshot.budget_entries,
            window,
        )?;

        if !report.warnings.is_empty() {
            debug!("Budget report produced {} warnings", report.warnings.len());
        }

        Ok(report)
    }

    /// Budget report over the snapshot's fiscal year.
    pub fn fiscal_year_report(&self, snapshot: &TenantSnapshot) -> Result<BudgetReportData> {
        let fiscal_year = snapshot.fiscal_year.as_ref().ok_or_else(|| {
            ReportingError::MissingFiscalYear("build a fiscal-year budget report".to_string())
        })?;
        self.budget_report(snapshot, ReportWindow::from_fiscal_year(fiscal_year)?)
    }

    pub fn chart_overview(&self, snapshot: &TenantSnapshot) -> Result<ChartOverview> {
        let classifier = AccountClassifier::classify_with_depth(
            &snapshot.chart,
            self.config.max_hierarchy_depth,
        )?;
        Ok(ChartOverview::from_classifier(&snapshot.chart, &classifier))
    }
}

impl Default for ReportingEngine {
    fn default() -> Self {
        Self::new(ReportingConfig::default())
    }
}
