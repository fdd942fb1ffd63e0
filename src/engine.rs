use crate::budget::{project_balance_sheet, project_profit_and_loss, ScenarioAmounts};
use crate::classification::{AccountClassifier, ClassifiedAccount};
use crate::config::ReportingConfig;
use crate::diagnostics::{scan_budget_entries, scan_journal_entries, ReportWarning};
use crate::error::Result;
use crate::ledger::MovementIndex;
use crate::periods::{Granularity, Period, ReportWindow};
use crate::schema::{
    AccountId, BudgetEntry, FiscalYear, JournalEntry, MainType, Scenario, TenantChartOfAccounts,
};
use crate::utils::csv_field;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Actual versus budget for one profit & loss account over the whole window.
///
/// All amounts use the profit-impact convention: revenue positive, expense negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRow {
    pub account_id: AccountId,
    pub account_number: String,
    pub account_name: String,
    pub group_name: String,
    pub main_type: MainType,
    pub actual: f64,
    pub budget: ScenarioAmounts,
    /// `actual` minus the budget of the configured scenario.
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub actual: f64,
    pub projected: ScenarioAmounts,
}

/// One chart bucket. Revenue and expense figures are positive magnitudes; balances are
/// cumulative up to the end of the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub label: String,
    pub sort_key: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub actual_revenue: f64,
    pub actual_expenses: f64,
    pub actual_net: f64,
    pub budget_income: ScenarioAmounts,
    pub budget_expenses: ScenarioAmounts,
    pub budget_net: ScenarioAmounts,
    pub balances: BTreeMap<AccountId, BalancePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReportData {
    pub window: ReportWindow,
    pub granularity: Granularity,
    pub scenario: Scenario,
    pub table_data: Vec<AccountRow>,
    pub chart_data: Vec<PeriodRow>,
    pub warnings: Vec<ReportWarning>,
}

impl BudgetReportData {
    pub fn row(&self, account_id: &str) -> Option<&AccountRow> {
        self.table_data.iter().find(|r| r.account_id == account_id)
    }

    /// Sum of the table's actual and budget columns.
    pub fn table_totals(&self) -> (f64, ScenarioAmounts) {
        let mut budget = ScenarioAmounts::default();
        let mut actual = 0.0;
        for row in &self.table_data {
            actual += row.actual;
            budget += row.budget;
        }
        (actual, budget)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn table_to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(
            "Account Number,Account Name,Main Type,Actual,Budget,Best Case,Worst Case,Variance\n",
        );

        for row in &self.table_data {
            output.push_str(&format!(
                "{},{},{:?},{:.2},{:.2},{:.2},{:.2},{:.2}\n",
                csv_field(&row.account_number),
                csv_field(&row.account_name),
                row.main_type,
                row.actual,
                row.budget.actual,
                row.budget.best_case,
                row.budget.worst_case,
                row.variance
            ));
        }

        output
    }
}

pub struct BudgetReportBuilder<'a> {
    chart: &'a TenantChartOfAccounts,
    fiscal_year: Option<&'a FiscalYear>,
    config: ReportingConfig,
}

impl<'a> BudgetReportBuilder<'a> {
    pub fn new(chart: &'a TenantChartOfAccounts) -> Self {
        Self {
            chart,
            fiscal_year: None,
            config: ReportingConfig::default(),
        }
    }

    /// Balances open at the fiscal year's start; postings between that start and the window
    /// start are rolled into the opening figure of the chart series.
    pub fn with_fiscal_year(mut self, fiscal_year: &'a FiscalYear) -> Self {
        self.fiscal_year = Some(fiscal_year);
        self
    }

    pub fn with_config(mut self, config: ReportingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(
        &self,
        journal_entries: &[JournalEntry],
        budget_entries: &[BudgetEntry],
        window: ReportWindow,
    ) -> Result<BudgetReportData> {
        self.config.validate()?;

        info!(
            "Building budget report for chart '{}' from {} to {}",
            self.chart.name, window.start, window.end
        );

        let classifier =
            AccountClassifier::classify_with_depth(self.chart, self.config.max_hierarchy_depth)?;
        let index = MovementIndex::build(journal_entries);
        let periods = window.periods(self.config.granularity);

        debug!(
            "{} periods, {} journal entries, {} budget entries",
            periods.len(),
            journal_entries.len(),
            budget_entries.len()
        );

        let mut warnings = scan_journal_entries(
            journal_entries,
            &classifier,
            window.start,
            window.end,
            self.config.balance_tolerance,
        );
        warnings.extend(scan_budget_entries(
            budget_entries,
            &classifier,
            window.start,
            window.end,
        ));

        let table_data = self.table_rows(&classifier, &index, budget_entries, window);
        let chart_data = self.chart_rows(&classifier, &index, budget_entries, window, &periods);

        Ok(BudgetReportData {
            window,
            granularity: self.config.granularity,
            scenario: self.config.scenario,
            table_data,
            chart_data,
            warnings,
        })
    }

    fn table_rows(
        &self,
        classifier: &AccountClassifier<'_>,
        index: &MovementIndex,
        budget_entries: &[BudgetEntry],
        window: ReportWindow,
    ) -> Vec<AccountRow> {
        let mut rows: Vec<AccountRow> = classifier
            .iter()
            .filter(|c| c.main_type.is_profit_and_loss())
            .map(|c| {
                let account_id = c.account.id.as_str();
                let actual = index
                    .movement(account_id, window.start, window.end)
                    .profit_impact();
                let budget =
                    project_profit_and_loss(budget_entries, account_id, window.start, window.end);

                AccountRow {
                    account_id: c.account.id.clone(),
                    account_number: c.account.number.clone(),
                    account_name: c.account.name.clone(),
                    group_name: c.group.name.clone(),
                    main_type: c.main_type,
                    actual,
                    budget,
                    variance: actual - budget.get(self.config.scenario),
                }
            })
            .collect();

        rows.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        rows
    }

    fn chart_rows(
        &self,
        classifier: &AccountClassifier<'_>,
        index: &MovementIndex,
        budget_entries: &[BudgetEntry],
        window: ReportWindow,
        periods: &[Period],
    ) -> Vec<PeriodRow> {
        let balance_accounts: Vec<&ClassifiedAccount<'_>> = classifier
            .iter()
            .filter(|c| c.main_type.is_balance_sheet())
            .collect();

        let mut running: BTreeMap<AccountId, BalancePoint> = balance_accounts
            .iter()
            .map(|c| {
                let opening = self.opening_balance(c, index, window.start);
                (
                    c.account.id.clone(),
                    BalancePoint {
                        actual: opening,
                        projected: ScenarioAmounts::uniform(opening),
                    },
                )
            })
            .collect();

        let mut rows = Vec::with_capacity(periods.len());

        for period in periods {
            let mut actual_revenue = 0.0;
            let mut actual_expenses = 0.0;
            let mut budget_income = ScenarioAmounts::default();
            let mut budget_expenses = ScenarioAmounts::default();

            for c in classifier.iter() {
                let account_id = c.account.id.as_str();
                match c.main_type {
                    MainType::Revenue => {
                        actual_revenue += index
                            .movement(account_id, period.start, period.end)
                            .signed_for(MainType::Revenue);
                        budget_income += project_profit_and_loss(
                            budget_entries,
                            account_id,
                            period.start,
                            period.end,
                        );
                    }
                    MainType::Expense => {
                        actual_expenses += index
                            .movement(account_id, period.start, period.end)
                            .signed_for(MainType::Expense);
                        budget_expenses += project_profit_and_loss(
                            budget_entries,
                            account_id,
                            period.start,
                            period.end,
                        )
                        .scale(-1.0);
                    }
                    _ => {}
                }
            }

            for c in &balance_accounts {
                let account_id = c.account.id.as_str();
                let actual_flow = index
                    .movement(account_id, period.start, period.end)
                    .signed_for(c.main_type);
                // Budget legs are signed from the asset side; flip them for credit-normal accounts.
                let projected_flow =
                    project_balance_sheet(budget_entries, account_id, period.start, period.end)
                        .scale(c.main_type.normal_sign());

                if let Some(point) = running.get_mut(account_id) {
                    point.actual += actual_flow;
                    point.projected += projected_flow;
                }
            }

            rows.push(PeriodRow {
                label: period.label.clone(),
                sort_key: period.sort_key.clone(),
                start: period.start,
                end: period.end,
                actual_revenue,
                actual_expenses,
                actual_net: actual_revenue - actual_expenses,
                budget_income,
                budget_expenses,
                budget_net: budget_income - budget_expenses,
                balances: running.clone(),
            });
        }

        rows
    }

    fn opening_balance(
        &self,
        classified: &ClassifiedAccount<'_>,
        index: &MovementIndex,
        window_start: NaiveDate,
    ) -> f64 {
        let carried = classified.account.balance;
        match self.fiscal_year {
            Some(fy) if fy.start_date < window_start => {
                let before_window = index.movement(
                    &classified.account.id,
                    fy.start_date,
                    window_start.pred_opt().unwrap_or(window_start),
                );
                carried + before_window.signed_for(classified.main_type)
            }
            _ => carried,
        }
    }
}

pub fn build_budget_report(
    chart: &TenantChartOfAccounts,
    journal_entries: &[JournalEntry],
    budget_entries: &[BudgetEntry],
    window: ReportWindow,
    config: ReportingConfig,
) -> Result<BudgetReportData> {
    BudgetReportBuilder::new(chart)
        .with_config(config)
        .build(journal_entries, budget_entries, window)
}
