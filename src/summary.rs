use crate::classification::AccountClassifier;
use crate::config::ReportingConfig;
use crate::error::{ReportingError, Result};
use crate::ledger::{Movement, MovementIndex};
use crate::periods::{generate_periods, Granularity};
use crate::schema::{AccountId, FiscalYear, JournalEntry, MainType, TenantChartOfAccounts};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub account_number: String,
    pub account_name: String,
    pub main_type: MainType,
    /// Carried-forward opening balance; always zero for profit & loss accounts.
    pub opening_balance: f64,
    pub movement: Movement,
    /// Opening balance plus movement on the normal side. For profit & loss accounts this is the
    /// period flow.
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    pub label: String,
    pub sort_key: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub revenue: f64,
    pub expenses: f64,
    pub net_profit_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_assets: f64,
    pub total_liabilities: f64,
    /// `total_assets - total_liabilities`.
    pub equity: f64,
    /// Sum of the closing balances of equity accounts.
    pub recorded_equity: f64,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub net_profit_loss: f64,
    pub account_balances: Vec<AccountBalance>,
    pub periodical_breakdown: Option<Vec<PeriodBreakdown>>,
}

impl FinancialSummary {
    pub fn balance_of(&self, account_id: &str) -> Option<&AccountBalance> {
        self.account_balances
            .iter()
            .find(|b| b.account_id == account_id)
    }

    /// Checks Assets = Liabilities + Equity + (Revenue - Expenses) within `tolerance`.
    pub fn verify_accounting_equation(&self, tolerance: f64) -> Result<()> {
        let right_side = self.total_liabilities + self.recorded_equity + self.net_profit_loss;
        let difference = (self.total_assets - right_side).abs();

        if difference > tolerance {
            return Err(ReportingError::AccountingEquationViolation {
                assets: self.total_assets,
                liabilities: self.total_liabilities,
                equity: self.recorded_equity,
                net_profit_loss: self.net_profit_loss,
                difference,
            });
        }

        Ok(())
    }
}

/// Running balance after each flow, starting from `opening`.
pub fn running_balances(opening: f64, flows: &[f64]) -> Vec<f64> {
    flows
        .iter()
        .scan(opening, |balance, flow| {
            *balance += flow;
            Some(*balance)
        })
        .collect()
}

pub struct FinancialSummaryCalculator {
    config: ReportingConfig,
}

impl FinancialSummaryCalculator {
    pub fn new(config: ReportingConfig) -> Self {
        Self { config }
    }

    /// Summarises the chart for `fiscal_year`, or over every journal entry when no fiscal year is
    /// given. A periodical breakdown needs the fiscal year's window.
    pub fn calculate(
        &self,
        chart: &TenantChartOfAccounts,
        journal_entries: &[JournalEntry],
        fiscal_year: Option<&FiscalYear>,
        aggregation_period: Option<Granularity>,
    ) -> Result<FinancialSummary> {
        self.config.validate()?;

        info!(
            "Calculating financial summary for chart '{}' (tenant {})",
            chart.name, chart.tenant_id
        );

        let window = match fiscal_year {
            Some(fy) => {
                if fy.end_date < fy.start_date {
                    return Err(ReportingError::InvalidDateRange {
                        start: fy.start_date,
                        end: fy.end_date,
                    });
                }
                Some((fy.start_date, fy.end_date))
            }
            None => None,
        };

        if aggregation_period.is_some() && window.is_none() {
            return Err(ReportingError::MissingFiscalYear(
                "produce a periodical breakdown".to_string(),
            ));
        }

        let classifier = AccountClassifier::classify_with_depth(chart, self.config.max_hierarchy_depth)?;
        let index = MovementIndex::build(journal_entries);

        debug!(
            "Summarising {} accounts over {} journal entries",
            classifier.len(),
            journal_entries.len()
        );

        let mut summary = FinancialSummary {
            total_assets: 0.0,
            total_liabilities: 0.0,
            equity: 0.0,
            recorded_equity: 0.0,
            total_revenue: 0.0,
            total_expenses: 0.0,
            net_profit_loss: 0.0,
            account_balances: Vec::with_capacity(classifier.len()),
            periodical_breakdown: None,
        };

        for classified in classifier.iter() {
            let account = classified.account;
            let main_type = classified.main_type;

            let movement = match window {
                Some((start, end)) => index.movement(&account.id, start, end),
                None => index.total(&account.id),
            };

            let opening_balance = if main_type.is_balance_sheet() {
                account.balance
            } else {
                0.0
            };
            let closing_balance = opening_balance + movement.signed_for(main_type);

            match main_type {
                MainType::Asset => summary.total_assets += closing_balance,
                MainType::Liability => summary.total_liabilities += closing_balance,
                MainType::Equity => summary.recorded_equity += closing_balance,
                MainType::Revenue => summary.total_revenue += closing_balance,
                MainType::Expense => summary.total_expenses += closing_balance,
            }

            summary.account_balances.push(AccountBalance {
                account_id: account.id.clone(),
                account_number: account.number.clone(),
                account_name: account.name.clone(),
                main_type,
                opening_balance,
                movement,
                closing_balance,
            });
        }

        summary.equity = summary.total_assets - summary.total_liabilities;
        summary.net_profit_loss = summary.total_revenue - summary.total_expenses;

        if let (Some(granularity), Some((start, end))) = (aggregation_period, window) {
            summary.periodical_breakdown =
                Some(self.breakdown(&classifier, &index, start, end, granularity));
        }

        debug!(
            "Summary: assets {:.2}, liabilities {:.2}, revenue {:.2}, expenses {:.2}",
            summary.total_assets,
            summary.total_liabilities,
            summary.total_revenue,
            summary.total_expenses
        );

        Ok(summary)
    }

    fn breakdown(
        &self,
        classifier: &AccountClassifier<'_>,
        index: &MovementIndex,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Vec<PeriodBreakdown> {
        generate_periods(start, end, granularity)
            .into_iter()
            .map(|period| {
                let flow_of = |main_type: MainType| -> f64 {
                    classifier
                        .of_type(main_type)
                        .map(|c| {
                            index
                                .movement(&c.account.id, period.start, period.end)
                                .signed_for(main_type)
                        })
                        .sum()
                };

                let revenue = flow_of(MainType::Revenue);
                let expenses = flow_of(MainType::Expense);

                PeriodBreakdown {
                    label: period.label,
                    sort_key: period.sort_key,
                    start: period.start,
                    end: period.end,
                    revenue,
                    expenses,
                    net_profit_loss: revenue - expenses,
                }
            })
            .collect()
    }
}

pub fn calculate_summary(
    chart: &TenantChartOfAccounts,
    journal_entries: &[JournalEntry],
    fiscal_year: Option<&FiscalYear>,
) -> Result<FinancialSummary> {
    FinancialSummaryCalculator::new(ReportingConfig::default()).calculate(
        chart,
        journal_entries,
        fiscal_year,
        None,
    )
}

pub fn calculate_summary_with_breakdown(
    chart: &TenantChartOfAccounts,
    journal_entries: &[JournalEntry],
    fiscal_year: Option<&FiscalYear>,
    aggregation_period: Granularity,
) -> Result<FinancialSummary> {
    FinancialSummaryCalculator::new(ReportingConfig::default()).calculate(
        chart,
        journal_entries,
        fiscal_year,
        Some(aggregation_period),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Account, AccountGroup, JournalEntryLine};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(id: &str, balance: f64) -> Account {
        Account {
            id: id.to_string(),
            number: id.to_string(),
            name: id.to_string(),
            description: None,
            balance,
        }
    }

    fn fixed(id: &str, main_type: MainType, accounts: Vec<Account>) -> AccountGroup {
        AccountGroup {
            id: id.to_string(),
            name: id.to_string(),
            main_type,
            is_fixed: true,
            parent_id: None,
            level: 0,
            accounts,
        }
    }

    fn fiscal_year_2024() -> FiscalYear {
        FiscalYear {
            id: "fy24".to_string(),
            name: "FY 2024".to_string(),
            start_date: ymd(2024, 1, 1),
            end_date: ymd(2024, 12, 31),
            is_closed: false,
            carry_forward_source_fiscal_year_id: None,
        }
    }

    fn line(account: &str, debit: Option<f64>, credit: Option<f64>) -> JournalEntryLine {
        JournalEntryLine {
            account_id: account.to_string(),
            debit,
            credit,
        }
    }

    fn chart() -> TenantChartOfAccounts {
        TenantChartOfAccounts {
            id: "coa".to_string(),
            tenant_id: "t1".to_string(),
            name: "Default".to_string(),
            groups: vec![
                fixed("assets", MainType::Asset, vec![account("bank", 1000.0)]),
                fixed("liabilities", MainType::Liability, vec![account("loan", 400.0)]),
                fixed("equity", MainType::Equity, vec![account("capital", 600.0)]),
                fixed("revenue", MainType::Revenue, vec![account("sales", 0.0)]),
                fixed("expenses", MainType::Expense, vec![account("rent", 0.0)]),
            ],
        }
    }

    fn entries() -> Vec<JournalEntry> {
        vec![
            JournalEntry {
                id: Some("j1".to_string()),
                date: ymd(2024, 1, 15),
                lines: vec![line("bank", Some(900.0), None), line("sales", None, Some(900.0))],
            },
            JournalEntry {
                id: Some("j2".to_string()),
                date: ymd(2024, 2, 1),
                lines: vec![line("rent", Some(300.0), None), line("bank", None, Some(300.0))],
            },
            JournalEntry {
                id: Some("j3".to_string()),
                date: ymd(2024, 3, 20),
                lines: vec![line("loan", Some(100.0), None), line("bank", None, Some(100.0))],
            },
            JournalEntry {
                id: Some("old".to_string()),
                date: ymd(2023, 12, 31),
                lines: vec![line("bank", Some(5000.0), None), line("sales", None, Some(5000.0))],
            },
        ]
    }

    #[test]
    fn test_single_asset_opening_plus_debit() {
        let chart = TenantChartOfAccounts {
            id: "coa".to_string(),
            tenant_id: "t1".to_string(),
            name: "Default".to_string(),
            groups: vec![fixed("assets", MainType::Asset, vec![account("bank", 1000.0)])],
        };
        let entries = vec![JournalEntry {
            id: None,
            date: ymd(2024, 6, 1),
            lines: vec![line("bank", Some(200.0), None)],
        }];

        let fy = fiscal_year_2024();
        let summary = calculate_summary(&chart, &entries, Some(&fy)).unwrap();
        assert_eq!(summary.balance_of("bank").unwrap().closing_balance, 1200.0);
        assert_eq!(summary.total_assets, 1200.0);
    }

    #[test]
    fn test_totals_and_derived_equity() {
        let fy = fiscal_year_2024();
        let summary = calculate_summary(&chart(), &entries(), Some(&fy)).unwrap();

        assert_eq!(summary.total_assets, 1500.0);
        assert_eq!(summary.total_liabilities, 300.0);
        assert_eq!(summary.equity, 1200.0);
        assert_eq!(summary.recorded_equity, 600.0);
        assert_eq!(summary.total_revenue, 900.0);
        assert_eq!(summary.total_expenses, 300.0);
        assert_eq!(summary.net_profit_loss, 600.0);
        assert!(summary.verify_accounting_equation(0.01).is_ok());
    }

    #[test]
    fn test_without_fiscal_year_uses_all_entries() {
        let summary = calculate_summary(&chart(), &entries(), None).unwrap();
        assert_eq!(summary.total_revenue, 5900.0);
        assert!(summary.periodical_breakdown.is_none());
    }

    #[test]
    fn test_breakdown_requires_fiscal_year() {
        let result = calculate_summary_with_breakdown(&chart(), &entries(), None, Granularity::Monthly);
        assert!(matches!(result, Err(ReportingError::MissingFiscalYear(_))));
    }

    #[test]
    fn test_periodical_breakdown() {
        let fy = fiscal_year_2024();
        let summary =
            calculate_summary_with_breakdown(&chart(), &entries(), Some(&fy), Granularity::Monthly)
                .unwrap();
        let breakdown = summary.periodical_breakdown.unwrap();

        assert_eq!(breakdown.len(), 12);
        assert_eq!(breakdown[0].revenue, 900.0);
        assert_eq!(breakdown[1].expenses, 300.0);
        assert_eq!(breakdown[1].net_profit_loss, -300.0);
        let total: f64 = breakdown.iter().map(|p| p.net_profit_loss).sum();
        assert!((total - summary.net_profit_loss).abs() < 1e-9);
    }

    #[test]
    fn test_equation_violation_detected() {
        let fy = fiscal_year_2024();
        let mut unbalanced = entries();
        unbalanced.push(JournalEntry {
            id: Some("half".to_string()),
            date: ymd(2024, 4, 1),
            lines: vec![line("bank", Some(250.0), None)],
        });

        let summary = calculate_summary(&chart(), &unbalanced, Some(&fy)).unwrap();
        assert_eq!(summary.total_assets, 1750.0);
        assert!(summary.verify_accounting_equation(0.01).is_err());
    }

    #[test]
    fn test_classification_error_surfaces() {
        let mut chart = chart();
        chart.groups.push(AccountGroup {
            id: "broken".to_string(),
            name: "Broken".to_string(),
            main_type: MainType::Asset,
            is_fixed: false,
            parent_id: Some("deleted".to_string()),
            level: 1,
            accounts: vec![account("lost", 10.0)],
        });

        let err = calculate_summary(&chart, &entries(), None).unwrap_err();
        assert!(err.is_classification_error());
    }

    #[test]
    fn test_idempotent() {
        let fy = fiscal_year_2024();
        let a = calculate_summary_with_breakdown(&chart(), &entries(), Some(&fy), Granularity::Weekly)
            .unwrap();
        let b = calculate_summary_with_breakdown(&chart(), &entries(), Some(&fy), Granularity::Weekly)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_assets.to_bits(), b.total_assets.to_bits());
    }

    #[test]
    fn test_running_balances() {
        assert_eq!(running_balances(100.0, &[10.0, -30.0, 5.0]), vec![110.0, 80.0, 85.0]);
        assert!(running_balances(1.0, &[]).is_empty());
    }
}
