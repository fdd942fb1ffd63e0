use crate::classification::AccountClassifier;
use crate::error::Result;
use crate::schema::{MainType, TenantChartOfAccounts};
use crate::utils::csv_field;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub id: String,
    pub number: String,
    pub name: String,
    pub group_name: String,
    pub main_type: MainType,
}

/// The chart of accounts grouped by effective main type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOverview {
    pub chart_name: String,
    pub tenant_id: String,
    pub assets: Vec<AccountEntry>,
    pub liabilities: Vec<AccountEntry>,
    pub equity: Vec<AccountEntry>,
    pub revenue: Vec<AccountEntry>,
    pub expenses: Vec<AccountEntry>,
}

impl ChartOverview {
    pub fn from_chart(chart: &TenantChartOfAccounts) -> Result<Self> {
        let classifier = AccountClassifier::classify(chart)?;
        Ok(Self::from_classifier(chart, &classifier))
    }

    pub fn from_classifier(chart: &TenantChartOfAccounts, classifier: &AccountClassifier<'_>) -> Self {
        let mut overview = Self {
            chart_name: chart.name.clone(),
            tenant_id: chart.tenant_id.clone(),
            assets: Vec::new(),
            liabilities: Vec::new(),
            equity: Vec::new(),
            revenue: Vec::new(),
            expenses: Vec::new(),
        };

        for classified in classifier.iter() {
            let entry = AccountEntry {
                id: classified.account.id.clone(),
                number: classified.account.number.clone(),
                name: classified.account.name.clone(),
                group_name: classified.group.name.clone(),
                main_type: classified.main_type,
            };
            overview.section_mut(classified.main_type).push(entry);
        }

        for main_type in MainType::ALL {
            overview
                .section_mut(main_type)
                .sort_by(|a, b| a.number.cmp(&b.number));
        }

        overview
    }

    pub fn section(&self, main_type: MainType) -> &[AccountEntry] {
        match main_type {
            MainType::Asset => &self.assets,
            MainType::Liability => &self.liabilities,
            MainType::Equity => &self.equity,
            MainType::Revenue => &self.revenue,
            MainType::Expense => &self.expenses,
        }
    }

    fn section_mut(&mut self, main_type: MainType) -> &mut Vec<AccountEntry> {
        match main_type {
            MainType::Asset => &mut self.assets,
            MainType::Liability => &mut self.liabilities,
            MainType::Equity => &mut self.equity,
            MainType::Revenue => &mut self.revenue,
            MainType::Expense => &mut self.expenses,
        }
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Section,Account Number,Account Name,Group\n");

        for main_type in MainType::ALL {
            for account in self.section(main_type) {
                output.push_str(&format!(
                    "{},{},{},{}\n",
                    main_type.label(),
                    csv_field(&account.number),
                    csv_field(&account.name),
                    csv_field(&account.group_name)
                ));
            }
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Chart of Accounts - {}\n\n", self.chart_name));

        output.push_str("## Balance Sheet\n\n");
        for main_type in [MainType::Asset, MainType::Liability, MainType::Equity] {
            self.push_markdown_section(&mut output, main_type);
        }

        output.push_str("## Profit & Loss\n\n");
        for main_type in [MainType::Revenue, MainType::Expense] {
            self.push_markdown_section(&mut output, main_type);
        }

        output
    }

    fn push_markdown_section(&self, output: &mut String, main_type: MainType) {
        output.push_str(&format!("### {}\n\n", main_type.label()));
        for account in self.section(main_type) {
            output.push_str(&format!(
                "- {} {} _({})_\n",
                account.number, account.name, account.group_name
            ));
        }
        output.push('\n');
    }

    pub fn total_accounts(&self) -> usize {
        MainType::ALL
            .iter()
            .map(|&main_type| self.section(main_type).len())
            .sum()
    }
}
