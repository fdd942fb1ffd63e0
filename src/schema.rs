use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type AccountId = String;
pub type GroupId = String;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum MainType {
    #[schemars(description = "Resources owned by the business (Balance Sheet, debit balance)")]
    Asset,

    #[schemars(description = "Obligations owed to creditors (Balance Sheet, credit balance)")]
    Liability,

    #[schemars(description = "Owner's residual interest (Balance Sheet, credit balance)")]
    Equity,

    #[schemars(description = "Income earned over a period (Profit & Loss, credit balance)")]
    Revenue,

    #[schemars(description = "Costs incurred over a period (Profit & Loss, debit balance)")]
    Expense,
}

impl MainType {
    pub const ALL: [MainType; 5] = [
        MainType::Asset,
        MainType::Liability,
        MainType::Equity,
        MainType::Revenue,
        MainType::Expense,
    ];

    /// Asset, Liability and Equity accounts carry a cumulative balance.
    pub fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Revenue and Expense accounts are measured as period flows.
    pub fn is_profit_and_loss(self) -> bool {
        !self.is_balance_sheet()
    }

    pub fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// Multiplier turning a debit-minus-credit net into an increase on the account's normal side.
    pub fn normal_sign(self) -> f64 {
        if self.is_debit_normal() {
            1.0
        } else {
            -1.0
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Asset => "Assets",
            Self::Liability => "Liabilities",
            Self::Equity => "Equity",
            Self::Revenue => "Revenue",
            Self::Expense => "Expenses",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Account {
    pub id: AccountId,

    #[schemars(description = "Account number as shown in the chart of accounts (e.g. '1200')")]
    pub number: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Opening balance carried into the active fiscal year. Written only by the carry-forward operation."
    )]
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccountGroup {
    pub id: GroupId,

    pub name: String,

    #[schemars(
        description = "Main type recorded on the group. Authoritative only when is_fixed is true; otherwise the nearest fixed ancestor decides."
    )]
    pub main_type: MainType,

    #[serde(default)]
    #[schemars(description = "True for the canonical top-level group of a main type")]
    pub is_fixed: bool,

    #[serde(default)]
    pub parent_id: Option<GroupId>,

    #[serde(default)]
    pub level: u32,

    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TenantChartOfAccounts {
    pub id: String,

    pub tenant_id: String,

    pub name: String,

    #[schemars(description = "Flat list of groups; the hierarchy is rebuilt from parent_id links")]
    pub groups: Vec<AccountGroup>,
}

impl TenantChartOfAccounts {
    /// Every account paired with the group that owns it, in chart order.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountGroup, &Account)> {
        self.groups
            .iter()
            .flat_map(|group| group.accounts.iter().map(move |account| (group, account)))
    }

    pub fn find_account(&self, account_id: &str) -> Option<&Account> {
        self.accounts()
            .map(|(_, account)| account)
            .find(|account| account.id == account_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FiscalYear {
    pub id: String,

    pub name: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[serde(default)]
    pub is_closed: bool,

    #[serde(default)]
    pub carry_forward_source_fiscal_year_id: Option<String>,
}

impl FiscalYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct JournalEntryLine {
    pub account_id: AccountId,

    #[serde(default)]
    pub debit: Option<f64>,

    #[serde(default)]
    pub credit: Option<f64>,
}

impl JournalEntryLine {
    pub fn debit_amount(&self) -> f64 {
        self.debit.unwrap_or(0.0)
    }

    pub fn credit_amount(&self) -> f64 {
        self.credit.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct JournalEntry {
    #[serde(default)]
    pub id: Option<String>,

    pub date: NaiveDate,

    #[serde(default)]
    pub lines: Vec<JournalEntryLine>,
}

impl JournalEntry {
    pub fn total_debit(&self) -> f64 {
        self.lines.iter().map(JournalEntryLine::debit_amount).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.lines.iter().map(JournalEntryLine::credit_amount).sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Recurrence {
    #[default]
    None,
    Monthly,
    Bimonthly,
    Quarterly,
    EveryFourMonths,
    Semiannually,
    Yearly,

    /// Any recurrence tag this version does not know about.
    #[serde(other)]
    Unsupported,
}

impl Recurrence {
    /// Calendar months between two occurrences, or `None` when the value does not repeat.
    pub fn month_step(self) -> Option<u32> {
        match self {
            Self::Monthly => Some(1),
            Self::Bimonthly => Some(2),
            Self::Quarterly => Some(3),
            Self::EveryFourMonths => Some(4),
            Self::Semiannually => Some(6),
            Self::Yearly => Some(12),
            Self::None | Self::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Scenario {
    #[default]
    Actual,
    BestCase,
    WorstCase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum BudgetEntryKind {
    #[schemars(description = "Projected income; increases profit")]
    Income {
        #[serde(default)]
        #[schemars(description = "Optional balance-sheet account the income settles into")]
        counter_account_id: Option<AccountId>,
    },

    #[schemars(description = "Projected expense; decreases profit")]
    Expense {
        #[serde(default)]
        #[schemars(description = "Optional balance-sheet account the expense is paid from")]
        counter_account_id: Option<AccountId>,
    },

    #[schemars(
        description = "Moves balance from account_id (source) to counter_account_id (destination) without profit/loss effect"
    )]
    Transfer { counter_account_id: AccountId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BudgetEntry {
    #[serde(default)]
    pub id: Option<String>,

    pub account_id: AccountId,

    #[serde(flatten)]
    pub kind: BudgetEntryKind,

    pub amount_actual: f64,

    #[serde(default)]
    #[schemars(description = "Falls back to amount_actual when absent")]
    pub amount_best_case: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Falls back to amount_actual when absent")]
    pub amount_worst_case: Option<f64>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    pub recurrence: Recurrence,
}

impl BudgetEntry {
    pub fn amount_for(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::Actual => self.amount_actual,
            Scenario::BestCase => self.amount_best_case.unwrap_or(self.amount_actual),
            Scenario::WorstCase => self.amount_worst_case.unwrap_or(self.amount_actual),
        }
    }

    pub fn counter_account_id(&self) -> Option<&str> {
        match &self.kind {
            BudgetEntryKind::Income { counter_account_id }
            | BudgetEntryKind::Expense { counter_account_id } => counter_account_id.as_deref(),
            BudgetEntryKind::Transfer { counter_account_id } => Some(counter_account_id),
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self.kind, BudgetEntryKind::Transfer { .. })
    }

    /// Recurs only when flagged as recurring and a repeating recurrence is attached.
    pub fn repeats(&self) -> bool {
        self.is_recurring && self.recurrence != Recurrence::None
    }
}

/// Everything the persistence layer hands over for one tenant request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TenantSnapshot {
    pub chart: TenantChartOfAccounts,

    #[serde(default)]
    pub fiscal_year: Option<FiscalYear>,

    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,

    #[serde(default)]
    pub budget_entries: Vec<BudgetEntry>,
}

impl TenantSnapshot {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TenantSnapshot)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
