use chrono::NaiveDate;
use thiserror::Error;

/// Structural problems in the account-group hierarchy. Any of these would corrupt totals, so
/// they are surfaced to the caller instead of being defaulted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Account group {0} does not exist in the chart of accounts")]
    UnknownGroup(String),

    #[error("Account group {group} points to parent {parent}, which does not exist")]
    MissingParent { group: String, parent: String },

    #[error("Account group {group} is part of a parent cycle (revisited {revisited})")]
    HierarchyCycle { group: String, revisited: String },

    #[error("Account group {group} has no fixed ancestor within {depth} levels")]
    DepthExceeded { group: String, depth: usize },

    #[error("Account group {group} reaches root group {root} without a fixed ancestor")]
    Unanchored { group: String, root: String },
}

#[derive(Error, Debug)]
pub enum ReportingError {
    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("A fiscal year is required to {0}")]
    MissingFiscalYear(String),

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Accounting equation violation: Assets ({assets}) != Liabilities ({liabilities}) + Equity ({equity}) + Net Profit/Loss ({net_profit_loss}), difference {difference}")]
    AccountingEquationViolation {
        assets: f64,
        liabilities: f64,
        equity: f64,
        net_profit_loss: f64,
        difference: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ReportingError {
    pub fn is_classification_error(&self) -> bool {
        matches!(self, Self::Classification(_))
    }
}

pub type Result<T> = std::result::Result<T, ReportingError>;
