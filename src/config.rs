use crate::classification::DEFAULT_MAX_HIERARCHY_DEPTH;
use crate::error::{ReportingError, Result};
use crate::periods::Granularity;
use crate::schema::Scenario;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ReportingConfig {
    #[schemars(description = "Bucket size for periodical breakdowns and chart series")]
    pub granularity: Granularity,

    #[schemars(
        description = "Maximum number of parent links followed when resolving a group's main type"
    )]
    pub max_hierarchy_depth: usize,

    #[schemars(
        description = "Absolute difference tolerated between debits and credits before a journal entry is reported as unbalanced"
    )]
    pub balance_tolerance: f64,

    #[schemars(description = "Scenario used for single-figure projections such as variances")]
    pub scenario: Scenario,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
            balance_tolerance: 0.005,
            scenario: Scenario::Actual,
        }
    }
}

impl ReportingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_hierarchy_depth == 0 {
            return Err(ReportingError::InvalidConfig(
                "max_hierarchy_depth must be at least 1".to_string(),
            ));
        }

        if !self.balance_tolerance.is_finite() || self.balance_tolerance < 0.0 {
            return Err(ReportingError::InvalidConfig(format!(
                "balance_tolerance must be a non-negative number (got {})",
                self.balance_tolerance
            )));
        }

        Ok(())
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}
