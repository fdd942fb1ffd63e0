//! Resolution of an account's effective main type through the group hierarchy.
//!
//! Only fixed groups carry an authoritative [`MainType`]; every other group inherits the type of
//! its nearest fixed ancestor. The hierarchy arrives as a flat list linked by `parent_id`, so it is
//! indexed once per call and each group is resolved at most once.

use crate::error::ClassificationError;
use crate::schema::{Account, AccountGroup, MainType, TenantChartOfAccounts};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 64;

/// Resolves the effective main type of `group` within `all_groups`.
pub fn resolve_main_type(
    group: &AccountGroup,
    all_groups: &[AccountGroup],
) -> Result<MainType, ClassificationError> {
    GroupIndex::new(all_groups).resolve(group)
}

pub struct GroupIndex<'a> {
    groups: HashMap<&'a str, &'a AccountGroup>,
    max_depth: usize,
}

impl<'a> GroupIndex<'a> {
    pub fn new(groups: &'a [AccountGroup]) -> Self {
        let mut index = HashMap::with_capacity(groups.len());
        for group in groups {
            if index.insert(group.id.as_str(), group).is_some() {
                warn!(
                    "Duplicate account group id '{}' in chart; the last definition wins",
                    group.id
                );
            }
        }

        Self {
            groups: index,
            max_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn get(&self, group_id: &str) -> Option<&'a AccountGroup> {
        self.groups.get(group_id).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn resolve_id(&self, group_id: &str) -> Result<MainType, ClassificationError> {
        let group = self
            .get(group_id)
            .ok_or_else(|| ClassificationError::UnknownGroup(group_id.to_string()))?;
        self.resolve(group)
    }

    /// Walks `parent_id` links until a fixed group is reached.
    pub fn resolve(&self, group: &AccountGroup) -> Result<MainType, ClassificationError> {
        if group.is_fixed {
            return Ok(group.main_type);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(group.id.as_str());
        let mut current_id = group.id.as_str();
        let mut parent_link = group.parent_id.as_deref();

        for _ in 0..self.max_depth {
            let parent_id = parent_link.ok_or_else(|| ClassificationError::Unanchored {
                group: group.id.clone(),
                root: current_id.to_string(),
            })?;

            let parent = self
                .get(parent_id)
                .ok_or_else(|| ClassificationError::MissingParent {
                    group: current_id.to_string(),
                    parent: parent_id.to_string(),
                })?;

            if parent.is_fixed {
                return Ok(parent.main_type);
            }

            if !visited.insert(parent.id.as_str()) {
                return Err(ClassificationError::HierarchyCycle {
                    group: group.id.clone(),
                    revisited: parent.id.clone(),
                });
            }

            current_id = parent.id.as_str();
            parent_link = parent.parent_id.as_deref();
        }

        Err(ClassificationError::DepthExceeded {
            group: group.id.clone(),
            depth: self.max_depth,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifiedAccount<'a> {
    pub account: &'a Account,
    pub group: &'a AccountGroup,
    pub main_type: MainType,
}

/// Every account of a chart with its resolved main type, in chart order.
pub struct AccountClassifier<'a> {
    accounts: Vec<ClassifiedAccount<'a>>,
    by_id: HashMap<&'a str, usize>,
}

impl<'a> AccountClassifier<'a> {
    pub fn classify(chart: &'a TenantChartOfAccounts) -> Result<Self, ClassificationError> {
        Self::classify_with_depth(chart, DEFAULT_MAX_HIERARCHY_DEPTH)
    }

    pub fn classify_with_depth(
        chart: &'a TenantChartOfAccounts,
        max_depth: usize,
    ) -> Result<Self, ClassificationError> {
        let index = GroupIndex::new(&chart.groups).with_max_depth(max_depth);
        let mut resolved: HashMap<&str, MainType> = HashMap::with_capacity(chart.groups.len());

        for group in &chart.groups {
            let main_type = index.resolve(group)?;
            if !group.is_fixed && main_type != group.main_type {
                debug!(
                    "Group '{}' records {:?} but inherits {:?} from its fixed ancestor",
                    group.name, group.main_type, main_type
                );
            }
            resolved.insert(group.id.as_str(), main_type);
        }

        let mut accounts = Vec::new();
        let mut by_id = HashMap::new();

        for (group, account) in chart.accounts() {
            let Some(&main_type) = resolved.get(group.id.as_str()) else {
                continue;
            };

            if by_id.contains_key(account.id.as_str()) {
                warn!(
                    "Account '{}' appears in more than one group; keeping the first",
                    account.id
                );
                continue;
            }

            by_id.insert(account.id.as_str(), accounts.len());
            accounts.push(ClassifiedAccount {
                account,
                group,
                main_type,
            });
        }

        debug!(
            "Classified {} accounts across {} groups",
            accounts.len(),
            chart.groups.len()
        );

        Ok(Self { accounts, by_id })
    }

    pub fn get(&self, account_id: &str) -> Option<&ClassifiedAccount<'a>> {
        self.by_id.get(account_id).map(|&idx| &self.accounts[idx])
    }

    pub fn main_type_of(&self, account_id: &str) -> Option<MainType> {
        self.get(account_id).map(|c| c.main_type)
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.by_id.contains_key(account_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedAccount<'a>> {
        self.accounts.iter()
    }

    pub fn of_type(&self, main_type: MainType) -> impl Iterator<Item = &ClassifiedAccount<'a>> {
        self.accounts
            .iter()
            .filter(move |c| c.main_type == main_type)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
