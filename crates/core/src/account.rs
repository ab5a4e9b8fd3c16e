//! Account collaborator: users, groups and the store that resolves them.
//!
//! The rule engine only reads from this store. Group membership is resolved
//! to a set of account ids, and each id is resolved to a full [`AccountUser`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Account identifier (login or external key).
pub type AccountId = String;

/// Account group identifier.
pub type GroupId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    pub id: AccountId,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub account_ids: BTreeSet<AccountId>,
}

/// Read access to groups and accounts.
pub trait AccountStore: Send + Sync {
    /// Member account ids of a group. An unknown group has no members.
    fn get_account_ids(&self, group_id: &str) -> Result<BTreeSet<AccountId>, StoreError>;

    /// Full account record for an id.
    fn get_account(&self, account_id: &str) -> Result<AccountUser, StoreError>;
}

impl<T: AccountStore + ?Sized> AccountStore for &T {
    fn get_account_ids(&self, group_id: &str) -> Result<BTreeSet<AccountId>, StoreError> {
        (**self).get_account_ids(group_id)
    }

    fn get_account(&self, account_id: &str) -> Result<AccountUser, StoreError> {
        (**self).get_account(account_id)
    }
}

impl<T: AccountStore + ?Sized> AccountStore for std::sync::Arc<T> {
    fn get_account_ids(&self, group_id: &str) -> Result<BTreeSet<AccountId>, StoreError> {
        (**self).get_account_ids(group_id)
    }

    fn get_account(&self, account_id: &str) -> Result<AccountUser, StoreError> {
        (**self).get_account(account_id)
    }
}

/// HashMap-backed account store, used by the CLI scenarios and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryAccountStore {
    #[serde(default)]
    accounts: HashMap<AccountId, AccountUser>,
    #[serde(default)]
    groups: HashMap<GroupId, AccountGroup>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from plain account and group lists.
    pub fn from_parts(accounts: Vec<AccountUser>, groups: Vec<AccountGroup>) -> Self {
        let mut store = Self::new();
        for account in accounts {
            store.add_account(account);
        }
        for group in groups {
            store.add_group(group);
        }
        store
    }

    pub fn add_account(&mut self, account: AccountUser) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn add_group(&mut self, group: AccountGroup) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get_account_ids(&self, group_id: &str) -> Result<BTreeSet<AccountId>, StoreError> {
        Ok(self
            .groups
            .get(group_id)
            .map(|g| g.account_ids.clone())
            .unwrap_or_default())
    }

    fn get_account(&self, account_id: &str) -> Result<AccountUser, StoreError> {
        self.accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("account", account_id))
    }
}
