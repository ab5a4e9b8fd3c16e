//! Account selection: which accounts may act on an activity.

use kinetix_core::{AccountStore, AccountUser};
use tracing::debug;

use crate::context::RuleContext;
use crate::error::Result;
use crate::schema::{RuleFilterDefinition, SelectorDefinition};
use crate::store::RuleStore;

use super::condition::evaluate_all;

/// Resolves the accounts granted by matching selectors.
pub struct RuleSelector;

impl RuleSelector {
    /// Accounts of every selector whose filters all hold, in selector order.
    ///
    /// Each matching selector contributes all members of its group. An
    /// account reachable through two matching selectors appears twice.
    pub fn select_accounts<S, A>(
        selectors: &[SelectorDefinition],
        store: &S,
        accounts: &A,
        ctx: &RuleContext,
    ) -> Result<Vec<AccountUser>>
    where
        S: RuleStore + ?Sized,
        A: AccountStore + ?Sized,
    {
        let mut selected = Vec::new();
        for selector in selectors {
            let filters = store.find_filters_by_selector_id(selector.id)?;
            if !Self::matches(&filters, ctx)? {
                continue;
            }

            let account_ids = accounts.get_account_ids(&selector.group_id)?;
            debug!(
                selector_id = selector.id,
                group_id = %selector.group_id,
                members = account_ids.len(),
                "selector matched"
            );
            for account_id in &account_ids {
                selected.push(accounts.get_account(account_id)?);
            }
        }
        Ok(selected)
    }

    /// Whether every filter holds. A selector without filters always matches.
    pub fn matches(filters: &[RuleFilterDefinition], ctx: &RuleContext) -> Result<bool> {
        evaluate_all(filters, ctx)
    }
}
