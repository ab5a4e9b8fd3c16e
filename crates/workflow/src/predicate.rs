use kinetix_core::AccountStore;
use kinetix_rules::schema::ItemId;
use kinetix_rules::{RuleContext, RuleManager, RuleStore};
use tracing::debug;

use crate::error::Result;

/// Decides whether an activity definition needs a human decision.
///
/// Manual validation requires a matching rule **and** at least one account
/// allowed to decide. Accounts are only resolved once a rule matched.
pub struct AutoValidatePredicate<'a, S, A, D: ?Sized> {
    manager: &'a RuleManager<S, A>,
    definitions: &'a D,
}

impl<'a, S, A, D> AutoValidatePredicate<'a, S, A, D>
where
    S: RuleStore,
    A: AccountStore,
    D: RuleStore + ?Sized,
{
    /// Evaluate against `definitions`, either the manager's live store or a
    /// preloaded batch snapshot.
    pub fn new(manager: &'a RuleManager<S, A>, definitions: &'a D) -> Self {
        Self { manager, definitions }
    }

    pub fn requires_manual(&self, item_id: ItemId, ctx: &RuleContext) -> Result<bool> {
        if !self.manager.is_rule_valid_in(self.definitions, item_id, ctx)? {
            return Ok(false);
        }
        let accounts = self.manager.select_accounts_in(self.definitions, item_id, ctx)?;
        if accounts.is_empty() {
            debug!(item_id, "rule matched but no account may decide, auto-validating");
        }
        Ok(!accounts.is_empty())
    }
}
