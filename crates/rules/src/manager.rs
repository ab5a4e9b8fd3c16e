//! [`RuleManager`]: validator and selector scoped to an activity definition.

use kinetix_core::{AccountStore, AccountUser};
use serde::Serialize;
use tracing::debug;

use crate::context::{RuleConstants, RuleContext};
use crate::error::Result;
use crate::evaluator::{RuleSelector, RuleValidator};
use crate::schema::{ItemId, WorkflowDefinitionId};
use crate::store::{PreloadedRules, RuleStore};

/// Entry point the workflow engine uses to ask "does this activity need a
/// human decision, and who may take it?".
///
/// The `*_in` variants evaluate against caller-supplied definitions (usually
/// a [`PreloadedRules`] snapshot) instead of the manager's own store.
pub struct RuleManager<S, A> {
    store: S,
    accounts: A,
}

impl<S: RuleStore, A: AccountStore> RuleManager<S, A> {
    pub fn new(store: S, accounts: A) -> Self {
        Self { store, accounts }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    /// Constants used to seed contexts for a workflow definition.
    pub fn get_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants> {
        self.store.find_constants(workflow_definition_id)
    }

    /// Build the context for an ad hoc evaluation of `object`.
    pub fn context_for<T: Serialize + ?Sized>(
        &self,
        object: &T,
        workflow_definition_id: WorkflowDefinitionId,
    ) -> Result<RuleContext> {
        let constants = self.get_constants(workflow_definition_id)?;
        RuleContext::from_object(object, &constants)
    }

    /// Whether any rule attached to the activity definition is satisfied.
    pub fn is_rule_valid(&self, item_id: ItemId, ctx: &RuleContext) -> Result<bool> {
        self.is_rule_valid_in(&self.store, item_id, ctx)
    }

    pub fn is_rule_valid_in<D: RuleStore + ?Sized>(
        &self,
        definitions: &D,
        item_id: ItemId,
        ctx: &RuleContext,
    ) -> Result<bool> {
        let rules = definitions.find_rules_by_item_id(item_id)?;
        let valid = RuleValidator::is_valid(&rules, definitions, ctx)?;
        debug!(item_id, rules = rules.len(), valid, "rule validity evaluated");
        Ok(valid)
    }

    /// Accounts allowed to act on the activity definition.
    pub fn select_accounts(&self, item_id: ItemId, ctx: &RuleContext) -> Result<Vec<AccountUser>> {
        self.select_accounts_in(&self.store, item_id, ctx)
    }

    pub fn select_accounts_in<D: RuleStore + ?Sized>(
        &self,
        definitions: &D,
        item_id: ItemId,
        ctx: &RuleContext,
    ) -> Result<Vec<AccountUser>> {
        let selectors = definitions.find_selectors_by_item_id(item_id)?;
        let accounts = RuleSelector::select_accounts(&selectors, definitions, &self.accounts, ctx)?;
        debug!(item_id, selectors = selectors.len(), accounts = accounts.len(), "accounts selected");
        Ok(accounts)
    }

    /// Snapshot the definitions of many activities for batch evaluation.
    pub fn preload<I, W>(&self, item_ids: I, workflow_definition_ids: W) -> Result<PreloadedRules>
    where
        I: IntoIterator<Item = ItemId>,
        W: IntoIterator<Item = WorkflowDefinitionId>,
    {
        let item_ids: Vec<ItemId> = item_ids.into_iter().collect();
        let workflow_definition_ids: Vec<WorkflowDefinitionId> = workflow_definition_ids.into_iter().collect();
        self.store.preload(&item_ids, &workflow_definition_ids)
    }
}
