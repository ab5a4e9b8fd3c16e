//! Rule-set validity: a set is valid when any one rule has all its
//! conditions satisfied.

use tracing::debug;

use crate::context::RuleContext;
use crate::error::Result;
use crate::schema::{RuleConditionDefinition, RuleDefinition};
use crate::store::RuleStore;

use super::condition::evaluate_all;

/// Decides rule-set validity (OR across rules, AND across conditions).
pub struct RuleValidator;

impl RuleValidator {
    /// Whether at least one rule is satisfied, checking rules in order and
    /// stopping at the first satisfied one. An empty rule set is not valid.
    ///
    /// Conditions are fetched per rule from `store`: a live store costs one
    /// lookup per rule, a [`PreloadedRules`](crate::PreloadedRules) none.
    pub fn is_valid<S: RuleStore + ?Sized>(
        rules: &[RuleDefinition],
        store: &S,
        ctx: &RuleContext,
    ) -> Result<bool> {
        for rule in rules {
            let conditions = store.find_condition_by_rule_id(rule.id)?;
            if Self::is_satisfied(&conditions, ctx)? {
                debug!(rule_id = rule.id, conditions = conditions.len(), "rule satisfied");
                return Ok(true);
            }
        }
        debug!(rules = rules.len(), "no rule satisfied");
        Ok(false)
    }

    /// Whether every condition holds. A rule without conditions always holds.
    pub fn is_satisfied(conditions: &[RuleConditionDefinition], ctx: &RuleContext) -> Result<bool> {
        evaluate_all(conditions, ctx)
    }
}
