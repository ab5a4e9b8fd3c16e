//! Definition lookups behind one trait, with a live and a preloaded shape.
//!
//! [`RuleStore`] is the read-only view of rule/selector definitions the
//! evaluator works against. A persistence adapter (or the YAML
//! [`RuleCatalog`](crate::loader::RuleCatalog)) implements it with per-id
//! fetches; [`PreloadedRules`] implements it over in-memory maps so batch
//! recalculation evaluates many workflows without a round trip per rule.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::RuleConstants;
use crate::error::Result;
use crate::schema::{
    ItemId, RuleConditionDefinition, RuleDefinition, RuleFilterDefinition, RuleId,
    RuleSetDocument, SelectorDefinition, SelectorId, WorkflowDefinitionId,
};

/// Read-only lookups of rule and selector definitions.
pub trait RuleStore: Send + Sync {
    /// Rules attached to an activity definition, in definition order.
    fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>>;

    /// Conditions of a rule, in definition order.
    fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>>;

    /// Selectors attached to an activity definition, in definition order.
    fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>>;

    /// Filters of a selector, in definition order.
    fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>>;

    /// Constants of a workflow definition (empty when none are defined).
    fn find_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants>;

    /// Copy everything the given activity and workflow definitions need.
    ///
    /// The default performs one lookup at a time. Stores that can change
    /// underneath a reader override it to copy from one consistent view.
    fn preload(
        &self,
        item_ids: &[ItemId],
        workflow_definition_ids: &[WorkflowDefinitionId],
    ) -> Result<PreloadedRules> {
        PreloadedRules::load(self, item_ids.iter().copied(), workflow_definition_ids.iter().copied())
    }
}

impl<T: RuleStore + ?Sized> RuleStore for &T {
    fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>> {
        (**self).find_rules_by_item_id(item_id)
    }

    fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>> {
        (**self).find_condition_by_rule_id(rule_id)
    }

    fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>> {
        (**self).find_selectors_by_item_id(item_id)
    }

    fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
        (**self).find_filters_by_selector_id(selector_id)
    }

    fn find_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants> {
        (**self).find_constants(workflow_definition_id)
    }

    fn preload(
        &self,
        item_ids: &[ItemId],
        workflow_definition_ids: &[WorkflowDefinitionId],
    ) -> Result<PreloadedRules> {
        (**self).preload(item_ids, workflow_definition_ids)
    }
}

impl<T: RuleStore + ?Sized> RuleStore for Arc<T> {
    fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>> {
        (**self).find_rules_by_item_id(item_id)
    }

    fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>> {
        (**self).find_condition_by_rule_id(rule_id)
    }

    fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>> {
        (**self).find_selectors_by_item_id(item_id)
    }

    fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
        (**self).find_filters_by_selector_id(selector_id)
    }

    fn find_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants> {
        (**self).find_constants(workflow_definition_id)
    }

    fn preload(
        &self,
        item_ids: &[ItemId],
        workflow_definition_ids: &[WorkflowDefinitionId],
    ) -> Result<PreloadedRules> {
        (**self).preload(item_ids, workflow_definition_ids)
    }
}

// ── Preloaded maps ──────────────────────────────────────────────────

/// In-memory definition maps keyed by activity, rule and selector id.
///
/// Ids absent from a map resolve to an empty list, never to an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadedRules {
    rules: HashMap<ItemId, Vec<RuleDefinition>>,
    conditions: HashMap<RuleId, Vec<RuleConditionDefinition>>,
    selectors: HashMap<ItemId, Vec<SelectorDefinition>>,
    filters: HashMap<SelectorId, Vec<RuleFilterDefinition>>,
    constants: HashMap<WorkflowDefinitionId, RuleConstants>,
}

impl PreloadedRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch everything the given activity and workflow definitions need
    /// from `store`, once.
    pub fn load<S, I, W>(store: &S, item_ids: I, workflow_definition_ids: W) -> Result<Self>
    where
        S: RuleStore + ?Sized,
        I: IntoIterator<Item = ItemId>,
        W: IntoIterator<Item = WorkflowDefinitionId>,
    {
        let mut preloaded = Self::new();
        for item_id in item_ids {
            if preloaded.rules.contains_key(&item_id) {
                continue;
            }
            let rules = store.find_rules_by_item_id(item_id)?;
            for rule in &rules {
                let conditions = store.find_condition_by_rule_id(rule.id)?;
                preloaded.conditions.insert(rule.id, conditions);
            }
            preloaded.rules.insert(item_id, rules);

            let selectors = store.find_selectors_by_item_id(item_id)?;
            for selector in &selectors {
                let filters = store.find_filters_by_selector_id(selector.id)?;
                preloaded.filters.insert(selector.id, filters);
            }
            preloaded.selectors.insert(item_id, selectors);
        }
        for workflow_definition_id in workflow_definition_ids {
            let constants = store.find_constants(workflow_definition_id)?;
            preloaded.constants.insert(workflow_definition_id, constants);
        }

        debug!(
            items = preloaded.rules.len(),
            rules = preloaded.conditions.len(),
            selectors = preloaded.filters.len(),
            "preloaded rule definitions"
        );
        Ok(preloaded)
    }

    pub fn add_rule(&mut self, rule: RuleDefinition) {
        self.conditions.entry(rule.id).or_default();
        self.rules.entry(rule.item_id).or_default().push(rule);
    }

    pub fn add_condition(&mut self, condition: RuleConditionDefinition) {
        self.conditions.entry(condition.rule_id).or_default().push(condition);
    }

    pub fn add_selector(&mut self, selector: SelectorDefinition) {
        self.filters.entry(selector.id).or_default();
        self.selectors.entry(selector.item_id).or_default().push(selector);
    }

    pub fn add_filter(&mut self, filter: RuleFilterDefinition) {
        self.filters.entry(filter.selector_id).or_default().push(filter);
    }

    pub fn set_constants(&mut self, workflow_definition_id: WorkflowDefinitionId, constants: RuleConstants) {
        self.constants.insert(workflow_definition_id, constants);
    }

    /// Flatten a YAML rule set into the maps.
    pub fn add_rule_set(&mut self, doc: &RuleSetDocument) {
        for activity in &doc.activities {
            for rule in &activity.rules {
                self.add_rule(RuleDefinition {
                    id: rule.id,
                    item_id: activity.item_id,
                    label: rule.label.clone(),
                });
                for c in &rule.conditions {
                    self.add_condition(RuleConditionDefinition {
                        id: c.id,
                        rule_id: rule.id,
                        field: c.field.clone(),
                        operator: c.operator.clone(),
                        expression: c.expression.clone(),
                    });
                }
            }
            for selector in &activity.selectors {
                self.add_selector(SelectorDefinition {
                    id: selector.id,
                    item_id: activity.item_id,
                    group_id: selector.group_id.clone(),
                });
                for f in &selector.filters {
                    self.add_filter(RuleFilterDefinition {
                        id: f.id,
                        selector_id: selector.id,
                        field: f.field.clone(),
                        operator: f.operator.clone(),
                        expression: f.expression.clone(),
                    });
                }
            }
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn selector_count(&self) -> usize {
        self.selectors.values().map(Vec::len).sum()
    }
}

impl RuleStore for PreloadedRules {
    fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>> {
        Ok(self.rules.get(&item_id).cloned().unwrap_or_default())
    }

    fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>> {
        Ok(self.conditions.get(&rule_id).cloned().unwrap_or_default())
    }

    fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>> {
        Ok(self.selectors.get(&item_id).cloned().unwrap_or_default())
    }

    fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
        Ok(self.filters.get(&selector_id).cloned().unwrap_or_default())
    }

    fn find_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants> {
        Ok(self
            .constants
            .get(&workflow_definition_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::schema::Operator;

    /// Live store stand-in that counts lookups.
    #[derive(Default)]
    struct CountingStore {
        inner: PreloadedRules,
        lookups: AtomicUsize,
    }

    impl CountingStore {
        fn hit(&self) {
            self.lookups.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RuleStore for CountingStore {
        fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>> {
            self.hit();
            self.inner.find_rules_by_item_id(item_id)
        }

        fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>> {
            self.hit();
            self.inner.find_condition_by_rule_id(rule_id)
        }

        fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>> {
            self.hit();
            self.inner.find_selectors_by_item_id(item_id)
        }

        fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
            self.hit();
            self.inner.find_filters_by_selector_id(selector_id)
        }

        fn find_constants(&self, id: WorkflowDefinitionId) -> Result<RuleConstants> {
            self.hit();
            self.inner.find_constants(id)
        }
    }

    fn sample() -> PreloadedRules {
        let mut p = PreloadedRules::new();
        p.add_rule(RuleDefinition { id: 1, item_id: 10, label: None });
        p.add_condition(RuleConditionDefinition {
            id: 100,
            rule_id: 1,
            field: "status".into(),
            operator: Operator::Eq,
            expression: "OPEN".into(),
        });
        p.add_selector(SelectorDefinition { id: 2, item_id: 10, group_id: "managers".into() });
        p.set_constants(7, [("currency", "EUR")].into_iter().collect());
        p
    }

    #[test]
    fn unknown_ids_resolve_to_empty() {
        let p = PreloadedRules::new();
        assert!(p.find_rules_by_item_id(1).unwrap().is_empty());
        assert!(p.find_condition_by_rule_id(1).unwrap().is_empty());
        assert!(p.find_selectors_by_item_id(1).unwrap().is_empty());
        assert!(p.find_filters_by_selector_id(1).unwrap().is_empty());
        assert!(p.find_constants(1).unwrap().is_empty());
    }

    #[test]
    fn load_copies_everything_once() {
        let live = CountingStore { inner: sample(), ..Default::default() };
        let preloaded = PreloadedRules::load(&live, [10, 10], [7]).unwrap();

        // rules + 1 condition lookup + selectors + 1 filter lookup + constants
        assert_eq!(live.lookups.load(Ordering::SeqCst), 5);
        assert_eq!(preloaded, sample());
    }

    /// Stand-in for a store with its own consistent copy.
    struct SnapshotStore(PreloadedRules);

    impl RuleStore for SnapshotStore {
        fn find_rules_by_item_id(&self, _: ItemId) -> Result<Vec<RuleDefinition>> {
            Ok(Vec::new())
        }

        fn find_condition_by_rule_id(&self, _: RuleId) -> Result<Vec<RuleConditionDefinition>> {
            Ok(Vec::new())
        }

        fn find_selectors_by_item_id(&self, _: ItemId) -> Result<Vec<SelectorDefinition>> {
            Ok(Vec::new())
        }

        fn find_filters_by_selector_id(&self, _: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
            Ok(Vec::new())
        }

        fn find_constants(&self, _: WorkflowDefinitionId) -> Result<RuleConstants> {
            Ok(RuleConstants::new())
        }

        fn preload(&self, _: &[ItemId], _: &[WorkflowDefinitionId]) -> Result<PreloadedRules> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn preload_override_survives_references_and_arcs() {
        let store = Arc::new(SnapshotStore(sample()));
        assert_eq!(store.preload(&[10], &[7]).unwrap(), sample());
        assert_eq!((&store).preload(&[10], &[7]).unwrap(), sample());
        assert_eq!((&*store).preload(&[10], &[7]).unwrap(), sample());
    }

    #[test]
    fn default_preload_looks_up_each_definition() {
        let live = CountingStore { inner: sample(), ..Default::default() };
        assert_eq!(live.preload(&[10], &[7]).unwrap(), sample());
        assert_eq!(live.lookups.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn counts() {
        let p = sample();
        assert_eq!(p.rule_count(), 1);
        assert_eq!(p.selector_count(), 1);
    }
}
