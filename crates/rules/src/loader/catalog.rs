//! [`RuleCatalog`]: loaded definition documents served as a [`RuleStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use indexmap::IndexMap;
use tracing::warn;

use crate::context::RuleConstants;
use crate::error::Result;
use crate::schema::{
    DefinitionDocument, ItemId, RuleConditionDefinition, RuleDefinition, RuleFilterDefinition,
    RuleId, RuleSetDocument, SelectorDefinition, SelectorId, WorkflowDefinitionId,
};
use crate::store::{PreloadedRules, RuleStore};

#[derive(Default)]
struct CatalogState {
    /// Documents keyed by `metadata.id`, in load order.
    documents: IndexMap<String, DefinitionDocument>,
    /// File each document was read from, for removal on delete events.
    sources: HashMap<PathBuf, String>,
    /// Flattened view of all documents, rebuilt on every change.
    index: PreloadedRules,
    /// Rule sets left out of the index, with the id collision that excluded them.
    rejected: HashMap<String, String>,
}

/// Ids a rule set claims in the flattened index. Two documents claiming the
/// same id would merge into one rule or selector.
fn claimed_ids(doc: &RuleSetDocument) -> Vec<(&'static str, i64)> {
    let mut ids = Vec::new();
    for activity in &doc.activities {
        for rule in &activity.rules {
            ids.push(("rule", rule.id));
            ids.extend(rule.conditions.iter().map(|c| ("condition", c.id)));
        }
        for selector in &activity.selectors {
            ids.push(("selector", selector.id));
            ids.extend(selector.filters.iter().map(|f| ("filter", f.id)));
        }
    }
    ids
}

impl CatalogState {
    /// Re-flatten every document in load order. A rule set reusing an id
    /// already claimed by an earlier document is not served.
    fn rebuild(&mut self) {
        let mut index = PreloadedRules::new();
        let mut constants: HashMap<WorkflowDefinitionId, RuleConstants> = HashMap::new();
        let mut owners: HashMap<(&'static str, i64), &str> = HashMap::new();
        let mut rejected = HashMap::new();
        for (doc_id, doc) in &self.documents {
            match doc {
                DefinitionDocument::RuleSet(rule_set) => {
                    let ids = claimed_ids(rule_set);
                    let collision = ids.iter().find_map(|key| {
                        owners
                            .get(key)
                            .map(|owner| format!("{} id {} is already defined by '{}'", key.0, key.1, owner))
                    });
                    if let Some(reason) = collision {
                        rejected.insert(doc_id.clone(), reason);
                        continue;
                    }
                    for key in ids {
                        owners.insert(key, doc_id);
                    }
                    index.add_rule_set(rule_set);
                }
                DefinitionDocument::Constants(c) => {
                    let merged = constants.entry(c.workflow_definition_id).or_default();
                    for (name, value) in c.constants.iter() {
                        merged.insert(name, value);
                    }
                }
            }
        }
        for (id, c) in constants {
            index.set_constants(id, c);
        }

        for (doc_id, reason) in &rejected {
            if self.rejected.get(doc_id) != Some(reason) {
                warn!(document_id = %doc_id, reason = %reason, "rule set not served, ids collide with another document");
            }
        }
        self.index = index;
        self.rejected = rejected;
    }
}

/// Thread-safe set of definition documents, shared between the loader,
/// its watcher and the evaluators reading from it.
#[derive(Default)]
pub struct RuleCatalog {
    state: RwLock<CatalogState>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document, remembering the file it came from.
    ///
    /// Returns why the document is not served when its ids collide with an
    /// earlier document. It stays in the catalog and is served once the
    /// collision goes away.
    pub fn upsert(&self, source: Option<&Path>, doc: DefinitionDocument) -> Option<String> {
        let mut state = self.state.write().expect("catalog lock poisoned");
        let id = doc.metadata().id.clone();
        if let Some(path) = source {
            // A file whose document id changed replaces its old document.
            if let Some(previous) = state.sources.insert(path.to_path_buf(), id.clone()) {
                if previous != id {
                    state.documents.shift_remove(&previous);
                }
            }
        }
        state.documents.insert(id.clone(), doc);
        state.rebuild();
        state.rejected.get(&id).cloned()
    }

    /// Remove a document by id.
    pub fn remove(&self, id: &str) -> Option<DefinitionDocument> {
        let mut state = self.state.write().expect("catalog lock poisoned");
        state.sources.retain(|_, doc_id| doc_id != id);
        let removed = state.documents.shift_remove(id);
        if removed.is_some() {
            state.rebuild();
        }
        removed
    }

    /// Remove the document that was loaded from `path`.
    pub fn remove_path(&self, path: &Path) -> Option<DefinitionDocument> {
        let id = {
            let state = self.state.read().expect("catalog lock poisoned");
            state.sources.get(path).cloned()
        }?;
        self.remove(&id)
    }

    pub fn document(&self, id: &str) -> Option<DefinitionDocument> {
        let state = self.state.read().expect("catalog lock poisoned");
        state.documents.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("catalog lock poisoned").documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_index<T>(&self, f: impl FnOnce(&PreloadedRules) -> Result<T>) -> Result<T> {
        let state = self.state.read().expect("catalog lock poisoned");
        f(&state.index)
    }
}

impl RuleStore for RuleCatalog {
    fn find_rules_by_item_id(&self, item_id: ItemId) -> Result<Vec<RuleDefinition>> {
        self.with_index(|i| i.find_rules_by_item_id(item_id))
    }

    fn find_condition_by_rule_id(&self, rule_id: RuleId) -> Result<Vec<RuleConditionDefinition>> {
        self.with_index(|i| i.find_condition_by_rule_id(rule_id))
    }

    fn find_selectors_by_item_id(&self, item_id: ItemId) -> Result<Vec<SelectorDefinition>> {
        self.with_index(|i| i.find_selectors_by_item_id(item_id))
    }

    fn find_filters_by_selector_id(&self, selector_id: SelectorId) -> Result<Vec<RuleFilterDefinition>> {
        self.with_index(|i| i.find_filters_by_selector_id(selector_id))
    }

    fn find_constants(&self, workflow_definition_id: WorkflowDefinitionId) -> Result<RuleConstants> {
        self.with_index(|i| i.find_constants(workflow_definition_id))
    }

    /// One read guard for the whole copy, so a reload cannot land between
    /// a rule and its conditions.
    fn preload(
        &self,
        item_ids: &[ItemId],
        workflow_definition_ids: &[WorkflowDefinitionId],
    ) -> Result<PreloadedRules> {
        self.with_index(|i| {
            PreloadedRules::load(i, item_ids.iter().copied(), workflow_definition_ids.iter().copied())
        })
    }
}
