//! Workflow persistence seam and an in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kinetix_core::StoreError;
use kinetix_rules::schema::WorkflowDefinitionId;
use tracing::debug;

use crate::changes::RecalculationChanges;
use crate::model::{ActivityDefinition, ActivityId, Workflow, WorkflowActivity, WorkflowDecision, WorkflowId};

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Reads workflows, activity definitions, activities and decisions, and
/// flushes accumulated writes.
pub trait WorkflowStore: Send + Sync {
    fn get_workflow(&self, workflow_id: WorkflowId) -> StoreResult<Workflow>;

    fn list_workflows(&self) -> StoreResult<Vec<Workflow>>;

    /// Activity definitions of a workflow definition, sorted by `order`.
    fn find_activity_definitions(
        &self,
        workflow_definition_id: WorkflowDefinitionId,
    ) -> StoreResult<Vec<ActivityDefinition>>;

    fn find_activities(&self, workflow_id: WorkflowId) -> StoreResult<Vec<WorkflowActivity>>;

    fn find_decisions(&self, activity_id: ActivityId) -> StoreResult<Vec<WorkflowDecision>>;

    fn save_decision(&self, decision: WorkflowDecision) -> StoreResult<()>;

    fn set_activity_valid(&self, activity_id: ActivityId, is_valid: bool) -> StoreResult<()>;

    /// Persist recalculation changes.
    fn apply(&self, changes: &RecalculationChanges) -> StoreResult<()>;
}

impl<T: WorkflowStore + ?Sized> WorkflowStore for Arc<T> {
    fn get_workflow(&self, workflow_id: WorkflowId) -> StoreResult<Workflow> {
        (**self).get_workflow(workflow_id)
    }

    fn list_workflows(&self) -> StoreResult<Vec<Workflow>> {
        (**self).list_workflows()
    }

    fn find_activity_definitions(
        &self,
        workflow_definition_id: WorkflowDefinitionId,
    ) -> StoreResult<Vec<ActivityDefinition>> {
        (**self).find_activity_definitions(workflow_definition_id)
    }

    fn find_activities(&self, workflow_id: WorkflowId) -> StoreResult<Vec<WorkflowActivity>> {
        (**self).find_activities(workflow_id)
    }

    fn find_decisions(&self, activity_id: ActivityId) -> StoreResult<Vec<WorkflowDecision>> {
        (**self).find_decisions(activity_id)
    }

    fn save_decision(&self, decision: WorkflowDecision) -> StoreResult<()> {
        (**self).save_decision(decision)
    }

    fn set_activity_valid(&self, activity_id: ActivityId, is_valid: bool) -> StoreResult<()> {
        (**self).set_activity_valid(activity_id, is_valid)
    }

    fn apply(&self, changes: &RecalculationChanges) -> StoreResult<()> {
        (**self).apply(changes)
    }
}

// ── In-memory store ─────────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    /// Workflows in insertion order.
    workflows: Vec<Workflow>,
    definitions: Vec<ActivityDefinition>,
    activities: Vec<WorkflowActivity>,
    decisions: Vec<WorkflowDecision>,
}

impl StoreState {
    fn workflow_mut(&mut self, id: WorkflowId) -> StoreResult<&mut Workflow> {
        self.workflows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| StoreError::not_found("workflow", id))
    }

    fn activity_mut(&mut self, id: ActivityId) -> StoreResult<&mut WorkflowActivity> {
        self.activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found("activity", id))
    }
}

/// Workflow store held in memory, used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    state: RwLock<StoreState>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_workflow(&self, workflow: Workflow) {
        self.state.write().expect("workflow store lock poisoned").workflows.push(workflow);
    }

    pub fn add_activity_definition(&self, definition: ActivityDefinition) {
        self.state
            .write()
            .expect("workflow store lock poisoned")
            .definitions
            .push(definition);
    }

    pub fn add_activity(&self, activity: WorkflowActivity) {
        self.state.write().expect("workflow store lock poisoned").activities.push(activity);
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn get_workflow(&self, workflow_id: WorkflowId) -> StoreResult<Workflow> {
        let state = self.state.read().expect("workflow store lock poisoned");
        state
            .workflows
            .iter()
            .find(|w| w.id == workflow_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("workflow", workflow_id))
    }

    fn list_workflows(&self) -> StoreResult<Vec<Workflow>> {
        Ok(self.state.read().expect("workflow store lock poisoned").workflows.clone())
    }

    fn find_activity_definitions(
        &self,
        workflow_definition_id: WorkflowDefinitionId,
    ) -> StoreResult<Vec<ActivityDefinition>> {
        let state = self.state.read().expect("workflow store lock poisoned");
        let mut definitions: Vec<_> = state
            .definitions
            .iter()
            .filter(|d| d.workflow_definition_id == workflow_definition_id)
            .cloned()
            .collect();
        definitions.sort_by_key(|d| d.order);
        Ok(definitions)
    }

    fn find_activities(&self, workflow_id: WorkflowId) -> StoreResult<Vec<WorkflowActivity>> {
        let state = self.state.read().expect("workflow store lock poisoned");
        Ok(state
            .activities
            .iter()
            .filter(|a| a.workflow_id == workflow_id)
            .cloned()
            .collect())
    }

    fn find_decisions(&self, activity_id: ActivityId) -> StoreResult<Vec<WorkflowDecision>> {
        let state = self.state.read().expect("workflow store lock poisoned");
        Ok(state
            .decisions
            .iter()
            .filter(|d| d.activity_id == activity_id)
            .cloned()
            .collect())
    }

    fn save_decision(&self, decision: WorkflowDecision) -> StoreResult<()> {
        let mut state = self.state.write().expect("workflow store lock poisoned");
        state.activity_mut(decision.activity_id)?;
        state.decisions.push(decision);
        Ok(())
    }

    fn set_activity_valid(&self, activity_id: ActivityId, is_valid: bool) -> StoreResult<()> {
        let mut state = self.state.write().expect("workflow store lock poisoned");
        state.activity_mut(activity_id)?.is_valid = is_valid;
        Ok(())
    }

    fn apply(&self, changes: &RecalculationChanges) -> StoreResult<()> {
        let mut state = self.state.write().expect("workflow store lock poisoned");
        state.activities.extend(changes.activities_create.iter().cloned());
        for update in &changes.activities_update_is_auto {
            state.activity_mut(update.activity_id)?.is_auto = update.is_auto;
        }
        for update in &changes.workflows_update_current_activity {
            state.workflow_mut(update.workflow_id)?.current_activity_id = Some(update.activity_id);
        }
        debug!(writes = changes.len(), "applied recalculation changes");
        Ok(())
    }
}
