//! Auto-validation recalculation: single workflow (live lookups) and
//! parallel batches over preloaded definitions.

use std::collections::HashMap;

use kinetix_core::{AccountStore, ErrorPolicy, RecalculationConfig};
use kinetix_rules::schema::WorkflowDefinitionId;
use kinetix_rules::{PreloadedRules, RuleContext, RuleManager, RuleStore};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::changes::RecalculationChanges;
use crate::error::{Result, WorkflowError};
use crate::model::{ActivityDefinition, Workflow, WorkflowActivity, WorkflowId};
use crate::predicate::AutoValidatePredicate;
use crate::store::WorkflowStore;

/// Walk the activity sequence of one workflow and accumulate its writes.
///
/// `sequence` must be sorted by `order`. For every definition:
/// - a record approved by a human is passed over;
/// - manual, no record: create a pending manual activity, point at it, stop;
/// - manual, record not yet valid: point at it, stop;
/// - auto, no record: create an auto activity and continue;
/// - auto, record: mark it auto and continue.
///
/// When every definition is passed the pointer moves to the last activity.
/// The pointer is only written when it changes.
pub fn recalculate_workflow<S, A, D>(
    predicate: &AutoValidatePredicate<'_, S, A, D>,
    workflow: &Workflow,
    sequence: &[ActivityDefinition],
    activities: &[WorkflowActivity],
    ctx: &RuleContext,
) -> Result<RecalculationChanges>
where
    S: RuleStore,
    A: AccountStore,
    D: RuleStore + ?Sized,
{
    let mut changes = RecalculationChanges::new();
    let mut pointer = None;

    for definition in sequence {
        let existing = activities
            .iter()
            .find(|a| a.activity_definition_id == definition.id);

        if let Some(activity) = existing.filter(|a| a.is_valid) {
            pointer = Some(activity.id);
            continue;
        }

        let manual = predicate.requires_manual(definition.id, ctx)?;
        debug!(
            workflow_id = %workflow.id,
            activity = %definition.code,
            manual,
            existing = existing.is_some(),
            "activity evaluated"
        );

        match (manual, existing) {
            (true, None) => {
                let created = WorkflowActivity::new(workflow.id, definition.id, false);
                pointer = Some(created.id);
                changes.add_activity_create(created);
                break;
            }
            (true, Some(activity)) => {
                if activity.is_auto {
                    changes.add_activity_update_is_auto(activity.id, false);
                }
                pointer = Some(activity.id);
                break;
            }
            (false, None) => {
                let created = WorkflowActivity::new(workflow.id, definition.id, true);
                pointer = Some(created.id);
                changes.add_activity_create(created);
            }
            (false, Some(activity)) => {
                changes.add_activity_update_is_auto(activity.id, true);
                pointer = Some(activity.id);
            }
        }
    }

    if let Some(activity_id) = pointer {
        if workflow.current_activity_id != Some(activity_id) {
            changes.add_workflow_update_current_activity(workflow.id, activity_id);
        }
    }
    Ok(changes)
}

// ── Batch ───────────────────────────────────────────────────────────

/// Everything a batch needs, loaded up front so the parallel pass performs
/// no store round trips.
#[derive(Debug, Clone, Default)]
pub struct RecalculationBatch {
    pub definitions: PreloadedRules,
    /// Ordered activity definitions per workflow definition.
    pub sequences: HashMap<WorkflowDefinitionId, Vec<ActivityDefinition>>,
    /// Existing activities per workflow.
    pub activities: HashMap<WorkflowId, Vec<WorkflowActivity>>,
}

impl RecalculationBatch {
    pub fn load<S, A, W>(manager: &RuleManager<S, A>, store: &W, workflows: &[Workflow]) -> Result<Self>
    where
        S: RuleStore,
        A: AccountStore,
        W: WorkflowStore + ?Sized,
    {
        let mut sequences = HashMap::new();
        for workflow in workflows {
            if !sequences.contains_key(&workflow.workflow_definition_id) {
                let sequence = store.find_activity_definitions(workflow.workflow_definition_id)?;
                sequences.insert(workflow.workflow_definition_id, sequence);
            }
        }

        let mut activities = HashMap::new();
        for workflow in workflows {
            activities.insert(workflow.id, store.find_activities(workflow.id)?);
        }

        let item_ids: Vec<_> = sequences.values().flatten().map(|d| d.id).collect();
        let definitions = manager.preload(item_ids, sequences.keys().copied())?;

        Ok(Self {
            definitions,
            sequences,
            activities,
        })
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub changes: RecalculationChanges,
    pub recalculated: usize,
    /// Workflows skipped because their recalculation failed.
    pub failed: Vec<WorkflowId>,
}

/// Runs recalculations with a rule manager and the configured batch policy.
pub struct Recalculator<S, A> {
    manager: RuleManager<S, A>,
    config: RecalculationConfig,
}

impl<S: RuleStore, A: AccountStore> Recalculator<S, A> {
    pub fn new(manager: RuleManager<S, A>, config: RecalculationConfig) -> Self {
        Self { manager, config }
    }

    pub fn manager(&self) -> &RuleManager<S, A> {
        &self.manager
    }

    pub fn config(&self) -> &RecalculationConfig {
        &self.config
    }

    /// Context of a workflow: its subject plus the workflow definition's
    /// constants from `definitions`.
    pub fn context_for<D: RuleStore + ?Sized>(&self, workflow: &Workflow, definitions: &D) -> Result<RuleContext> {
        let constants = definitions.find_constants(workflow.workflow_definition_id)?;
        Ok(RuleContext::from_object(&workflow.subject, &constants)?)
    }

    /// Recalculate one workflow with live lookups.
    pub fn recalculate<W: WorkflowStore + ?Sized>(&self, store: &W, workflow: &Workflow) -> Result<RecalculationChanges> {
        let sequence = store.find_activity_definitions(workflow.workflow_definition_id)?;
        let activities = store.find_activities(workflow.id)?;
        let definitions = self.manager.store();
        let ctx = self.context_for(workflow, definitions)?;
        let predicate = AutoValidatePredicate::new(&self.manager, definitions);
        recalculate_workflow(&predicate, workflow, &sequence, &activities, &ctx)
    }

    /// Recalculate one workflow of a preloaded batch.
    pub fn recalculate_in(&self, batch: &RecalculationBatch, workflow: &Workflow) -> Result<RecalculationChanges> {
        let sequence = batch
            .sequences
            .get(&workflow.workflow_definition_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let activities = batch
            .activities
            .get(&workflow.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let ctx = self.context_for(workflow, &batch.definitions)?;
        let predicate = AutoValidatePredicate::new(&self.manager, &batch.definitions);
        recalculate_workflow(&predicate, workflow, sequence, activities, &ctx)
    }

    /// Recalculate many workflows in parallel.
    ///
    /// Each workflow is evaluated independently; the per-workflow changes
    /// are merged afterwards in the order of `workflows`.
    pub fn recalculate_all(&self, batch: &RecalculationBatch, workflows: &[Workflow]) -> Result<BatchOutcome> {
        let start = std::time::Instant::now();
        let run = || -> Vec<(WorkflowId, Result<RecalculationChanges>)> {
            workflows
                .par_iter()
                .map(|workflow| (workflow.id, self.recalculate_in(batch, workflow)))
                .collect()
        };
        let results = if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()?;
            pool.install(run)
        } else {
            run()
        };

        let mut outcome = BatchOutcome::default();
        for (workflow_id, result) in results {
            match result {
                Ok(changes) => {
                    outcome.changes.merge(changes);
                    outcome.recalculated += 1;
                }
                Err(e) => match self.config.on_error {
                    ErrorPolicy::Abort => {
                        return Err(WorkflowError::Recalculation {
                            workflow_id,
                            source: Box::new(e),
                        });
                    }
                    ErrorPolicy::Skip => {
                        warn!(workflow_id = %workflow_id, error = %e, "skipping workflow");
                        outcome.failed.push(workflow_id);
                    }
                },
            }
        }

        info!(
            workflows = workflows.len(),
            recalculated = outcome.recalculated,
            failed = outcome.failed.len(),
            writes = outcome.changes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch recalculation complete"
        );
        Ok(outcome)
    }
}
