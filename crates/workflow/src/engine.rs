//! [`WorkflowEngine`]: recalculation and decisions against a workflow store.

use kinetix_core::AccountStore;
use kinetix_rules::RuleStore;
use serde::Serialize;
use tracing::info;

use crate::changes::RecalculationChanges;
use crate::error::{Result, WorkflowError};
use crate::model::{DecisionChoice, WorkflowDecision, WorkflowId};
use crate::recalculation::{BatchOutcome, RecalculationBatch, Recalculator};
use crate::store::WorkflowStore;

/// A recorded decision and the recalculation it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub decision: WorkflowDecision,
    pub changes: RecalculationChanges,
}

pub struct WorkflowEngine<W, S, A> {
    store: W,
    recalculator: Recalculator<S, A>,
}

impl<W: WorkflowStore, S: RuleStore, A: AccountStore> WorkflowEngine<W, S, A> {
    pub fn new(store: W, recalculator: Recalculator<S, A>) -> Self {
        Self { store, recalculator }
    }

    pub fn store(&self) -> &W {
        &self.store
    }

    pub fn recalculator(&self) -> &Recalculator<S, A> {
        &self.recalculator
    }

    /// Recalculate one workflow and persist the changes.
    pub fn recalculate(&self, workflow_id: WorkflowId) -> Result<RecalculationChanges> {
        let workflow = self.store.get_workflow(workflow_id)?;
        let changes = self.recalculator.recalculate(&self.store, &workflow)?;
        self.store.apply(&changes)?;
        Ok(changes)
    }

    /// Recalculate every workflow of the store as one batch and persist the
    /// merged changes.
    pub fn recalculate_all(&self) -> Result<BatchOutcome> {
        let workflows = self.store.list_workflows()?;
        let batch = RecalculationBatch::load(self.recalculator.manager(), &self.store, &workflows)?;
        let outcome = self.recalculator.recalculate_all(&batch, &workflows)?;
        self.store.apply(&outcome.changes)?;
        Ok(outcome)
    }

    /// Record a decision on the workflow's current activity.
    ///
    /// Only accounts the activity's selectors grant may decide. Approving
    /// validates the activity and recalculates, so following auto
    /// activities advance. Rejecting leaves the pointer where it is.
    pub fn save_decision(
        &self,
        workflow_id: WorkflowId,
        username: &str,
        choice: DecisionChoice,
        comments: Option<String>,
    ) -> Result<DecisionOutcome> {
        let workflow = self.store.get_workflow(workflow_id)?;
        let activity_id = workflow
            .current_activity_id
            .ok_or(WorkflowError::NoCurrentActivity(workflow_id))?;
        let activity = self
            .store
            .find_activities(workflow_id)?
            .into_iter()
            .find(|a| a.id == activity_id)
            .filter(|a| !a.is_auto && !a.is_valid)
            .ok_or(WorkflowError::NotAwaitingDecision {
                workflow_id,
                activity_id,
            })?;

        let manager = self.recalculator.manager();
        let ctx = self.recalculator.context_for(&workflow, manager.store())?;
        let eligible = manager.select_accounts(activity.activity_definition_id, &ctx)?;
        if !eligible.iter().any(|a| a.id == username) {
            return Err(WorkflowError::NotEligible {
                username: username.to_string(),
                activity_id,
            });
        }

        let decision = WorkflowDecision::new(activity_id, username, choice, comments);
        self.store.save_decision(decision.clone())?;
        info!(
            workflow_id = %workflow_id,
            activity_id = %activity_id,
            username,
            choice = %choice,
            "decision recorded"
        );

        let changes = match choice {
            DecisionChoice::Approve => {
                self.store.set_activity_valid(activity_id, true)?;
                self.recalculate(workflow_id)?
            }
            DecisionChoice::Reject => RecalculationChanges::new(),
        };
        Ok(DecisionOutcome { decision, changes })
    }
}

#[cfg(test)]
mod tests {
    use kinetix_core::{AccountGroup, AccountUser, InMemoryAccountStore, RecalculationConfig};
    use kinetix_rules::schema::{Operator, RuleConditionDefinition, RuleDefinition, SelectorDefinition};
    use kinetix_rules::{PreloadedRules, RuleManager};
    use serde_json::json;

    use super::*;
    use crate::model::{ActivityDefinition, ActivityState, Workflow};
    use crate::store::InMemoryWorkflowStore;

    type Engine = WorkflowEngine<InMemoryWorkflowStore, PreloadedRules, InMemoryAccountStore>;

    fn engine() -> (Engine, WorkflowId) {
        let mut rules = PreloadedRules::new();
        rules.add_rule(RuleDefinition { id: 1, item_id: 10, label: None });
        rules.add_condition(RuleConditionDefinition {
            id: 1,
            rule_id: 1,
            field: "amount".into(),
            operator: Operator::Gt,
            expression: "1000".into(),
        });
        rules.add_selector(SelectorDefinition { id: 1, item_id: 10, group_id: "managers".into() });

        let accounts = InMemoryAccountStore::from_parts(
            vec![
                AccountUser { id: "anna".into(), display_name: "Anna".into(), email: None },
                AccountUser { id: "otto".into(), display_name: "Otto".into(), email: None },
            ],
            vec![AccountGroup {
                id: "managers".into(),
                name: "Managers".into(),
                account_ids: ["anna".to_string()].into_iter().collect(),
            }],
        );

        let store = InMemoryWorkflowStore::new();
        for (order, id) in [10, 11].into_iter().enumerate() {
            store.add_activity_definition(ActivityDefinition {
                id,
                workflow_definition_id: 1,
                code: format!("step-{}", id),
                order: order as i32,
            });
        }
        let serde_json::Value::Object(subject) = json!({ "amount": 5000 }) else {
            unreachable!()
        };
        let wf = Workflow::new(1, "PO-7").with_subject(subject);
        let id = wf.id;
        store.add_workflow(wf);

        let recalculator = Recalculator::new(
            RuleManager::new(rules, accounts),
            RecalculationConfig::default(),
        );
        let engine = WorkflowEngine::new(store, recalculator);
        engine.recalculate(id).unwrap();
        (engine, id)
    }

    fn current_state(engine: &Engine, id: WorkflowId) -> (i64, ActivityState) {
        let wf = engine.store().get_workflow(id).unwrap();
        let current = wf.current_activity_id.unwrap();
        let activity = engine
            .store()
            .find_activities(id)
            .unwrap()
            .into_iter()
            .find(|a| a.id == current)
            .unwrap();
        let decisions = engine.store().find_decisions(current).unwrap();
        (
            activity.activity_definition_id,
            ActivityState::classify(Some(&activity), &decisions),
        )
    }

    #[test]
    fn recalculation_stops_at_manual_activity() {
        let (engine, id) = engine();
        assert_eq!(current_state(&engine, id), (10, ActivityState::PendingManual));
    }

    #[test]
    fn approval_advances_past_auto_activities() {
        let (engine, id) = engine();
        let outcome = engine
            .save_decision(id, "anna", DecisionChoice::Approve, Some("ok".into()))
            .unwrap();
        assert_eq!(outcome.decision.username, "anna");
        assert_eq!(outcome.changes.activities_create.len(), 1);
        assert_eq!(current_state(&engine, id), (11, ActivityState::PendingAuto));
    }

    #[test]
    fn rejection_keeps_the_pointer() {
        let (engine, id) = engine();
        let outcome = engine
            .save_decision(id, "anna", DecisionChoice::Reject, None)
            .unwrap();
        assert!(outcome.changes.is_empty());
        assert_eq!(current_state(&engine, id), (10, ActivityState::Invalid));

        // a rejected activity can still be approved later
        engine.save_decision(id, "anna", DecisionChoice::Approve, None).unwrap();
        assert_eq!(current_state(&engine, id).0, 11);
    }

    #[test]
    fn only_selected_accounts_may_decide() {
        let (engine, id) = engine();
        let err = engine
            .save_decision(id, "otto", DecisionChoice::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotEligible { .. }));
    }

    #[test]
    fn auto_activity_takes_no_decision() {
        let (engine, id) = engine();
        engine.save_decision(id, "anna", DecisionChoice::Approve, None).unwrap();
        let err = engine
            .save_decision(id, "anna", DecisionChoice::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotAwaitingDecision { .. }));
    }

    #[test]
    fn fresh_workflow_has_no_current_activity() {
        let (engine, _) = engine();
        let wf = Workflow::new(1, "PO-8");
        let id = wf.id;
        engine.store().add_workflow(wf);
        let err = engine
            .save_decision(id, "anna", DecisionChoice::Approve, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoCurrentActivity(_)));
    }
}
