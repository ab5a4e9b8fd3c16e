//! Workflow instances, their activities and the decisions taken on them.

use std::fmt;

use chrono::{DateTime, Utc};
use kinetix_rules::schema::{ItemId, WorkflowDefinitionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type ActivityId = Uuid;

/// One ordered step of a workflow template. `id` is the item id rules and
/// selectors are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: ItemId,
    pub workflow_definition_id: WorkflowDefinitionId,
    pub code: String,
    /// Position in the sequence; lower runs first.
    pub order: i32,
}

/// A running workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub workflow_definition_id: WorkflowDefinitionId,
    /// Business key of the object the workflow is about (order number, ...).
    #[serde(default)]
    pub reference: String,
    /// The activity awaiting work, if the workflow has been recalculated.
    #[serde(default)]
    pub current_activity_id: Option<ActivityId>,
    /// Snapshot of the business object's fields, evaluated by the rules.
    #[serde(default)]
    pub subject: Map<String, Value>,
}

impl Workflow {
    pub fn new(workflow_definition_id: WorkflowDefinitionId, reference: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_definition_id,
            reference: reference.into(),
            current_activity_id: None,
            subject: Map::new(),
        }
    }

    pub fn with_subject(mut self, subject: Map<String, Value>) -> Self {
        self.subject = subject;
        self
    }
}

/// Record of an activity definition reached by a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowActivity {
    pub id: ActivityId,
    pub workflow_id: WorkflowId,
    pub activity_definition_id: ItemId,
    pub is_auto: bool,
    /// Set once a human approved the activity.
    pub is_valid: bool,
}

impl WorkflowActivity {
    pub fn new(workflow_id: WorkflowId, activity_definition_id: ItemId, is_auto: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            activity_definition_id,
            is_auto,
            is_valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionChoice {
    Approve,
    Reject,
}

impl fmt::Display for DecisionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionChoice::Approve => write!(f, "approve"),
            DecisionChoice::Reject => write!(f, "reject"),
        }
    }
}

/// A human decision on a manual activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDecision {
    pub id: Uuid,
    pub activity_id: ActivityId,
    pub username: String,
    pub choice: DecisionChoice,
    #[serde(default)]
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowDecision {
    pub fn new(
        activity_id: ActivityId,
        username: impl Into<String>,
        choice: DecisionChoice,
        comments: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_id,
            username: username.into(),
            choice,
            comments,
            created_at: Utc::now(),
        }
    }
}

/// Where an activity definition stands for one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityState {
    NoActivityRecord,
    /// Auto-validated by the last recalculation; no decision is expected.
    PendingAuto,
    /// Waiting for a human decision.
    PendingManual,
    Validated,
    /// The latest decision rejected the activity.
    Invalid,
}

impl ActivityState {
    /// Classify an activity record given its decisions (in any order).
    pub fn classify(record: Option<&WorkflowActivity>, decisions: &[WorkflowDecision]) -> Self {
        let Some(activity) = record else {
            return ActivityState::NoActivityRecord;
        };
        if activity.is_valid {
            return ActivityState::Validated;
        }
        if activity.is_auto {
            return ActivityState::PendingAuto;
        }
        let latest = decisions
            .iter()
            .filter(|d| d.activity_id == activity.id)
            .max_by_key(|d| d.created_at);
        match latest.map(|d| d.choice) {
            Some(DecisionChoice::Reject) => ActivityState::Invalid,
            _ => ActivityState::PendingManual,
        }
    }

    /// Whether the workflow may advance past this activity.
    pub fn is_passed(self) -> bool {
        matches!(self, ActivityState::PendingAuto | ActivityState::Validated)
    }
}
