use kinetix_core::StoreError;
use kinetix_rules::RuleError;

use crate::model::{ActivityId, WorkflowId};

/// Errors raised by recalculation and decision handling.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("workflow {0} has no current activity")]
    NoCurrentActivity(WorkflowId),

    #[error("activity {activity_id} of workflow {workflow_id} is not awaiting a decision")]
    NotAwaitingDecision {
        workflow_id: WorkflowId,
        activity_id: ActivityId,
    },

    #[error("account '{username}' may not decide activity {activity_id}")]
    NotEligible {
        username: String,
        activity_id: ActivityId,
    },

    /// A single workflow of a batch failed; the batch was aborted.
    #[error("recalculation of workflow {workflow_id} failed: {source}")]
    Recalculation {
        workflow_id: WorkflowId,
        #[source]
        source: Box<WorkflowError>,
    },

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
