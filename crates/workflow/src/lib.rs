//! Workflow auto-validation for Kinetix.
//!
//! Walks a workflow's ordered activity definitions, asks the rule engine
//! whether each one needs a human decision, and accumulates the resulting
//! activity and pointer writes as [`RecalculationChanges`]. Batches of
//! workflows are recalculated in parallel over preloaded definitions.

pub mod changes;
pub mod engine;
pub mod error;
pub mod model;
pub mod predicate;
pub mod recalculation;
pub mod scenario;
pub mod store;

pub use changes::{ActivityAutoUpdate, CurrentActivityUpdate, RecalculationChanges};
pub use engine::{DecisionOutcome, WorkflowEngine};
pub use error::{Result, WorkflowError};
pub use model::{
    ActivityDefinition, ActivityId, ActivityState, DecisionChoice, Workflow, WorkflowActivity,
    WorkflowDecision, WorkflowId,
};
pub use predicate::AutoValidatePredicate;
pub use recalculation::{BatchOutcome, RecalculationBatch, Recalculator};
pub use store::{InMemoryWorkflowStore, WorkflowStore};
