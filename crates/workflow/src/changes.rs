//! Write lists accumulated by a recalculation and flushed by the store.

use serde::{Deserialize, Serialize};

use crate::model::{ActivityId, WorkflowActivity, WorkflowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAutoUpdate {
    pub activity_id: ActivityId,
    pub is_auto: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentActivityUpdate {
    pub workflow_id: WorkflowId,
    pub activity_id: ActivityId,
}

/// Pending writes of one or more recalculations.
///
/// Nothing here has been persisted; [`WorkflowStore::apply`](crate::WorkflowStore::apply)
/// flushes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalculationChanges {
    pub activities_create: Vec<WorkflowActivity>,
    pub activities_update_is_auto: Vec<ActivityAutoUpdate>,
    pub workflows_update_current_activity: Vec<CurrentActivityUpdate>,
}

impl RecalculationChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_activity_create(&mut self, activity: WorkflowActivity) {
        self.activities_create.push(activity);
    }

    pub fn add_activity_update_is_auto(&mut self, activity_id: ActivityId, is_auto: bool) {
        self.activities_update_is_auto
            .push(ActivityAutoUpdate { activity_id, is_auto });
    }

    pub fn add_workflow_update_current_activity(&mut self, workflow_id: WorkflowId, activity_id: ActivityId) {
        self.workflows_update_current_activity
            .push(CurrentActivityUpdate { workflow_id, activity_id });
    }

    /// Append another workflow's changes after this one's.
    pub fn merge(&mut self, other: RecalculationChanges) {
        self.activities_create.extend(other.activities_create);
        self.activities_update_is_auto
            .extend(other.activities_update_is_auto);
        self.workflows_update_current_activity
            .extend(other.workflows_update_current_activity);
    }

    /// Total number of pending writes.
    pub fn len(&self) -> usize {
        self.activities_create.len()
            + self.activities_update_is_auto.len()
            + self.workflows_update_current_activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn merge_keeps_order() {
        let (w1, w2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut first = RecalculationChanges::new();
        first.add_activity_create(WorkflowActivity::new(w1, 10, true));
        first.add_workflow_update_current_activity(w1, Uuid::new_v4());

        let mut second = RecalculationChanges::new();
        second.add_activity_create(WorkflowActivity::new(w2, 10, false));
        second.add_activity_update_is_auto(Uuid::new_v4(), true);

        first.merge(second);
        assert_eq!(first.len(), 4);
        let owners: Vec<_> = first.activities_create.iter().map(|a| a.workflow_id).collect();
        assert_eq!(owners, vec![w1, w2]);
    }

    #[test]
    fn empty_by_default() {
        assert!(RecalculationChanges::new().is_empty());
    }
}
