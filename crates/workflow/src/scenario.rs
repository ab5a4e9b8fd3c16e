//! YAML scenario files: accounts, activity definitions, workflows and their
//! existing activities, loaded into in-memory stores.

use std::path::Path;

use kinetix_core::{AccountGroup, AccountUser, InMemoryAccountStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::model::{ActivityDefinition, Workflow, WorkflowActivity};
use crate::store::InMemoryWorkflowStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub accounts: Vec<AccountUser>,
    #[serde(default)]
    pub groups: Vec<AccountGroup>,
    #[serde(default)]
    pub activity_definitions: Vec<ActivityDefinition>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub activities: Vec<WorkflowActivity>,
}

impl Scenario {
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let scenario = Self::from_yaml(&contents)?;
        info!(
            path = %path.display(),
            accounts = scenario.accounts.len(),
            workflows = scenario.workflows.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }

    pub fn into_stores(self) -> (InMemoryAccountStore, InMemoryWorkflowStore) {
        let accounts = InMemoryAccountStore::from_parts(self.accounts, self.groups);
        let store = InMemoryWorkflowStore::new();
        for definition in self.activity_definitions {
            store.add_activity_definition(definition);
        }
        for workflow in self.workflows {
            store.add_workflow(workflow);
        }
        for activity in self.activities {
            store.add_activity(activity);
        }
        (accounts, store)
    }
}
