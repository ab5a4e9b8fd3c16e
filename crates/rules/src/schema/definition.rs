//! Flat rule/selector definitions as handed out by a [`RuleStore`](crate::RuleStore).

use kinetix_core::GroupId;
use serde::{Deserialize, Serialize};

use super::Operator;

pub type RuleId = i64;
pub type ConditionId = i64;
pub type SelectorId = i64;
pub type FilterId = i64;
/// Activity-definition id a rule or selector is attached to.
pub type ItemId = i64;
pub type WorkflowDefinitionId = i64;

/// One disjunct of an activity's rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub id: RuleId,
    pub item_id: ItemId,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditionDefinition {
    pub id: ConditionId,
    pub rule_id: RuleId,
    pub field: String,
    pub operator: Operator,
    pub expression: String,
}

/// Grants a group of accounts the right to act when all its filters hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorDefinition {
    pub id: SelectorId,
    pub item_id: ItemId,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFilterDefinition {
    pub id: FilterId,
    pub selector_id: SelectorId,
    pub field: String,
    pub operator: Operator,
    pub expression: String,
}

/// A `(field, operator, expression)` triple. Conditions and filters share
/// the same evaluation.
pub trait Criterion {
    fn field(&self) -> &str;
    fn operator(&self) -> &Operator;
    fn expression(&self) -> &str;
}

impl Criterion for RuleConditionDefinition {
    fn field(&self) -> &str {
        &self.field
    }

    fn operator(&self) -> &Operator {
        &self.operator
    }

    fn expression(&self) -> &str {
        &self.expression
    }
}

impl Criterion for RuleFilterDefinition {
    fn field(&self) -> &str {
        &self.field
    }

    fn operator(&self) -> &Operator {
        &self.operator
    }

    fn expression(&self) -> &str {
        &self.expression
    }
}
