//! YAML definition documents and their accessors.

use kinetix_core::GroupId;
use serde::{Deserialize, Deserializer, Serialize};

use super::{DocumentKind, ItemId, Operator, RuleId, SelectorId, WorkflowDefinitionId};
use crate::context::RuleConstants;

/// Metadata shared by every definition document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DocumentMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Rules and selectors for a set of activity definitions.
///
/// ```yaml
/// apiVersion: v1
/// kind: RuleSet
/// metadata: { id: purchase-approval, name: Purchase approval }
/// activities:
///   - itemId: 10
///     rules:
///       - id: 100
///         conditions:
///           - { id: 1000, field: amount, operator: ">", expression: "1000" }
///     selectors:
///       - id: 200
///         groupId: managers
///         filters:
///           - { id: 2000, field: region, operator: IN, expression: "EU,US" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSetDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub activities: Vec<ActivityRules>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivityRules {
    pub item_id: ItemId,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub id: RuleId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub conditions: Vec<CriterionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectorSpec {
    pub id: SelectorId,
    pub group_id: GroupId,
    #[serde(default)]
    pub filters: Vec<CriterionSpec>,
}

/// A condition or filter as written in YAML. Its id is a condition id or a
/// filter id depending on where it appears.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CriterionSpec {
    pub id: i64,
    pub field: String,
    pub operator: Operator,
    #[serde(deserialize_with = "string_or_number")]
    pub expression: String,
}

/// Constants attached to one workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstantsDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    pub workflow_definition_id: WorkflowDefinitionId,
    #[serde(default)]
    pub constants: RuleConstants,
}

/// A fully deserialized definition document of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionDocument {
    RuleSet(RuleSetDocument),
    Constants(ConstantsDocument),
}

impl DefinitionDocument {
    pub fn metadata(&self) -> &DocumentMetadata {
        match self {
            DefinitionDocument::RuleSet(doc) => &doc.metadata,
            DefinitionDocument::Constants(doc) => &doc.metadata,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            DefinitionDocument::RuleSet(_) => DocumentKind::RuleSet,
            DefinitionDocument::Constants(_) => DocumentKind::RuleConstants,
        }
    }

    pub fn as_rule_set(&self) -> Option<&RuleSetDocument> {
        match self {
            DefinitionDocument::RuleSet(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_constants(&self) -> Option<&ConstantsDocument> {
        match self {
            DefinitionDocument::Constants(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Accept `expression: 1000` as well as `expression: "1000"`.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expression must be a string or a number, got {:?}",
            other
        ))),
    }
}
