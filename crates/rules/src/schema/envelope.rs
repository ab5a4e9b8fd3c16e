//! Document kind and envelope for two-pass deserialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ConstantsDocument, DefinitionDocument, DocumentMetadata, RuleSetDocument};

/// Supported definition document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    RuleSet,
    RuleConstants,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::RuleSet => write!(f, "RuleSet"),
            DocumentKind::RuleConstants => write!(f, "RuleConstants"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "RuleSet" => Ok(DocumentKind::RuleSet),
            "RuleConstants" => Ok(DocumentKind::RuleConstants),
            other => Err(format!("unknown document kind: '{}'", other)),
        }
    }
}

/// Lightweight first-pass deserializer that reads only the header fields.
///
/// Used during two-pass loading: first extract `kind` to determine the
/// concrete type, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl DefinitionEnvelope {
    pub fn document_kind(&self) -> std::result::Result<DocumentKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<DefinitionDocument, String> {
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        match self.document_kind()? {
            DocumentKind::RuleSet => {
                let doc: RuleSetDocument = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;
                Ok(DefinitionDocument::RuleSet(doc))
            }
            DocumentKind::RuleConstants => {
                let doc: ConstantsDocument =
                    serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;
                Ok(DefinitionDocument::Constants(doc))
            }
        }
    }
}
