//! Definition validation with structured errors and suggestions.
//!
//! Catches configuration that would silently never match (unknown
//! operators, empty `IN` lists) or fail at evaluation time (non-numeric
//! `<` / `>` expressions). Findings are reported when definitions are
//! loaded; they never change how a definition evaluates.

pub mod fuzzy;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::schema::{
    ConstantsDocument, CriterionSpec, DefinitionDocument, Operator, RuleSetDocument,
    SUPPORTED_OPERATORS,
};

use fuzzy::{is_kebab_case, suggest_operator};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A finding that makes a definition misbehave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path-like location, e.g. `"activities[0].rules[1].conditions[0].operator"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// Validate a definition document of any kind.
pub fn validate_document(doc: &DefinitionDocument) -> ValidationResult {
    match doc {
        DefinitionDocument::RuleSet(rule_set) => validate_rule_set(rule_set),
        DefinitionDocument::Constants(constants) => validate_constants(constants),
    }
}

pub fn validate_rule_set(doc: &RuleSetDocument) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_metadata_id(&doc.metadata.id, &mut result);

    let mut item_ids = HashSet::new();
    let mut rule_ids = HashSet::new();
    let mut selector_ids = HashSet::new();
    let mut condition_ids = HashSet::new();
    let mut filter_ids = HashSet::new();

    for (a, activity) in doc.activities.iter().enumerate() {
        let base = format!("activities[{}]", a);
        if !item_ids.insert(activity.item_id) {
            result.error(
                format!("{}.itemId", base),
                format!("activity {} is defined twice", activity.item_id),
            );
        }

        for (r, rule) in activity.rules.iter().enumerate() {
            let path = format!("{}.rules[{}]", base, r);
            if !rule_ids.insert(rule.id) {
                result.error(format!("{}.id", path), format!("duplicate rule id {}", rule.id));
            }
            if rule.conditions.is_empty() {
                result.warn(
                    &path,
                    "rule has no conditions and is always satisfied (activity needs manual validation)",
                );
            }
            for (c, condition) in rule.conditions.iter().enumerate() {
                let path = format!("{}.conditions[{}]", path, c);
                if !condition_ids.insert(condition.id) {
                    result.error(
                        format!("{}.id", path),
                        format!("duplicate condition id {}", condition.id),
                    );
                }
                check_criterion(&path, condition, &mut result);
            }
        }

        for (s, selector) in activity.selectors.iter().enumerate() {
            let path = format!("{}.selectors[{}]", base, s);
            if !selector_ids.insert(selector.id) {
                result.error(
                    format!("{}.id", path),
                    format!("duplicate selector id {}", selector.id),
                );
            }
            if selector.group_id.trim().is_empty() {
                result.error(format!("{}.groupId", path), "groupId must not be empty");
            }
            if selector.filters.is_empty() {
                result.warn(&path, "selector has no filters and always grants its group");
            }
            for (f, filter) in selector.filters.iter().enumerate() {
                let path = format!("{}.filters[{}]", path, f);
                if !filter_ids.insert(filter.id) {
                    result.error(format!("{}.id", path), format!("duplicate filter id {}", filter.id));
                }
                check_criterion(&path, filter, &mut result);
            }
        }

        if !activity.rules.is_empty() && activity.selectors.is_empty() {
            result.warn(
                &base,
                "activity has rules but no selectors, so it always auto-validates",
            );
        }
    }

    result
}

pub fn validate_constants(doc: &ConstantsDocument) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_metadata_id(&doc.metadata.id, &mut result);
    for (name, _) in doc.constants.iter() {
        if name.trim().is_empty() {
            result.error("constants", "constant names must not be empty");
        }
    }
    if doc.constants.is_empty() {
        result.warn("constants", "no constants defined");
    }
    result
}

// ── Checks ──────────────────────────────────────────────────────────

fn check_metadata_id(id: &str, result: &mut ValidationResult) {
    if id.is_empty() {
        result.error("metadata.id", "id must not be empty");
    } else if !is_kebab_case(id) {
        result.warn("metadata.id", format!("id '{}' should be kebab-case", id));
    }
}

fn check_criterion(path: &str, criterion: &CriterionSpec, result: &mut ValidationResult) {
    if criterion.field.trim().is_empty() {
        result.error(format!("{}.field", path), "field must not be empty");
    }

    match &criterion.operator {
        Operator::Unknown(symbol) => {
            let message = format!(
                "unknown operator '{}' (expected one of {}); this criterion never holds",
                symbol,
                SUPPORTED_OPERATORS.join(", ")
            );
            match suggest_operator(symbol) {
                Some(s) => result.error_with_suggestion(
                    format!("{}.operator", path),
                    message,
                    format!("Did you mean '{}'?", s),
                ),
                None => result.error(format!("{}.operator", path), message),
            }
        }
        op if op.is_numeric() => {
            if criterion.expression.trim().parse::<f64>().is_err() {
                result.error(
                    format!("{}.expression", path),
                    format!(
                        "'{}' is not a number; evaluating '{}' will fail",
                        criterion.expression, op
                    ),
                );
            }
        }
        Operator::In => {
            if criterion.expression.split(',').any(str::is_empty) {
                result.warn(
                    format!("{}.expression", path),
                    "IN list contains an empty entry",
                );
            }
            if criterion.expression.split(',').any(|c| c != c.trim()) {
                result.warn(
                    format!("{}.expression", path),
                    "IN entries are compared untrimmed; surrounding spaces are significant",
                );
            }
        }
        _ => {}
    }
}
