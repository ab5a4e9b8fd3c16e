//! Evaluation environment: the values a rule's fields are looked up in.
//!
//! A [`RuleContext`] is built once per evaluation from a business object
//! (any `Serialize` type, flattened to its top-level fields) plus the
//! [`RuleConstants`] of the workflow definition, and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RuleError};

// ── Values ──────────────────────────────────────────────────────────

/// A context value. Every variant carries its string representation, which
/// is what `=` and `IN` compare; `<` / `>` parse it as a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Text(String),
    /// A number kept in its textual form (`"1001"`, `"12.5"`).
    Number(String),
    List(Vec<String>),
}

impl RuleValue {
    pub fn text(value: impl Into<String>) -> Self {
        RuleValue::Text(value.into())
    }

    pub fn number(value: impl fmt::Display) -> Self {
        RuleValue::Number(value.to_string())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleValue::List(items.into_iter().map(Into::into).collect())
    }

    /// String form of a scalar value; `None` for lists.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            RuleValue::Text(s) | RuleValue::Number(s) => Some(s),
            RuleValue::List(_) => None,
        }
    }

    /// Convert a JSON value. Null and nested objects have no rule value.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Object(_) => None,
            Value::String(s) => Some(RuleValue::Text(s.clone())),
            Value::Number(n) => Some(RuleValue::Number(n.to_string())),
            Value::Bool(b) => Some(RuleValue::Text(b.to_string())),
            Value::Array(items) => Some(RuleValue::List(
                items.iter().filter_map(json_scalar_text).collect(),
            )),
        }
    }
}

fn json_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        RuleValue::Text(value.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(value: String) -> Self {
        RuleValue::Text(value)
    }
}

// ── Constants ───────────────────────────────────────────────────────

/// Named constants attached to a workflow definition, merged into every
/// context built for that definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleConstants {
    values: IndexMap<String, String>,
}

/// Accepts `threshold: 1000` and `enabled: true` as well as strings.
impl<'de> Deserialize<'de> for RuleConstants {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = IndexMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
        let mut values = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "constant `{}` must be a scalar, got {:?}",
                        name, other
                    )))
                }
            };
            values.insert(name, text);
        }
        Ok(Self { values })
    }
}

impl RuleConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RuleConstants {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ── Context ─────────────────────────────────────────────────────────

/// Immutable field → value map a rule is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleContext {
    values: HashMap<String, RuleValue>,
}

impl RuleContext {
    /// Build a context from a business object and the workflow constants.
    ///
    /// The object must serialize to a map; its top-level fields become
    /// context fields. Constants fill in names the object does not define.
    pub fn from_object<T: Serialize + ?Sized>(object: &T, constants: &RuleConstants) -> Result<Self> {
        let value = serde_json::to_value(object)
            .map_err(|e| RuleError::Context(format!("cannot serialize business object: {}", e)))?;
        Self::from_json(&value, constants)
    }

    /// Build a context from an already-serialized JSON object.
    pub fn from_json(object: &Value, constants: &RuleConstants) -> Result<Self> {
        let fields = object.as_object().ok_or_else(|| {
            RuleError::Context(format!(
                "business object must be a map of fields, got {}",
                json_kind(object)
            ))
        })?;

        let mut values: HashMap<String, RuleValue> = constants
            .iter()
            .map(|(k, v)| (k.to_string(), RuleValue::text(v)))
            .collect();
        for (name, value) in fields {
            match RuleValue::from_json(value) {
                Some(v) => {
                    values.insert(name.clone(), v);
                }
                None => {
                    values.remove(name);
                }
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, field: &str) -> Option<&RuleValue> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<RuleValue>> FromIterator<(K, V)> for RuleContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct PurchaseOrder {
        status: String,
        amount: u32,
        regions: Vec<String>,
        urgent: bool,
        approver: Option<String>,
    }

    fn order() -> PurchaseOrder {
        PurchaseOrder {
            status: "OPEN".to_string(),
            amount: 1500,
            regions: vec!["EU".to_string(), "US".to_string()],
            urgent: true,
            approver: None,
        }
    }

    #[test]
    fn flattens_business_object_fields() {
        let ctx = RuleContext::from_object(&order(), &RuleConstants::new()).unwrap();

        assert_eq!(ctx.get("status"), Some(&RuleValue::text("OPEN")));
        assert_eq!(ctx.get("amount"), Some(&RuleValue::number(1500)));
        assert_eq!(ctx.get("regions"), Some(&RuleValue::list(["EU", "US"])));
        assert_eq!(ctx.get("urgent"), Some(&RuleValue::text("true")));
        assert!(!ctx.contains("approver"), "null fields stay absent");
    }

    #[test]
    fn constants_fill_missing_fields_only() {
        let constants: RuleConstants = [("currency", "EUR"), ("status", "IGNORED")]
            .into_iter()
            .collect();
        let ctx = RuleContext::from_object(&order(), &constants).unwrap();

        assert_eq!(ctx.get("currency"), Some(&RuleValue::text("EUR")));
        assert_eq!(ctx.get("status"), Some(&RuleValue::text("OPEN")));
    }

    #[test]
    fn null_field_hides_constant_of_same_name() {
        let constants: RuleConstants = [("approver", "default")].into_iter().collect();
        let ctx = RuleContext::from_object(&order(), &constants).unwrap();
        assert!(!ctx.contains("approver"));
    }

    #[test]
    fn nested_objects_are_skipped() {
        let ctx = RuleContext::from_json(
            &json!({ "owner": { "name": "x" }, "code": "A1" }),
            &RuleConstants::new(),
        )
        .unwrap();
        assert_eq!(ctx.len(), 1);
        assert!(ctx.contains("code"));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = RuleContext::from_json(&json!("just a string"), &RuleConstants::new()).unwrap_err();
        assert!(matches!(err, RuleError::Context(_)));
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn yaml_constants_accept_scalars() {
        let constants: RuleConstants =
            serde_yaml::from_str("currency: EUR\nthreshold: 1000\nstrict: true\n").unwrap();
        assert_eq!(constants.get("threshold"), Some("1000"));
        assert_eq!(constants.get("strict"), Some("true"));
        assert_eq!(constants.iter().next(), Some(("currency", "EUR")));

        assert!(serde_yaml::from_str::<RuleConstants>("nested: [1, 2]\n").is_err());
    }

    #[test]
    fn float_numbers_keep_textual_form() {
        let ctx = RuleContext::from_json(&json!({ "rate": 12.5 }), &RuleConstants::new()).unwrap();
        assert_eq!(ctx.get("rate").and_then(RuleValue::as_scalar), Some("12.5"));
    }
}
