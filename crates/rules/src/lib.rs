//! Data-driven business rule evaluation for Kinetix workflows.
//!
//! This crate provides:
//! - [`RuleContext`]: the field/value environment a rule is evaluated against
//! - A condition evaluator for `(field, operator, expression)` triples
//! - [`RuleValidator`] (OR of rules, AND of conditions) and [`RuleSelector`]
//!   (accounts eligible to act, resolved through group membership)
//! - [`RuleStore`] with a live and a preloaded (batch) implementation
//! - [`RuleManager`], the entry point used by the workflow engine
//! - A YAML definition loader with hot reload, and a definition validation pass

pub mod context;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod manager;
pub mod schema;
pub mod store;
pub mod validation;

pub use context::{RuleConstants, RuleContext, RuleValue};
pub use error::{Result, RuleError};
pub use evaluator::{evaluate, RuleSelector, RuleValidator};
pub use manager::RuleManager;
pub use store::{PreloadedRules, RuleStore};
