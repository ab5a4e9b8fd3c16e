//! Rule evaluation: single criteria, rule sets (OR of ANDs) and selectors.
//!
//! - [`evaluate`] decides one `(field, operator, expression)` triple
//! - [`RuleValidator`] decides whether any rule of a set is satisfied
//! - [`RuleSelector`] resolves the accounts granted by matching selectors
//!
//! Rule sets and selectors fetch their conditions/filters through a
//! [`RuleStore`](crate::RuleStore), so live lookups and preloaded batch maps
//! share one code path.

mod condition;
mod selector;
mod validator;

pub use condition::{evaluate, evaluate_all};
pub use selector::RuleSelector;
pub use validator::RuleValidator;
