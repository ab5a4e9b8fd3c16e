//! Filesystem definition loader with hot-reload via `notify` watcher.
//!
//! Reads `RuleSet` and `RuleConstants` YAML documents from a directory into
//! a [`RuleCatalog`], which serves them through [`RuleStore`](crate::RuleStore).
//! Documents are parsed in two passes (envelope, then concrete kind).

mod catalog;
mod core;
mod error;
mod watcher;


pub use self::catalog::RuleCatalog;
pub use self::core::{parse_document, RuleLoader};
pub use self::error::{LoadResult, LoadStatus};
