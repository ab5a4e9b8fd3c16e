//! Shared building blocks for the Kinetix rule and workflow crates.
//!
//! - Environment configuration with profile overrides
//! - The account collaborator (groups, users, store trait)
//! - The store error every collaborator reports through

pub mod account;
pub mod config;
pub mod error;

pub use account::*;
pub use config::{Config, ErrorPolicy, RecalculationConfig, RulesConfig};
pub use error::*;
