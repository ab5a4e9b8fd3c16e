//! Error type shared by evaluation, stores and the definition loader.

use kinetix_core::StoreError;

/// Errors raised while evaluating or loading rule definitions.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A `<` / `>` operand is not a number. Signals corrupt rule
    /// configuration or an incompatible context value, never swallowed.
    #[error("field '{field}': {operand} '{value}' is not a number")]
    NumericOperand {
        field: String,
        operand: &'static str,
        value: String,
    },

    /// The business object could not be turned into a rule context.
    #[error("Context error: {0}")]
    Context(String),

    /// A rule, account or constants lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Definition document is structurally invalid (empty id, unknown kind).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
