//! Rule and selector definition types.
//!
//! - `Operator`: the comparison a condition or filter applies
//! - Flat definitions (`RuleDefinition`, `RuleConditionDefinition`, ...) as
//!   the stores hand them out
//! - YAML documents (`RuleSetDocument`, `ConstantsDocument`) read by the
//!   loader through a two-pass `kind` envelope

mod definition;
mod document;
mod envelope;
mod operator;

pub use definition::*;
pub use document::*;
pub use envelope::*;
pub use operator::*;
