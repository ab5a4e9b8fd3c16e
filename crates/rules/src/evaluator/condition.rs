//! Evaluation of a single condition or filter against a [`RuleContext`].

use std::collections::HashSet;

use tracing::debug;

use crate::context::{RuleContext, RuleValue};
use crate::error::{Result, RuleError};
use crate::schema::{Criterion, Operator};

/// Evaluate one `(field, operator, expression)` triple.
///
/// A field missing from the context and an unsupported operator both yield
/// `Ok(false)`. A non-numeric operand of `<` / `>` is an error.
pub fn evaluate(
    field: &str,
    operator: &Operator,
    expression: &str,
    ctx: &RuleContext,
) -> Result<bool> {
    let value = match ctx.get(field) {
        Some(v) => v,
        None => {
            debug!(field, "field missing from context, criterion fails");
            return Ok(false);
        }
    };

    match operator {
        Operator::Eq => Ok(value.as_scalar() == Some(expression)),
        Operator::In => {
            let candidates: HashSet<&str> = expression.split(',').collect();
            Ok(match value {
                RuleValue::List(items) => items.iter().any(|i| candidates.contains(i.as_str())),
                RuleValue::Text(s) | RuleValue::Number(s) => candidates.contains(s.as_str()),
            })
        }
        Operator::Lt => {
            let bound = parse_number(field, "expression", expression)?;
            Ok(value_as_number(field, value)? < bound)
        }
        Operator::Gt => {
            let bound = parse_number(field, "expression", expression)?;
            Ok(value_as_number(field, value)? > bound)
        }
        Operator::Unknown(symbol) => {
            debug!(field, operator = %symbol, "unsupported operator, criterion fails");
            Ok(false)
        }
    }
}

/// Logical AND over a list of criteria. An empty list holds.
///
/// Stops at the first criterion that does not hold, so later criteria are
/// never evaluated (and cannot raise numeric errors).
pub fn evaluate_all<C: Criterion>(criteria: &[C], ctx: &RuleContext) -> Result<bool> {
    for criterion in criteria {
        if !evaluate(criterion.field(), criterion.operator(), criterion.expression(), ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn value_as_number(field: &str, value: &RuleValue) -> Result<f64> {
    match value {
        RuleValue::Text(s) | RuleValue::Number(s) => parse_number(field, "value", s),
        RuleValue::List(items) => Err(RuleError::NumericOperand {
            field: field.to_string(),
            operand: "value",
            value: format!("[{}]", items.join(",")),
        }),
    }
}

/// Locale-independent decimal parse (`.` as separator, surrounding
/// whitespace ignored).
fn parse_number(field: &str, operand: &'static str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| RuleError::NumericOperand {
        field: field.to_string(),
        operand,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleConditionDefinition;

    fn ctx(pairs: &[(&str, RuleValue)]) -> RuleContext {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn cond(field: &str, op: &str, expr: &str) -> RuleConditionDefinition {
        RuleConditionDefinition {
            id: 1,
            rule_id: 1,
            field: field.to_string(),
            operator: Operator::parse(op),
            expression: expr.to_string(),
        }
    }

    // ── = ───────────────────────────────────────────────────────────

    #[test]
    fn eq_is_exact_string_match() {
        let c = ctx(&[("status", RuleValue::text("OPEN"))]);
        assert!(evaluate("status", &Operator::Eq, "OPEN", &c).unwrap());
        assert!(!evaluate("status", &Operator::Eq, "open", &c).unwrap());
        assert!(!evaluate("status", &Operator::Eq, " OPEN", &c).unwrap());
    }

    #[test]
    fn eq_compares_number_text() {
        let c = ctx(&[("amount", RuleValue::number(1000))]);
        assert!(evaluate("amount", &Operator::Eq, "1000", &c).unwrap());
        assert!(!evaluate("amount", &Operator::Eq, "1000.0", &c).unwrap());
    }

    #[test]
    fn eq_never_matches_a_list() {
        let c = ctx(&[("region", RuleValue::list(["EU"]))]);
        assert!(!evaluate("region", &Operator::Eq, "EU", &c).unwrap());
    }

    // ── IN ──────────────────────────────────────────────────────────

    #[test]
    fn in_scalar_membership() {
        let c = ctx(&[("region", RuleValue::text("US"))]);
        assert!(evaluate("region", &Operator::In, "EU,US", &c).unwrap());
        assert!(!evaluate("region", &Operator::In, "EU,ASIA", &c).unwrap());
    }

    #[test]
    fn in_list_intersection() {
        let c = ctx(&[("region", RuleValue::list(["ASIA", "EU"]))]);
        assert!(evaluate("region", &Operator::In, "EU,US", &c).unwrap());
        assert!(!evaluate("region", &Operator::In, "US,LATAM", &c).unwrap());
    }

    #[test]
    fn in_does_not_trim_candidates() {
        let c = ctx(&[("region", RuleValue::text("US"))]);
        assert!(!evaluate("region", &Operator::In, "EU, US", &c).unwrap());
    }

    #[test]
    fn in_empty_list_value_never_matches() {
        let c = ctx(&[("region", RuleValue::List(vec![]))]);
        assert!(!evaluate("region", &Operator::In, "EU,US", &c).unwrap());
    }

    // ── < / > ───────────────────────────────────────────────────────

    #[test]
    fn numeric_comparisons_are_strict() {
        let c = ctx(&[("f", RuleValue::text("10"))]);
        assert!(!evaluate("f", &Operator::Lt, "10", &c).unwrap());
        assert!(!evaluate("f", &Operator::Gt, "10", &c).unwrap());
        assert!(evaluate("f", &Operator::Lt, "10.5", &c).unwrap());
        assert!(evaluate("f", &Operator::Gt, "9.99", &c).unwrap());
    }

    #[test]
    fn numeric_comparison_parses_both_sides() {
        let c = ctx(&[("amount", RuleValue::number(999))]);
        assert!(!evaluate("amount", &Operator::Gt, "1000", &c).unwrap());
        let c = ctx(&[("amount", RuleValue::number(1001))]);
        assert!(evaluate("amount", &Operator::Gt, "1000", &c).unwrap());
        assert!(evaluate("amount", &Operator::Lt, " 1e4 ", &c).unwrap());
    }

    #[test]
    fn non_numeric_expression_is_an_error() {
        let c = ctx(&[("amount", RuleValue::number(5))]);
        let err = evaluate("amount", &Operator::Gt, "lots", &c).unwrap_err();
        assert!(matches!(
            err,
            RuleError::NumericOperand { operand: "expression", .. }
        ));
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let c = ctx(&[("amount", RuleValue::text("n/a"))]);
        let err = evaluate("amount", &Operator::Lt, "10", &c).unwrap_err();
        assert_eq!(err.to_string(), "field 'amount': value 'n/a' is not a number");
    }

    #[test]
    fn comma_decimal_separator_is_rejected() {
        let c = ctx(&[("amount", RuleValue::text("10,5"))]);
        assert!(evaluate("amount", &Operator::Lt, "11", &c).is_err());
    }

    #[test]
    fn list_value_under_numeric_operator_is_an_error() {
        let c = ctx(&[("amount", RuleValue::list(["1", "2"]))]);
        assert!(evaluate("amount", &Operator::Gt, "0", &c).is_err());
    }

    // ── failure modes ───────────────────────────────────────────────

    #[test]
    fn missing_field_fails_closed() {
        let c = RuleContext::default();
        for op in ["=", "IN", "<", ">"] {
            assert!(!evaluate("absent", &Operator::parse(op), "x", &c).unwrap());
        }
    }

    #[test]
    fn unknown_operator_is_false_not_error() {
        let c = ctx(&[("amount", RuleValue::number(5))]);
        assert!(!evaluate("amount", &Operator::parse(">="), "1", &c).unwrap());
        assert!(!evaluate("amount", &Operator::parse("in"), "5", &c).unwrap());
    }

    // ── evaluate_all ────────────────────────────────────────────────

    #[test]
    fn evaluate_all_is_a_conjunction() {
        let c = ctx(&[
            ("status", RuleValue::text("OPEN")),
            ("amount", RuleValue::number(2000)),
        ]);
        assert!(evaluate_all(&[cond("status", "=", "OPEN"), cond("amount", ">", "1000")], &c).unwrap());
        assert!(!evaluate_all(&[cond("status", "=", "OPEN"), cond("amount", "<", "1000")], &c).unwrap());
        assert!(evaluate_all::<RuleConditionDefinition>(&[], &c).unwrap());
    }

    #[test]
    fn evaluate_all_stops_before_a_broken_criterion() {
        let c = ctx(&[("status", RuleValue::text("CLOSED"))]);
        let criteria = [cond("status", "=", "OPEN"), cond("status", ">", "oops")];
        assert!(!evaluate_all(&criteria, &c).unwrap());

        let criteria = [cond("status", ">", "oops"), cond("status", "=", "OPEN")];
        assert!(evaluate_all(&criteria, &c).is_err());
    }
}
