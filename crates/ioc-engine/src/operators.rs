// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluates a compiled predicate tree against a resolved value (§4.2).

use ioc_core::{Operand, Operator, WhereNode};
use serde_json::Value;

/// Parses a value as a number the way the distilled rule set does:
/// a `0x`-prefixed string is hex, otherwise a decimal string or JSON
/// number parses as `f64`; anything else is not numeric.
fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                i64::from_str_radix(hex, 16).ok().map(|v| v as f64)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

fn as_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `exists` (§4.2): the value is neither null nor an empty string.
fn is_present(value: &Value) -> bool {
    !value.is_null() && value.as_str() != Some("")
}

fn values_equal(value: &Value, operand: &Value) -> bool {
    match (parse_numeric(value), parse_numeric(operand)) {
        (Some(v), Some(o)) => (v - o).abs() < f64::EPSILON,
        _ => value == operand,
    }
}

fn evaluate_leaf(value: &Value, operator: Operator, operand: &Operand) -> bool {
    match (operator, operand) {
        (Operator::Eq, Operand::Scalar(o)) => values_equal(value, o),
        (Operator::Gt, Operand::Scalar(o)) => {
            matches!((parse_numeric(value), parse_numeric(o)), (Some(v), Some(o)) if v > o)
        }
        (Operator::Gte, Operand::Scalar(o)) => {
            matches!((parse_numeric(value), parse_numeric(o)), (Some(v), Some(o)) if v >= o)
        }
        (Operator::Lt, Operand::Scalar(o)) => {
            matches!((parse_numeric(value), parse_numeric(o)), (Some(v), Some(o)) if v < o)
        }
        (Operator::Lte, Operand::Scalar(o)) => {
            matches!((parse_numeric(value), parse_numeric(o)), (Some(v), Some(o)) if v <= o)
        }
        (Operator::Range, Operand::Range([lo, hi])) => {
            matches!(parse_numeric(value), Some(v) if v >= *lo && v <= *hi)
        }
        (Operator::Contains, Operand::Scalar(o)) => as_str(value).contains(&as_str(o)),
        (Operator::NotContains, Operand::Scalar(o)) => !as_str(value).contains(&as_str(o)),
        (Operator::StartsWith, Operand::Scalar(o)) => as_str(value).starts_with(&as_str(o)),
        (Operator::EndsWith, Operand::Scalar(o)) => as_str(value).ends_with(&as_str(o)),
        (Operator::Regex, Operand::Regex(re)) => re.pattern.is_match(&as_str(value)),
        (Operator::In, Operand::List(items)) => items.contains(value),
        (Operator::NotIn, Operand::List(items)) => !items.contains(value),
        (Operator::Exists, _) => is_present(value),
        (Operator::NotExists, _) => !is_present(value),
        (Operator::MatchAny, Operand::List(items)) => {
            let Value::Array(values) = value else { return false };
            values.iter().any(|v| items.contains(v))
        }
        (Operator::MatchAll, Operand::List(items)) => {
            let Value::Array(values) = value else { return false };
            values.iter().all(|v| items.contains(v))
        }
        // Operand/operator mismatches cannot occur for a tree produced by
        // `ioc-rules`'s compiler, which picks the operand shape from the
        // operator itself; treat any future mismatch as non-matching.
        _ => false,
    }
}

/// Recursively evaluates a `where` tree against a single resolved
/// value, implementing implicit-AND-within-a-level and the
/// `and`/`or`/`not` combinators.
#[must_use]
pub fn evaluate(value: &Value, node: &WhereNode) -> bool {
    match node {
        WhereNode::Empty => true,
        WhereNode::And(children) => children.iter().all(|c| evaluate(value, c)),
        WhereNode::Or(children) => children.iter().any(|c| evaluate(value, c)),
        WhereNode::Not(inner) => !evaluate(value, inner),
        WhereNode::Leaf { operator, operand } => evaluate_leaf(value, *operator, operand),
    }
}
