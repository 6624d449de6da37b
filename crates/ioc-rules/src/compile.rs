// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiles a rule's raw `select`/`where` JSON (as parsed from YAML)
//! into the [`ioc_core`] predicate tree, validating every regex and
//! JMESPath expression up front so a bad rule document fails at load
//! time rather than on the first entry that reaches it (§4.1, §7).

use std::path::Path;

use ioc_core::{CompiledRegex, IocError, Operand, Operator, Result, SelectorSpec, TransformSpec, WhereNode};
use serde_json::Value;

/// Validates a JMESPath expression by compiling it and discarding the
/// result; the engine recompiles (and thread-locally caches) the real
/// `jmespath::Expression` from the validated string at evaluation time,
/// since a compiled `Expression` is not `Send`.
fn validate_jmespath(expr: &str, source: &Path) -> Result<()> {
    jmespath::compile(expr).map(|_| ()).map_err(|e| IocError::RuleCompileError {
        source_path: source.to_path_buf(),
        reason: format!("invalid selector expression `{expr}`: {e}"),
        pattern: Some(expr.to_string()),
    })
}

/// Detects the entry-scoped `[field_path, expected]` leaf shape the
/// scoped dialect does not use, so a mixed-dialect rule document fails
/// to load instead of silently misevaluating.
fn looks_entry_scoped(operand: &Value) -> bool {
    matches!(operand, Value::Array(items) if items.len() == 2 && matches!(items[0], Value::String(_)))
}

fn compile_operand(operator: Operator, operand: &Value, source: &Path) -> Result<Operand> {
    match operator {
        Operator::Regex => {
            let Value::String(pattern) = operand else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`regex` operand must be a string".to_string(),
                });
            };
            let compiled = CompiledRegex::compile(pattern).map_err(|e| IocError::RuleCompileError {
                source_path: source.to_path_buf(),
                reason: e.to_string(),
                pattern: Some(pattern.clone()),
            })?;
            Ok(Operand::Regex(compiled))
        }
        Operator::Range => {
            let Value::Array(items) = operand else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`range` operand must be a two-element array".to_string(),
                });
            };
            let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            let [lo, hi]: [f64; 2] = nums.try_into().map_err(|_| IocError::InvalidRuleFormat {
                source_path: source.to_path_buf(),
                reason: "`range` operand must contain exactly two numbers".to_string(),
            })?;
            Ok(Operand::Range([lo, hi]))
        }
        Operator::In | Operator::NotIn | Operator::MatchAll | Operator::MatchAny => {
            let Value::Array(items) = operand else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: format!("`{}` operand must be a list", operator.name()),
                });
            };
            Ok(Operand::List(items.clone()))
        }
        Operator::Exists | Operator::NotExists => Ok(Operand::Scalar(Value::Bool(true))),
        Operator::Eq
        | Operator::Gt
        | Operator::Gte
        | Operator::Lt
        | Operator::Lte
        | Operator::Contains
        | Operator::NotContains
        | Operator::StartsWith
        | Operator::EndsWith => {
            if looks_entry_scoped(operand) {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: format!(
                        "`{}` operand looks like an entry-scoped [field, expected] pair; \
                         this engine only supports the scoped `from` dialect",
                        operator.name()
                    ),
                });
            }
            Ok(Operand::Scalar(operand.clone()))
        }
    }
}

fn compile_leaves(obj: &serde_json::Map<String, Value>, source: &Path) -> Result<WhereNode> {
    let mut leaves = Vec::with_capacity(obj.len());
    for (op_name, operand) in obj {
        let operator = Operator::parse(op_name)
            .ok_or_else(|| IocError::UnknownOperator(op_name.clone()))?;
        let operand = compile_operand(operator, operand, source)?;
        leaves.push(WhereNode::Leaf { operator, operand });
    }
    Ok(match leaves.len() {
        0 => WhereNode::Empty,
        1 => leaves.into_iter().next().expect("length checked above"),
        _ => WhereNode::And(leaves),
    })
}

/// Compiles a raw `where` clause into the recursive predicate tree.
pub fn compile_where(value: &Value, source: &Path) -> Result<WhereNode> {
    match value {
        Value::Object(obj) if obj.is_empty() => Ok(WhereNode::Empty),
        Value::Object(obj) if obj.contains_key("and") => {
            let Some(Value::Array(items)) = obj.get("and") else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`and` must be a list of conditions".to_string(),
                });
            };
            Ok(WhereNode::And(
                items.iter().map(|c| compile_where(c, source)).collect::<Result<_>>()?,
            ))
        }
        Value::Object(obj) if obj.contains_key("or") => {
            let Some(Value::Array(items)) = obj.get("or") else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`or` must be a list of conditions".to_string(),
                });
            };
            Ok(WhereNode::Or(
                items.iter().map(|c| compile_where(c, source)).collect::<Result<_>>()?,
            ))
        }
        Value::Object(obj) if obj.contains_key("not") => {
            let inner = obj.get("not").expect("checked above");
            Ok(WhereNode::Not(Box::new(compile_where(inner, source)?)))
        }
        Value::Object(obj) => compile_leaves(obj, source),
        Value::Array(items) => Ok(WhereNode::And(
            items.iter().map(|c| compile_where(c, source)).collect::<Result<_>>()?,
        )),
        _ => Err(IocError::InvalidRuleFormat {
            source_path: source.to_path_buf(),
            reason: "`where` must be a mapping or a list".to_string(),
        }),
    }
}

/// Parses one modifier in a `transform` chain: either `"name:arg1,arg2"`
/// or `{name: arg_or_args}`, mirroring the Python original's permissive
/// shapes.
fn parse_transform(value: &Value, source: &Path) -> Result<TransformSpec> {
    match value {
        Value::String(s) => {
            let mut parts = s.splitn(2, ':');
            let name = parts.next().unwrap_or_default().trim().to_string();
            let args = parts
                .next()
                .map(|rest| rest.split(',').map(|a| a.trim().to_string()).collect())
                .unwrap_or_default();
            Ok(TransformSpec { name, args, kwargs: Vec::new() })
        }
        Value::Object(obj) if obj.len() == 1 => {
            let (name, arg_value) = obj.iter().next().expect("length checked above");
            match arg_value {
                // `{name: {k: v, ...}}` - named-argument (mapping) form.
                Value::Object(kwargs) => Ok(TransformSpec {
                    name: name.clone(),
                    args: Vec::new(),
                    kwargs: kwargs.iter().map(|(k, v)| (k.clone(), value_to_arg(v))).collect(),
                }),
                // `{name: [a, b, ...]}` or `{name: scalar}` - positional form.
                Value::Array(items) => {
                    Ok(TransformSpec { name: name.clone(), args: items.iter().map(value_to_arg).collect(), kwargs: Vec::new() })
                }
                Value::Null => Ok(TransformSpec { name: name.clone(), args: Vec::new(), kwargs: Vec::new() }),
                other => Ok(TransformSpec { name: name.clone(), args: vec![value_to_arg(other)], kwargs: Vec::new() }),
            }
        }
        _ => Err(IocError::InvalidRuleFormat {
            source_path: source.to_path_buf(),
            reason: "transform entry must be a string or a single-key mapping".to_string(),
        }),
    }
}

fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compiles a raw `select` clause into the selector list, validating
/// every field's JMESPath expression.
pub fn compile_select(value: &Value, source: &Path) -> Result<Vec<SelectorSpec>> {
    let Value::Array(items) = value else {
        return Err(IocError::InvalidRuleFormat {
            source_path: source.to_path_buf(),
            reason: "`select` must be a list".to_string(),
        });
    };
    items
        .iter()
        .map(|item| {
            let Value::Object(obj) = item else {
                return Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`select` entry must be a mapping".to_string(),
                });
            };
            let field = obj
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "`select` entry is missing a `field`".to_string(),
                })?
                .to_string();
            validate_jmespath(&field, source)?;
            let alias = obj.get("alias").and_then(Value::as_str).unwrap_or(&field).to_string();
            let transforms = match obj.get("transform").or_else(|| obj.get("transforms")) {
                Some(Value::Array(items)) => {
                    items.iter().map(|t| parse_transform(t, source)).collect::<Result<Vec<_>>>()?
                }
                Some(other) => vec![parse_transform(other, source)?],
                None => Vec::new(),
            };
            Ok(SelectorSpec { field, alias, transforms })
        })
        .collect()
}

/// Validates the scoped dialect's top-level `from` selector, if present.
pub fn validate_from(from: Option<&str>, source: &Path) -> Result<()> {
    if let Some(expr) = from {
        validate_jmespath(expr, source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_and_over_multiple_leaves() {
        let where_ = json!({"gt": 5, "lt": 10});
        let compiled = compile_where(&where_, Path::new("t.yml")).unwrap();
        assert!(matches!(compiled, WhereNode::And(leaves) if leaves.len() == 2));
    }

    #[test]
    fn regex_strips_case_insensitive_prefix() {
        let where_ = json!({"regex": "(?i)^abc"});
        let compiled = compile_where(&where_, Path::new("t.yml")).unwrap();
        let WhereNode::Leaf { operand: Operand::Regex(r), .. } = compiled else {
            panic!("expected regex leaf");
        };
        assert!(r.case_insensitive);
        assert_eq!(r.source, "^abc");
    }

    #[test]
    fn range_requires_two_numbers() {
        let where_ = json!({"range": [1, 2, 3]});
        assert!(compile_where(&where_, Path::new("t.yml")).is_err());
    }

    #[test]
    fn rejects_entry_scoped_leaf_shape() {
        let where_ = json!({"eq": ["some.field", "value"]});
        assert!(compile_where(&where_, Path::new("t.yml")).is_err());
    }

    #[test]
    fn unknown_operator_errors() {
        let where_ = json!({"frobnicate": 1});
        assert!(compile_where(&where_, Path::new("t.yml")).is_err());
    }

    #[test]
    fn colon_form_transform_parses_args() {
        let t = parse_transform(&json!("slice:0,8"), Path::new("t.yml")).unwrap();
        assert_eq!(t.name, "slice");
        assert_eq!(t.args, vec!["0", "8"]);
    }

    #[test]
    fn mapping_form_transform_parses_args() {
        let t = parse_transform(&json!({"replace": ["a", "b"]}), Path::new("t.yml")).unwrap();
        assert_eq!(t.name, "replace");
        assert_eq!(t.args, vec!["a", "b"]);
    }

    #[test]
    fn named_kwargs_transform_parses() {
        let t = parse_transform(&json!({"split": {"delimiter": " ", "idx": "1"}}), Path::new("t.yml")).unwrap();
        assert_eq!(t.name, "split");
        assert_eq!(t.arg("delimiter", 0), Some(" "));
        assert_eq!(t.arg("idx", 1), Some("1"));
    }
}
