// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inverse of [`crate::compile`]: turns a compiled [`CanonicalRule`] back
//! into the canonical standalone-rule document shape (§8 round-trip
//! law). Kept as explicit functions rather than a `Serialize` impl on
//! the predicate tree, since the forward direction is operator-aware
//! (the same JSON shape means different things under different
//! operators) and a derived, symmetric (de)serialization cannot express
//! that.

use ioc_core::{CanonicalRule, Operand, Operator, SelectorSpec, WhereNode};
use serde_json::{json, Map, Value};

fn operand_to_value(operand: &Operand) -> Value {
    match operand {
        Operand::Regex(r) => Value::String(r.to_document_string()),
        Operand::Range([lo, hi]) => json!([lo, hi]),
        Operand::List(items) => Value::Array(items.clone()),
        Operand::Scalar(v) => v.clone(),
    }
}

/// Renders a compiled predicate tree back to its document shape.
pub fn where_to_value(node: &WhereNode) -> Value {
    match node {
        WhereNode::Empty => Value::Object(Map::new()),
        WhereNode::And(children) => json!({"and": children.iter().map(where_to_value).collect::<Vec<_>>()}),
        WhereNode::Or(children) => json!({"or": children.iter().map(where_to_value).collect::<Vec<_>>()}),
        WhereNode::Not(inner) => json!({"not": where_to_value(inner)}),
        WhereNode::Leaf { operator, operand } => {
            let mut map = Map::new();
            map.insert(operator.name().to_string(), operand_to_value(operand));
            Value::Object(map)
        }
    }
}

fn transform_to_value(t: &ioc_core::TransformSpec) -> Value {
    if !t.kwargs.is_empty() {
        let mut map = Map::new();
        let mut kwargs = Map::new();
        for (k, v) in &t.kwargs {
            kwargs.insert(k.clone(), Value::String(v.clone()));
        }
        map.insert(t.name.clone(), Value::Object(kwargs));
        return Value::Object(map);
    }
    if t.args.is_empty() {
        Value::String(t.name.clone())
    } else {
        Value::String(format!("{}:{}", t.name, t.args.join(",")))
    }
}

fn select_to_value(selectors: &[SelectorSpec]) -> Value {
    Value::Array(
        selectors
            .iter()
            .map(|s| {
                let mut map = Map::new();
                map.insert("field".to_string(), Value::String(s.field.clone()));
                if s.alias != s.field {
                    map.insert("alias".to_string(), Value::String(s.alias.clone()));
                }
                if !s.transforms.is_empty() {
                    map.insert(
                        "transform".to_string(),
                        Value::Array(s.transforms.iter().map(transform_to_value).collect()),
                    );
                }
                Value::Object(map)
            })
            .collect(),
    )
}

/// Renders a compiled rule back to the standalone-rule document shape
/// (the shape `expand_document` accepts as a list entry or single-rule
/// document).
#[must_use]
pub fn rule_to_document_value(rule: &CanonicalRule) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(rule.variant_name.clone().unwrap_or_else(|| rule.name.clone())));
    if let Some(description) = &rule.meta.description {
        map.insert("description".to_string(), Value::String(description.clone()));
    }
    if let Some(version) = &rule.meta.version {
        map.insert("version".to_string(), Value::String(version.clone()));
    }
    if !rule.meta.authors.is_empty() {
        map.insert("authors".to_string(), Value::Array(rule.meta.authors.iter().cloned().map(Value::String).collect()));
    }
    if !rule.taxonomy.categories.is_empty() {
        map.insert("categories".to_string(), Value::Array(rule.taxonomy.categories.iter().cloned().map(Value::String).collect()));
    }
    if !rule.taxonomy.tags.is_empty() {
        map.insert("tags".to_string(), Value::Array(rule.taxonomy.tags.iter().cloned().map(Value::String).collect()));
    }
    if !rule.taxonomy.attck.is_empty() {
        map.insert("attck".to_string(), Value::Array(rule.taxonomy.attck.iter().cloned().map(Value::String).collect()));
    }
    if !rule.taxonomy.mbcs.is_empty() {
        map.insert("mbcs".to_string(), Value::Array(rule.taxonomy.mbcs.iter().cloned().map(Value::String).collect()));
    }
    if let Some(from) = &rule.from {
        map.insert("from".to_string(), Value::String(from.clone()));
    }
    map.insert("select".to_string(), select_to_value(&rule.select));
    map.insert("where".to_string(), where_to_value(&rule.where_));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioc_core::{CompiledRegex, Taxonomy, RuleMeta};
    use std::path::PathBuf;

    fn sample_rule() -> CanonicalRule {
        CanonicalRule {
            name: "suspicious_write".to_string(),
            variant_name: None,
            meta: RuleMeta {
                name: "suspicious_write".to_string(),
                description: Some("flags risky writes".to_string()),
                version: Some("1.0".to_string()),
                authors: vec!["a".to_string()],
                categories: vec!["fs".to_string()],
                tags: vec![],
                attck: vec![],
                mbcs: vec![],
            },
            from: Some("api".to_string()),
            select: vec![SelectorSpec { field: "path".to_string(), alias: "path".to_string(), transforms: vec![] }],
            where_: WhereNode::Leaf {
                operator: Operator::Regex,
                operand: Operand::Regex(CompiledRegex::compile("(?i)^CreateFile").unwrap()),
            },
            taxonomy: Taxonomy { categories: vec!["fs".to_string()], tags: vec![], attck: vec![], mbcs: vec![] },
            source: PathBuf::from("rule.yml"),
        }
    }

    #[test]
    fn round_trips_through_document_value() {
        let rule = sample_rule();
        let doc = rule_to_document_value(&rule);
        let reloaded = crate::document::expand_document(doc, &PathBuf::from("rule.yml")).unwrap();
        assert_eq!(reloaded.len(), 1);
        let recompiled = crate::compile_raw_rule(reloaded.into_iter().next().unwrap()).unwrap();
        assert_eq!(recompiled.where_, rule.where_);
        assert_eq!(recompiled.select, rule.select);
        assert_eq!(recompiled.from, rule.from);
        assert_eq!(recompiled.taxonomy, rule.taxonomy);
    }
}
