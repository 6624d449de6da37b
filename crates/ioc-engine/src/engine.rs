// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ties selector resolution, transforms, and predicate evaluation
//! together into the five-step rule execution algorithm (§4.2):
//! resolve `from`, evaluate `where`, run `process_select`, assemble the
//! match record, truncate and trim `api`.

use std::path::{Path, PathBuf};

use ioc_core::{
    truncate_api, CanonicalRule, Entry, MatchMetadata, MatchRecord, MatchSources, MatchTaxonomy,
    RuleIdentity,
};
use serde_json::{Map, Value};

use crate::operators::evaluate;
use crate::selector;
use crate::transform::apply_chain;

/// Resolves every `select` entry against `entry`, applying each one's
/// transform chain, and collects the result under its alias.
#[must_use]
pub fn process_select(entry: &Entry, rule: &CanonicalRule) -> Map<String, Value> {
    let mut out = Map::with_capacity(rule.select.len());
    for spec in &rule.select {
        let resolved = selector::resolve(entry, &spec.field).and_then(unwrap_singleton);
        let Some(resolved) = resolved else {
            out.insert(spec.alias.clone(), Value::Null);
            continue;
        };
        let value = if resolved.is_string() && !spec.transforms.is_empty() {
            Value::String(apply_chain(&resolved, &spec.transforms))
        } else {
            resolved
        };
        out.insert(spec.alias.clone(), value);
    }
    out
}

/// A one-element list unwraps to its sole element; an empty list is
/// treated as absent (§4.2 step 2).
fn unwrap_singleton(value: Value) -> Option<Value> {
    match value {
        Value::Array(mut items) if items.len() == 1 => Some(items.remove(0)),
        Value::Array(items) if items.is_empty() => None,
        other => Some(other),
    }
}

/// Runs one rule against one entry, producing a [`MatchRecord`] when
/// the rule's `where` clause is satisfied.
///
/// `from` is optional: when absent, the whole entry is evaluated
/// directly (used for rules whose `where` is a pure `and`/`or` of
/// already-scoped sub-conditions rather than a single field path).
#[must_use]
pub fn execute_rule(entry: &Entry, rule: &CanonicalRule, input_path: &Path) -> Option<MatchRecord> {
    let value = match &rule.from {
        Some(expr) => selector::resolve(entry, expr)?,
        None => entry.clone(),
    };

    if !evaluate(&value, &rule.where_) {
        return None;
    }

    let attributes = process_select(entry, rule);
    let api = entry.get("api").and_then(Value::as_str).map(truncate_api).unwrap_or_default();

    Some(MatchRecord {
        api,
        attributes,
        rule: RuleIdentity { name: rule.name.clone(), variant: rule.variant().map(str::to_string) },
        metadata: MatchMetadata {
            version: rule.meta.version.clone(),
            authors: rule.meta.authors.clone(),
            description: rule.meta.description.clone(),
        },
        taxonomy: MatchTaxonomy { rule: rule.meta.taxonomy(), variant: rule.taxonomy.clone() },
        sources: MatchSources {
            input_path: input_path.to_path_buf(),
            rule_path: rule.source.clone(),
        },
    })
}

/// Runs every rule against one entry in order, stopping at the first
/// match (first-match-wins, §3 invariants).
#[must_use]
pub fn execute_first_match(
    entry: &Entry,
    rules: &[CanonicalRule],
    input_path: &Path,
) -> Option<MatchRecord> {
    rules.iter().find_map(|rule| execute_rule(entry, rule, input_path))
}

/// Runs every rule against one entry without short-circuiting, for the
/// auto-tuner's cost model, which needs the true per-entry engine cost
/// rather than the cost of the first rule that happens to match.
pub fn execute_all(entry: &Entry, rules: &[CanonicalRule], input_path: &Path) -> Vec<MatchRecord> {
    rules.iter().filter_map(|rule| execute_rule(entry, rule, input_path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioc_core::{CompiledRegex, Operand, Operator, RuleMeta, SelectorSpec, Taxonomy, WhereNode};
    use serde_json::json;

    fn make_rule() -> CanonicalRule {
        CanonicalRule {
            name: "createfilew_rule".to_string(),
            variant_name: None,
            meta: RuleMeta {
                name: "createfilew_rule".to_string(),
                description: Some("flags CreateFileW calls".to_string()),
                version: Some("1".to_string()),
                authors: vec![],
                categories: vec![],
                tags: vec![],
                attck: vec![],
                mbcs: vec![],
            },
            from: Some("api".to_string()),
            select: vec![SelectorSpec { field: "path".to_string(), alias: "path".to_string(), transforms: vec![] }],
            where_: WhereNode::Leaf {
                operator: Operator::Regex,
                operand: Operand::Regex(CompiledRegex::compile("(?i)^createfilew").unwrap()),
            },
            taxonomy: Taxonomy::default(),
            source: PathBuf::from("rule.yml"),
        }
    }

    #[test]
    fn execute_rule_matches_createfilew() {
        let entry = json!({"api": "CreateFileW(path)", "path": "C:\\a.txt"});
        let rule = make_rule();
        let record = execute_rule(&entry, &rule, Path::new("in.json")).unwrap();
        assert_eq!(record.api, "CreateFileW");
        assert_eq!(record.attributes.get("path").unwrap(), "C:\\a.txt");
        assert_eq!(record.rule.name, "createfilew_rule");
        assert!(record.rule.variant.is_none());
    }

    #[test]
    fn execute_rule_skips_non_matching_entry() {
        let entry = json!({"api": "DeleteFileW(path)", "path": "C:\\a.txt"});
        let rule = make_rule();
        assert!(execute_rule(&entry, &rule, Path::new("in.json")).is_none());
    }

    #[test]
    fn process_select_unwraps_single_element_list() {
        let rule = CanonicalRule {
            select: vec![SelectorSpec { field: "tags".to_string(), alias: "tag".to_string(), transforms: vec![] }],
            ..make_rule()
        };
        let entry = json!({"tags": ["only"]});
        assert_eq!(process_select(&entry, &rule).get("tag").unwrap(), "only");
    }

    #[test]
    fn process_select_treats_empty_list_as_absent() {
        let rule = CanonicalRule {
            select: vec![SelectorSpec { field: "tags".to_string(), alias: "tag".to_string(), transforms: vec![] }],
            ..make_rule()
        };
        let entry = json!({"tags": []});
        assert_eq!(process_select(&entry, &rule).get("tag").unwrap(), &Value::Null);
    }

    #[test]
    fn process_select_skips_transforms_on_non_textual_value() {
        use ioc_core::TransformSpec;
        let rule = CanonicalRule {
            select: vec![SelectorSpec {
                field: "count".to_string(),
                alias: "count".to_string(),
                transforms: vec![TransformSpec { name: "upper".to_string(), args: vec![], kwargs: vec![] }],
            }],
            ..make_rule()
        };
        let entry = json!({"count": 42});
        assert_eq!(process_select(&entry, &rule).get("count").unwrap(), &json!(42));
    }

    #[test]
    fn first_match_wins_across_rule_list() {
        let entry = json!({"api": "CreateFileW(path)", "path": "C:\\a.txt"});
        let rules = vec![make_rule(), make_rule()];
        let matches: Vec<_> = rules.iter().filter_map(|r| execute_rule(&entry, r, Path::new("in.json"))).collect();
        assert_eq!(matches.len(), 2);
        assert!(execute_first_match(&entry, &rules, Path::new("in.json")).is_some());
    }
}
