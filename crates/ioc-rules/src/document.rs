// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parses a raw YAML document into a flat list of [`RawRule`] values,
//! accepting the three document shapes a rule file may take: a list of
//! standalone rules, a `meta` + `variants` document, or a single rule.

use std::path::{Path, PathBuf};

use ioc_core::{IocError, Result, RuleMeta};
use serde_json::Value;

use crate::normalize::coerce_string_list;

/// One rule, still holding its `where`/`select` clauses as raw JSON and
/// its taxonomy already coalesced against its document's `meta` block
/// (if any), but not yet compiled.
#[derive(Debug, Clone)]
pub struct RawRule {
    pub name: String,
    pub variant_name: Option<String>,
    pub meta: RuleMeta,
    pub taxonomy_raw: ioc_core::Taxonomy,
    pub from: Option<String>,
    pub select: Value,
    pub where_raw: Value,
    pub source: PathBuf,
}

fn taxonomy_from_object(obj: &serde_json::Map<String, Value>) -> ioc_core::Taxonomy {
    ioc_core::Taxonomy {
        categories: coerce_string_list(obj.get("categories")),
        tags: coerce_string_list(obj.get("tags")),
        attck: coerce_string_list(obj.get("attck")).into_iter().chain(coerce_string_list(obj.get("attcks"))).collect(),
        mbcs: coerce_string_list(obj.get("mbcs")),
    }
}

fn meta_from_object(obj: &serde_json::Map<String, Value>, name: String) -> RuleMeta {
    RuleMeta {
        name,
        description: obj.get("description").and_then(Value::as_str).map(str::to_string),
        version: obj.get("version").and_then(Value::as_str).map(str::to_string),
        authors: coerce_string_list(obj.get("authors")),
        categories: coerce_string_list(obj.get("categories")),
        tags: coerce_string_list(obj.get("tags")),
        attck: coerce_string_list(obj.get("attck")).into_iter().chain(coerce_string_list(obj.get("attcks"))).collect(),
        mbcs: coerce_string_list(obj.get("mbcs")),
    }
}

fn require_name(obj: &serde_json::Map<String, Value>, source: &Path) -> Result<String> {
    obj.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| IocError::InvalidRuleFormat {
            source_path: source.to_path_buf(),
            reason: "rule is missing a `name` field".to_string(),
        })
}

/// A rule entry standing on its own: a flat dict carrying both its own
/// metadata and its `from`/`select`/`where` clauses, with no separate
/// `variants` axis. Used for both the list-of-rules shape and the
/// single-rule shape.
fn standalone_rule(obj: &serde_json::Map<String, Value>, source: &Path) -> Result<RawRule> {
    let name = require_name(obj, source)?;
    let meta = meta_from_object(obj, name.clone());
    Ok(RawRule {
        name,
        variant_name: None,
        taxonomy_raw: taxonomy_from_object(obj),
        meta,
        from: obj.get("from").and_then(Value::as_str).map(str::to_string),
        select: obj.get("select").cloned().unwrap_or(Value::Array(vec![])),
        where_raw: obj.get("where").cloned().unwrap_or(Value::Object(serde_json::Map::new())),
        source: source.to_path_buf(),
    })
}

fn variant_rule(
    meta: &RuleMeta,
    variant: &serde_json::Map<String, Value>,
    source: &Path,
) -> Result<RawRule> {
    let variant_name = require_name(variant, source)?;
    Ok(RawRule {
        name: meta.name.clone(),
        variant_name: Some(variant_name),
        taxonomy_raw: taxonomy_from_object(variant),
        meta: meta.clone(),
        from: variant.get("from").and_then(Value::as_str).map(str::to_string),
        select: variant.get("select").cloned().unwrap_or(Value::Array(vec![])),
        where_raw: variant.get("where").cloned().unwrap_or(Value::Object(serde_json::Map::new())),
        source: source.to_path_buf(),
    })
}

/// Expands one parsed YAML document into its constituent raw rules,
/// detecting which of the three shapes (§4.1) it uses.
pub fn expand_document(data: Value, source: &Path) -> Result<Vec<RawRule>> {
    match data {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => standalone_rule(&obj, source),
                _ => Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "list entry is not a mapping".to_string(),
                }),
            })
            .collect(),
        Value::Object(obj) => {
            if let (Some(Value::Object(meta_obj)), Some(Value::Array(variants))) =
                (obj.get("meta"), obj.get("variants"))
            {
                let base_name = require_name(meta_obj, source)?;
                let meta = meta_from_object(meta_obj, base_name);
                variants
                    .iter()
                    .map(|v| match v {
                        Value::Object(vobj) => variant_rule(&meta, vobj, source),
                        _ => Err(IocError::InvalidRuleFormat {
                            source_path: source.to_path_buf(),
                            reason: "variant entry is not a mapping".to_string(),
                        }),
                    })
                    .collect()
            } else if obj.contains_key("select") && obj.contains_key("where") {
                Ok(vec![standalone_rule(&obj, source)?])
            } else {
                Err(IocError::InvalidRuleFormat {
                    source_path: source.to_path_buf(),
                    reason: "document is neither a rule list, a meta+variants document, \
                             nor a single select/where rule"
                        .to_string(),
                })
            }
        }
        _ => Err(IocError::InvalidRuleFormat {
            source_path: source.to_path_buf(),
            reason: "document root must be a list or a mapping".to_string(),
        }),
    }
}
