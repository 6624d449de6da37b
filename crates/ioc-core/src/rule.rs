// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical, post-load representation of a rule.
//!
//! Whatever shape a rule document arrived in (list / meta+variants /
//! single), loading normalizes it into a flat [`CanonicalRule`]. See
//! `ioc-rules` for the document parser that produces these.

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Metadata shared by a rule and, when present, all of its variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attck: Vec<String>,
    #[serde(default)]
    pub mbcs: Vec<String>,
}

impl RuleMeta {
    /// The meta block's own taxonomy, with no variant lists merged in -
    /// the "rule" axis of a match record's `taxonomy` (§3), as distinct
    /// from the variant-merged `CanonicalRule::taxonomy`.
    #[must_use]
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy {
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            attck: self.attck.clone(),
            mbcs: self.mbcs.clone(),
        }
    }
}

/// Order-preserving, deduplicated union of a rule's taxonomy lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taxonomy {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attck: Vec<String>,
    #[serde(default)]
    pub mbcs: Vec<String>,
}

impl Taxonomy {
    #[must_use]
    pub fn merge(meta: &RuleMeta, variant: &Taxonomy) -> Self {
        Taxonomy {
            categories: ioc_utils::dedup_preserve_order(
                variant.categories.iter().cloned().chain(meta.categories.iter().cloned()),
            ),
            tags: ioc_utils::dedup_preserve_order(
                variant.tags.iter().cloned().chain(meta.tags.iter().cloned()),
            ),
            attck: ioc_utils::dedup_preserve_order(
                variant.attck.iter().cloned().chain(meta.attck.iter().cloned()),
            ),
            mbcs: ioc_utils::dedup_preserve_order(
                variant.mbcs.iter().cloned().chain(meta.mbcs.iter().cloned()),
            ),
        }
    }
}

/// A single entry of a rule's `select` clause: a JMESPath field, its
/// output alias, and the transform chain applied before the value is
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectorSpec {
    pub field: String,
    pub alias: String,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
}

/// A single named modifier in a `transform` chain, with its positional
/// or named arguments normalized to strings (matching the Python
/// original's permissive `"name:arg1,arg2"` / `{name: {..}}` shapes).
///
/// A transform accepts either positional args (list form, `args`) or
/// named args (mapping form, `kwargs`); a document never mixes the two
/// for a single modifier (§4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub kwargs: Vec<(String, String)>,
}

impl TransformSpec {
    /// Looks up an argument by name first (named form), falling back to
    /// its position in the positional list (list form).
    #[must_use]
    pub fn arg(&self, name: &str, position: usize) -> Option<&str> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .or_else(|| self.args.get(position).map(String::as_str))
    }
}

/// The closed set of predicate operators (§4.2). Unknown operator names
/// are rejected at load time with `RuleCompileError`, not discovered at
/// runtime, since the operator is baked into the compiled predicate tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Range,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    In,
    NotIn,
    Exists,
    NotExists,
    MatchAll,
    MatchAny,
}

impl Operator {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Range => "range",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::Regex => "regex",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Exists => "exists",
            Operator::NotExists => "not_exists",
            Operator::MatchAll => "match_all",
            Operator::MatchAny => "match_any",
        }
    }

    /// Parses an operator name, returning `None` for anything outside
    /// the closed set from §4.2.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Operator::Eq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "range" => Operator::Range,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "startswith" => Operator::StartsWith,
            "endswith" => Operator::EndsWith,
            "regex" => Operator::Regex,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "exists" => Operator::Exists,
            "not_exists" => Operator::NotExists,
            "match_all" => Operator::MatchAll,
            "match_any" => Operator::MatchAny,
            _ => return None,
        })
    }
}

/// A compiled regex, kept alongside its source string so it can be
/// round-tripped back to the canonical document shape (§8 round-trip
/// law). `regex::Regex` is `Send + Sync`, so unlike a JMESPath
/// `Expression` it can live directly on the shared, broadcast rule.
///
/// Construction always goes through `ioc-rules`'s compiler (never
/// through `serde`, since the correct interpretation of a leaf's operand
/// - scalar, list, range, or regex - depends on which [`Operator`] it
/// belongs to, not on the operand's JSON shape alone).
#[derive(Debug, Clone)]
pub struct CompiledRegex {
    pub source: String,
    pub case_insensitive: bool,
    pub pattern: Regex,
}

impl PartialEq for CompiledRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_insensitive == other.case_insensitive
    }
}
impl Eq for CompiledRegex {}

impl CompiledRegex {
    /// Compiles `source`, stripping and honoring a leading `(?i)` marker.
    pub fn compile(raw: &str) -> Result<Self, regex::Error> {
        let (case_insensitive, source) = match raw.strip_prefix("(?i)") {
            Some(rest) => (true, rest.to_string()),
            None => (false, raw.to_string()),
        };
        let pattern = if case_insensitive {
            regex::RegexBuilder::new(&source).case_insensitive(true).build()?
        } else {
            Regex::new(&source)?
        };
        Ok(CompiledRegex { source, case_insensitive, pattern })
    }

    /// The document-shape string form: `(?i)<pattern>` when
    /// case-insensitive, else just `<pattern>`.
    #[must_use]
    pub fn to_document_string(&self) -> String {
        if self.case_insensitive {
            format!("(?i){}", self.source)
        } else {
            self.source.clone()
        }
    }
}

/// An operand of a predicate leaf. The shape depends on the operator:
/// `range` needs two numbers, `in`/`not_in`/`match_all`/`match_any` need
/// a list, `regex` needs a compiled pattern, everything else is a single
/// scalar JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Regex(CompiledRegex),
    Range([f64; 2]),
    List(Vec<serde_json::Value>),
    Scalar(serde_json::Value),
}

/// The recursive predicate tree under a rule's `where` key.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    And(Vec<WhereNode>),
    Or(Vec<WhereNode>),
    Not(Box<WhereNode>),
    Leaf {
        operator: Operator,
        operand: Operand,
    },
    /// An empty `where` clause, which evaluates to `true` (§4.2).
    Empty,
}

/// A fully loaded, compiled rule: the unit the rule engine executes.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRule {
    pub name: String,
    pub variant_name: Option<String>,
    pub meta: RuleMeta,
    /// The scoped dialect's `from` selector, resolved once per entry and
    /// passed as the left-hand side to every operator leaf in `where`.
    pub from: Option<String>,
    pub select: Vec<SelectorSpec>,
    pub where_: WhereNode,
    pub taxonomy: Taxonomy,
    pub source: PathBuf,
}

impl CanonicalRule {
    /// The variant axis is only meaningful when it differs from the
    /// meta's own name (§4.2's "rule.variant is null when ..." rule).
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        match &self.variant_name {
            Some(v) if v != &self.meta.name => Some(v.as_str()),
            _ => None,
        }
    }
}
