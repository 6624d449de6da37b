// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! The structured output emitted when a rule fires on an entry (§3).

use std::path::PathBuf;

use serde::Serialize;

use crate::rule::Taxonomy;

/// Metadata copied onto every match produced by a given rule, so a
/// consumer of the output stream never has to cross-reference the rule
/// document that produced it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchMetadata {
    pub version: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
}

/// The rule axis (name and, when meaningful, variant) that produced a
/// match.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleIdentity {
    pub name: String,
    pub variant: Option<String>,
}

/// Taxonomy attached to both the firing rule and its variant axis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchTaxonomy {
    pub rule: Taxonomy,
    pub variant: Taxonomy,
}

/// Where a match came from: which input file (by path) and which rule
/// document (by path) produced it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchSources {
    pub input_path: PathBuf,
    pub rule_path: PathBuf,
}

/// A single match: one entry, one rule, assembled per §3.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchRecord {
    pub api: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub rule: RuleIdentity,
    pub metadata: MatchMetadata,
    pub taxonomy: MatchTaxonomy,
    pub sources: MatchSources,
}

/// Truncates an `api` field at its first `(` and trims the result,
/// e.g. `"CreateFileW(path)"` -> `"CreateFileW"` (§3, §4.2 step 5).
#[must_use]
pub fn truncate_api(raw: &str) -> String {
    raw.split('(').next().unwrap_or(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_first_paren_and_trims() {
        assert_eq!(truncate_api("CreateFileW(path)"), "CreateFileW");
        assert_eq!(truncate_api("  ReadFile (h, buf) "), "ReadFile");
        assert_eq!(truncate_api("NoParens"), "NoParens");
    }
}
