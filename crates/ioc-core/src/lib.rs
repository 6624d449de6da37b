// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared data model for the IOC extraction engine: the canonical rule
//! representation, the predicate tree, match records, and the
//! crate-wide error type.

mod error;
mod record;
mod rule;

pub use error::{IocError, Result};
pub use record::{truncate_api, MatchMetadata, MatchRecord, MatchSources, MatchTaxonomy, RuleIdentity};
pub use rule::{
    CanonicalRule, CompiledRegex, Operand, Operator, RuleMeta, SelectorSpec, Taxonomy,
    TransformSpec, WhereNode,
};

/// A JSON entry from the input stream. `serde_json::Value` already is
/// the "opaque recursive tree type" the design notes call for, so it is
/// used directly rather than reimplemented.
pub type Entry = serde_json::Value;
