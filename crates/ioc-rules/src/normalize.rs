// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalar-or-list coercion for taxonomy fields (§4.1): a rule author may
//! write `tags: malware` or `tags: [malware, dropper]` interchangeably.

use serde_json::Value;

/// Coerces a taxonomy field to a list of strings: missing -> empty,
/// scalar -> singleton, list -> each element stringified (non-string
/// scalars inside the list are rendered via their JSON display form).
pub fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(other) => vec![value_to_string(other)],
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
