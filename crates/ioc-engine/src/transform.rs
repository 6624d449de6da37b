// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed set of value transforms a `select` clause may chain:
//! `lower`, `upper`, `strip`, `url_decode`, `replace`/`regex_sub`,
//! `regex_extract`, `split`, `slice`.
//!
//! A transform never aborts the pipeline: an unknown name is skipped
//! with a `warn`, and a transform whose arguments don't parse (a
//! non-numeric `slice` bound, a bad `regex_sub` pattern) leaves the
//! value unchanged and logs once.

use ioc_core::TransformSpec;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::warn;

/// Non-string values (and JSON arrays) coerce to a string before a
/// transform runs: a list takes its first element (or `""` if empty),
/// anything else uses its JSON display form.
fn normalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().map(normalize).unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Negative-indexed Python-style `split`/`slice` index resolution: a
/// negative value counts back from `len`, clamped to `[0, len]`.
fn resolve_index(raw: i64, len: usize) -> usize {
    if raw < 0 {
        len.saturating_sub(raw.unsigned_abs() as usize)
    } else {
        (raw as usize).min(len)
    }
}

fn apply_one(spec: &TransformSpec, value: String) -> String {
    let name = spec.name.as_str();
    match name {
        "lower" => value.to_lowercase(),
        "upper" => value.to_uppercase(),
        "strip" => value.trim().to_string(),
        "url_decode" => percent_decode_str(&value).decode_utf8_lossy().into_owned(),
        "regex_extract" => match spec.arg("pattern", 0) {
            Some(pattern) => match regex::Regex::new(pattern) {
                Ok(re) => {
                    let group: usize = spec.arg("group", 1).and_then(|s| s.parse().ok()).unwrap_or(1);
                    re.captures(&value)
                        .and_then(|caps| caps.get(group))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                }
                Err(e) => {
                    warn!(pattern, error = %e, "regex_extract: bad pattern, value unchanged");
                    value
                }
            },
            None => {
                warn!("regex_extract: missing pattern argument, value unchanged");
                value
            }
        },
        "replace" | "regex_sub" => match (spec.arg("pattern", 0), spec.arg("repl", 1)) {
            (Some(pattern), Some(replacement)) => match regex::Regex::new(pattern) {
                Ok(re) => re.replace_all(&value, replacement).into_owned(),
                Err(e) => {
                    warn!(pattern, error = %e, "{name}: bad pattern, value unchanged");
                    value
                }
            },
            _ => {
                warn!("{name}: requires a pattern and a replacement, value unchanged");
                value
            }
        },
        "split" => {
            let delimiter = spec.arg("delimiter", 0).unwrap_or(",");
            let idx: i64 = spec.arg("idx", 1).and_then(|s| s.parse().ok()).unwrap_or(0);
            let maxsplit: i64 = spec.arg("maxsplit", 2).and_then(|s| s.parse().ok()).unwrap_or(-1);
            let parts: Vec<&str> = if maxsplit < 0 {
                value.split(delimiter).collect()
            } else {
                value.splitn(maxsplit as usize + 1, delimiter).collect()
            };
            let resolved_idx = if idx < 0 {
                parts.len().checked_sub(idx.unsigned_abs() as usize)
            } else {
                Some(idx as usize)
            };
            resolved_idx
                .and_then(|i| parts.get(i))
                .map(|p| p.trim().to_string())
                .unwrap_or_default()
        }
        "slice" => {
            let chars: Vec<char> = value.chars().collect();
            let len = chars.len();
            let start = spec.arg("start", 0).and_then(|s| s.parse::<i64>().ok()).map(|s| resolve_index(s, len)).unwrap_or(0);
            let end = spec.arg("end", 1).and_then(|s| s.parse::<i64>().ok()).map(|e| resolve_index(e, len)).unwrap_or(len);
            let step: usize = spec
                .arg("step", 2)
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|s| *s > 0)
                .map(|s| s as usize)
                .unwrap_or(1);
            if start >= end {
                String::new()
            } else {
                chars[start..end].iter().step_by(step).collect()
            }
        }
        other => {
            warn!(transform = other, "unknown transform, skipped");
            value
        }
    }
}

/// Applies a chain of transforms in order, coercing the initial value
/// to a string first (§4.2).
#[must_use]
pub fn apply_chain(value: &Value, transforms: &[TransformSpec]) -> String {
    let mut current = normalize(value);
    for spec in transforms {
        current = apply_one(spec, current);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str, args: &[&str]) -> TransformSpec {
        TransformSpec { name: name.to_string(), args: args.iter().map(|s| (*s).to_string()).collect(), kwargs: vec![] }
    }

    #[test]
    fn strip_lower_split_pipeline() {
        let transforms = vec![spec("strip", &[]), spec("lower", &[]), spec("split", &["("])];
        let result = apply_chain(&json!("  CreateFileW(path)  "), &transforms);
        assert_eq!(result, "createfilew");
    }

    #[test]
    fn strip_lower_split_by_space_s3_scenario() {
        let transforms = vec![spec("strip", &[]), spec("lower", &[]), spec("split", &[" ", "0"])];
        let result = apply_chain(&json!("  Hello World  "), &transforms);
        assert_eq!(result, "hello");
    }

    #[test]
    fn split_default_delimiter_is_comma() {
        let transforms = vec![spec("split", &[])];
        assert_eq!(apply_chain(&json!("a,b,c"), &transforms), "a");
    }

    #[test]
    fn split_negative_idx_counts_from_end() {
        let transforms = vec![spec("split", &[",", "-1"])];
        assert_eq!(apply_chain(&json!("a,b,c"), &transforms), "c");
    }

    #[test]
    fn split_named_kwargs_form() {
        let transforms = vec![TransformSpec {
            name: "split".to_string(),
            args: vec![],
            kwargs: vec![("delimiter".to_string(), ":".to_string()), ("idx".to_string(), "1".to_string())],
        }];
        assert_eq!(apply_chain(&json!("a:b:c"), &transforms), "b");
    }

    #[test]
    fn unknown_transform_is_skipped() {
        let transforms = vec![spec("frobnicate", &[])];
        assert_eq!(apply_chain(&json!("value"), &transforms), "value");
    }

    #[test]
    fn slice_extracts_char_range() {
        let transforms = vec![spec("slice", &["0", "4"])];
        assert_eq!(apply_chain(&json!("abcdef"), &transforms), "abcd");
    }

    #[test]
    fn slice_applies_step() {
        let transforms = vec![spec("slice", &["0", "6", "2"])];
        assert_eq!(apply_chain(&json!("abcdef"), &transforms), "ace");
    }

    #[test]
    fn list_value_normalizes_to_first_element() {
        let transforms = vec![spec("upper", &[])];
        assert_eq!(apply_chain(&json!(["first", "second"]), &transforms), "FIRST");
    }

    #[test]
    fn regex_sub_replaces_matches() {
        let transforms = vec![spec("regex_sub", &[r"\d+", "#"])];
        assert_eq!(apply_chain(&json!("port8080"), &transforms), "port#");
    }

    #[test]
    fn regex_extract_returns_named_group() {
        let transforms = vec![spec("regex_extract", &[r"port(\d+)"])];
        assert_eq!(apply_chain(&json!("port8080"), &transforms), "8080");
    }

    #[test]
    fn regex_extract_returns_empty_string_on_no_match() {
        let transforms = vec![spec("regex_extract", &[r"port(\d+)"])];
        assert_eq!(apply_chain(&json!("no digits here"), &transforms), "");
    }

    #[test]
    fn regex_extract_honors_custom_group() {
        let transforms = vec![spec("regex_extract", &[r"(\w+)=(\d+)", "2"])];
        assert_eq!(apply_chain(&json!("port=8080"), &transforms), "8080");
    }
}
