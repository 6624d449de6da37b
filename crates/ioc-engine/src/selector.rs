// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! JMESPath selector resolution.
//!
//! A rule's field expressions are validated at load time by `ioc-rules`
//! but kept as plain strings on the canonical rule, since a compiled
//! `jmespath::Expression` is not `Send` and rules are broadcast to
//! every worker thread. Each worker lazily compiles and memoizes the
//! expressions it actually evaluates in a thread-local cache, so the
//! compile cost is paid once per worker rather than once per entry.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

thread_local! {
    static EXPRESSION_CACHE: RefCell<HashMap<String, jmespath::Expression<'static>>> =
        RefCell::new(HashMap::new());
}

fn variable_to_json(var: &jmespath::Variable) -> Value {
    match var {
        jmespath::Variable::Null => Value::Null,
        jmespath::Variable::String(s) => Value::String(s.clone()),
        jmespath::Variable::Bool(b) => Value::Bool(*b),
        jmespath::Variable::Number(n) => serde_json::Number::from_f64(n.as_f64())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        jmespath::Variable::Array(items) => {
            Value::Array(items.iter().map(|i| variable_to_json(i)).collect())
        }
        jmespath::Variable::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), variable_to_json(v));
            }
            Value::Object(out)
        }
        jmespath::Variable::Expref(_) => Value::Null,
    }
}

/// Resolves `expr` (already validated at load time) against `entry`.
/// Returns `None` when the path is absent, the expression is somehow
/// malformed despite load-time validation, or evaluation fails - all
/// three are the same "scope not found" outcome to a caller.
pub fn resolve(entry: &Value, expr: &str) -> Option<Value> {
    EXPRESSION_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if !cache.contains_key(expr) {
            match jmespath::compile(expr) {
                Ok(compiled) => {
                    cache.insert(expr.to_string(), compiled);
                }
                Err(e) => {
                    warn!(selector = expr, error = %e, "selector failed to recompile on worker");
                    return None;
                }
            }
        }
        let compiled = cache.get(expr)?;
        match compiled.search(entry.clone()) {
            Ok(result) if matches!(*result, jmespath::Variable::Null) => None,
            Ok(result) => Some(variable_to_json(&result)),
            Err(e) => {
                warn!(selector = expr, error = %e, "selector evaluation failed");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_field() {
        let entry = json!({"process": {"api": "CreateFileW"}});
        assert_eq!(resolve(&entry, "process.api"), Some(json!("CreateFileW")));
    }

    #[test]
    fn missing_path_resolves_to_none() {
        let entry = json!({"process": {}});
        assert_eq!(resolve(&entry, "process.api"), None);
    }

    #[test]
    fn caches_across_calls() {
        let entry = json!({"a": 1});
        assert_eq!(resolve(&entry, "a"), Some(json!(1)));
        assert_eq!(resolve(&entry, "a"), Some(json!(1)));
    }
}
