// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolves rule file paths and loads every rule document they contain.

use std::fs;
use std::path::{Path, PathBuf};

use ioc_core::{IocError, Result};

fn is_rule_extension(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yml" | "yaml"))
}

/// Resolves a list of input paths to concrete rule files: a directory
/// contributes its immediate (non-recursive) `.yml`/`.yaml` children, a
/// file is kept as-is if it has one of those extensions.
pub fn resolve_rule_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| IocError::InputReadError {
                path: path.clone(),
                source,
            })?;
            let mut matched: Vec<PathBuf> = entries
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && is_rule_extension(p))
                .collect();
            matched.sort();
            files.extend(matched);
        } else if is_rule_extension(path) {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Parses one rule file's YAML content into the generic JSON value tree
/// the document-shape parser and compiler both operate on.
pub fn parse_yaml_document(path: &Path) -> Result<serde_json::Value> {
    let content = fs::read_to_string(path).map_err(|source| IocError::InputReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|e| IocError::InvalidRuleFormat {
        source_path: path.to_path_buf(),
        reason: format!("YAML parse error: {e}"),
    })
}
