// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rule loading: resolves `.yml`/`.yaml` paths, parses the three
//! document shapes a rule file may take, normalizes taxonomy, and
//! compiles every rule's `where`/`select` clauses into the predicate
//! tree the rule engine executes.

mod compile;
mod document;
mod loader;
mod normalize;
mod roundtrip;

use std::path::PathBuf;

use ioc_core::{CanonicalRule, IocError, Result, Taxonomy};
use tracing::info;

use document::RawRule;

pub use document::expand_document;
pub use roundtrip::{rule_to_document_value, where_to_value};

/// Compiles one [`RawRule`] (already taxonomy-coalesced against its
/// document's `meta` block, if any) into a [`CanonicalRule`].
pub fn compile_raw_rule(raw: RawRule) -> Result<CanonicalRule> {
    compile::validate_from(raw.from.as_deref(), &raw.source)?;
    let select = compile::compile_select(&raw.select, &raw.source)?;
    let where_ = compile::compile_where(&raw.where_raw, &raw.source)?;
    let taxonomy = Taxonomy::merge(&raw.meta, &raw.taxonomy_raw);
    Ok(CanonicalRule {
        name: raw.name,
        variant_name: raw.variant_name,
        meta: raw.meta,
        from: raw.from,
        select,
        where_,
        taxonomy,
        source: raw.source,
    })
}

/// Loads and compiles every rule reachable from `paths`: directories
/// contribute their immediate `.yml`/`.yaml` children, files are loaded
/// directly. Each file may hold any of the three document shapes
/// (§4.1); a single bad document aborts the whole load, since a rule
/// set is meant to be reviewed and versioned as a unit.
pub fn load_rules(paths: &[PathBuf]) -> Result<Vec<CanonicalRule>> {
    let files = loader::resolve_rule_files(paths)?;
    let mut rules = Vec::new();
    for file in &files {
        let data = loader::parse_yaml_document(file)?;
        let raw_rules = document::expand_document(data, file)?;
        for raw in raw_rules {
            rules.push(compile_raw_rule(raw)?);
        }
    }
    info!(count = rules.len(), files = files.len(), "loaded rule set");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_rule_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_mixed_shapes_yields_three_rules() {
        let dir = tempfile::tempdir().unwrap();
        write_rule_file(
            &dir,
            "list.yml",
            r"
- name: rule_a
  select:
    - field: api
      alias: api
  where:
    eq: foo
",
        );
        write_rule_file(
            &dir,
            "meta.yml",
            r"
meta:
  name: rule_b
  tags: [base]
variants:
  - name: rule_b_win
    tags: [win]
    select:
      - field: api
        alias: api
    where:
      startswith: Create
",
        );
        write_rule_file(
            &dir,
            "single.yml",
            r"
name: rule_c
select:
  - field: api
    alias: api
where:
  not_exists: true
",
        );

        let rules = load_rules(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(rules.len(), 3);
        let variant_rule = rules.iter().find(|r| r.name == "rule_b").unwrap();
        assert_eq!(variant_rule.variant(), Some("rule_b_win"));
        assert_eq!(variant_rule.taxonomy.tags, vec!["win".to_string(), "base".to_string()]);
    }

    #[test]
    fn rejects_invalid_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        write_rule_file(&dir, "bad.yml", "just_a_string: true\n");
        let err = load_rules(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, IocError::InvalidRuleFormat { .. }));
    }

    #[test]
    fn non_recursive_directory_scan() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        write_rule_file(&dir, "top.yml", "name: r\nselect: []\nwhere: {}\n");
        std::fs::write(nested.join("deep.yml"), "name: r2\nselect: []\nwhere: {}\n").unwrap();
        let rules = load_rules(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(rules.len(), 1);
    }
}
