use super::Collector;
use crate::error::{BundlerError, Result};
use crate::resolver::Resolver;
use crate::types::{File, ImportCollection};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Extracts `require("...")` calls whose argument is a single string
/// literal. Selected standalone only for `.node` files; for `.js`/`.ts`
/// files the combined `EsModuleCollector` delegates to this same scan.
pub struct JsCollector {
  pattern: Regex,
}

impl JsCollector {
  pub fn new() -> Self {
    Self {
      pattern: Regex::new(r#"require\(\s*(['"])([^'"]+)\1\s*\)"#).unwrap(),
    }
  }

  /// Scan `contents` for require calls, resolving each against `resolver`.
  /// Unresolvable specifiers are dropped silently.
  pub fn scan(
    &self,
    contents: &str,
    file: &File,
    resolver: &Resolver,
    out: &mut ImportCollection,
  ) -> Result<()> {
    for captures in self.pattern.captures_iter(contents) {
      let specifier = &captures[2];
      match resolver.resolve(specifier, file) {
        Ok(import) => out.add_import(import),
        Err(BundlerError::NotFound { .. }) => {
          debug!("unresolved require '{specifier}' in {file}, dropping");
        }
        Err(e) => return Err(e),
      }
    }
    Ok(())
  }
}

impl Default for JsCollector {
  fn default() -> Self {
    Self::new()
  }
}

impl Collector for JsCollector {
  fn supports(&self, file: &File) -> bool {
    matches!(file.extension(), "js" | "node")
  }

  fn collect(&self, root: &Path, file: &File, resolver: &Resolver) -> Result<ImportCollection> {
    let contents = std::fs::read_to_string(file.to_disk_path(root))?;
    let mut out = ImportCollection::new();
    self.scan(&contents, file, resolver, &mut out)?;
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn collects_require_calls_in_order() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.js"), "").unwrap();
    fs::write(tmp.path().join("b.js"), "").unwrap();
    fs::write(
      tmp.path().join("main.js"),
      r#"const a = require("./a"); const b = require('./b');"#,
    )
    .unwrap();

    let resolver = Resolver::new(tmp.path(), Default::default());
    let collector = JsCollector::new();
    let collection = collector
      .collect(tmp.path(), &File::new("main.js"), &resolver)
      .unwrap();

    let specifiers: Vec<_> = collection.imports().iter().map(|i| i.specifier.as_str()).collect();
    assert_eq!(specifiers, vec!["./a", "./b"]);
  }

  #[test]
  fn drops_unresolvable_requires() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("main.js"), r#"require("./missing");"#).unwrap();

    let resolver = Resolver::new(tmp.path(), Default::default());
    let collector = JsCollector::new();
    let collection = collector
      .collect(tmp.path(), &File::new("main.js"), &resolver)
      .unwrap();

    assert!(collection.is_empty());
  }
}
