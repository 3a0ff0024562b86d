use super::{Collector, JsCollector};
use crate::error::{BundlerError, Result};
use crate::resolver::Resolver;
use crate::types::{File, ImportCollection};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Extracts `import ... from "..."` and bare `import "..."` statements, then
/// delegates to `JsCollector` on the same content to catch mixed `require`
/// calls. Source-document order is preserved within each half of the scan;
/// the ES-import matches are emitted first and the delegated require
/// matches second.
pub struct EsModuleCollector {
  pattern: Regex,
  js: JsCollector,
}

impl EsModuleCollector {
  pub fn new() -> Self {
    Self {
      pattern: Regex::new(r#"import\s+(?:[^'";]+?\s+from\s+)?(['"])([^'"]+)\1"#).unwrap(),
      js: JsCollector::new(),
    }
  }
}

impl Default for EsModuleCollector {
  fn default() -> Self {
    Self::new()
  }
}

impl Collector for EsModuleCollector {
  fn supports(&self, file: &File) -> bool {
    matches!(file.extension(), "js" | "ts")
  }

  fn collect(&self, root: &Path, file: &File, resolver: &Resolver) -> Result<ImportCollection> {
    let contents = std::fs::read_to_string(file.to_disk_path(root))?;
    let mut out = ImportCollection::new();

    for captures in self.pattern.captures_iter(&contents) {
      let specifier = &captures[2];
      match resolver.resolve(specifier, file) {
        Ok(import) => out.add_import(import),
        Err(BundlerError::NotFound { .. }) => {
          debug!("unresolved import '{specifier}' in {file}, dropping");
        }
        Err(e) => return Err(e),
      }
    }

    self.js.scan(&contents, file, resolver, &mut out)?;
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn ts_import_syntax_extraction_matches_source_order() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "Import.ts", "");
    write(tmp.path(), "All.ts", "");
    write(tmp.path(), "Alias.ts", "");
    write(tmp.path(), "module.js", "");
    write(
      tmp.path(),
      "main.ts",
      r#"import X from "./Import"; import "./All"; import * as m from "./Alias"; require("./module.js");"#,
    );

    let resolver = Resolver::new(tmp.path(), Default::default());
    let collector = EsModuleCollector::new();
    let collection = collector
      .collect(tmp.path(), &File::new("main.ts"), &resolver)
      .unwrap();

    let specifiers: Vec<_> = collection
      .imports()
      .iter()
      .map(|i| i.specifier.as_str())
      .collect();
    assert_eq!(specifiers, vec!["./Import", "./All", "./Alias", "./module.js"]);
  }

  #[test]
  fn silently_drops_unresolvable_import() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "main.ts", r#"import "./does-not-exist";"#);

    let resolver = Resolver::new(tmp.path(), Default::default());
    let collector = EsModuleCollector::new();
    let collection = collector
      .collect(tmp.path(), &File::new("main.ts"), &resolver)
      .unwrap();

    assert!(collection.is_empty());
  }
}
