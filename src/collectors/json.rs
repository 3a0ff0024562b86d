use super::Collector;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::{File, ImportCollection};
use std::path::Path;

/// JSON files are leaves: no imports, no resources.
pub struct JsonCollector;

impl Collector for JsonCollector {
  fn supports(&self, file: &File) -> bool {
    file.extension() == "json"
  }

  fn collect(&self, _root: &Path, _file: &File, _resolver: &Resolver) -> Result<ImportCollection> {
    Ok(ImportCollection::new())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolver::Resolver;
  use tempfile::TempDir;

  #[test]
  fn supports_only_json() {
    let c = JsonCollector;
    assert!(c.supports(&File::new("data.json")));
    assert!(!c.supports(&File::new("data.js")));
  }

  #[test]
  fn leaf_file_yields_empty_collection() {
    let tmp = TempDir::new().unwrap();
    let resolver = Resolver::new(tmp.path(), Default::default());
    let collection = JsonCollector
      .collect(tmp.path(), &File::new("data.json"), &resolver)
      .unwrap();
    assert!(collection.is_empty());
  }
}
