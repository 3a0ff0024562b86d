use super::Collector;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::{File, ImportCollection};
use regex::Regex;
use std::path::Path;

/// Extracts resource references from stylesheets: `url(...)` and `@import`.
/// An example of an asset-side collector plugged in through the same
/// `Collector` interface as the script-side ones.
pub struct CssCollector {
  url_pattern: Regex,
  import_pattern: Regex,
}

impl CssCollector {
  pub fn new() -> Self {
    Self {
      url_pattern: Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).unwrap(),
      import_pattern: Regex::new(r#"@import\s+(?:url\()?['"]([^'"]+)['"]\)?"#).unwrap(),
    }
  }
}

impl Default for CssCollector {
  fn default() -> Self {
    Self::new()
  }
}

impl Collector for CssCollector {
  fn supports(&self, file: &File) -> bool {
    file.extension() == "css"
  }

  fn collect(&self, root: &Path, file: &File, _resolver: &Resolver) -> Result<ImportCollection> {
    let contents = std::fs::read_to_string(file.to_disk_path(root))?;
    let mut out = ImportCollection::new();

    for captures in self.import_pattern.captures_iter(&contents) {
      let specifier = captures[1].trim();
      if specifier.starts_with("http://") || specifier.starts_with("https://") {
        continue;
      }
      out.add_resource(file.join_from_dir(specifier));
    }

    for captures in self.url_pattern.captures_iter(&contents) {
      let specifier = captures[1].trim();
      if specifier.starts_with("http://") || specifier.starts_with("https://") || specifier.starts_with("data:") {
        continue;
      }
      out.add_resource(file.join_from_dir(specifier));
    }

    Ok(out)
  }
}
