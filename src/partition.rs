//! Entry/Asset partition: splits a dependency list into bundle, vendor and
//! asset groups, purely from the peek oracle.

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::types::{Dependency, File};

/// Terminal extensions treated as "script-like" for partitioning purposes.
/// `.js` is the obvious case; `.json` is included because a JSON leaf
/// dependency is still concatenated into the runtime registry rather than
/// emitted as a standalone asset.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "json"];

#[derive(Debug, Default, Clone)]
pub struct Partition {
  pub bundle: Vec<Dependency>,
  pub vendor: Vec<Dependency>,
  pub assets: Vec<Dependency>,
}

/// Splits `deps` into bundle/vendor/asset groups. Pure given the dependency
/// list and the peek oracle: it never reads file contents itself.
pub fn partition(
  deps: &[Dependency],
  pipeline: &Pipeline,
  external_packages_dir: &str,
) -> Result<Partition> {
  let mut out = Partition::default();

  for dep in deps {
    if dep.inlined_asset {
      out.assets.push(dep.clone());
      continue;
    }

    let terminal_extension = pipeline.peek(&dep.file)?;
    if SCRIPT_EXTENSIONS.contains(&terminal_extension.as_str()) {
      if contains_segment(dep.file.path(), external_packages_dir) {
        out.vendor.push(dep.clone());
      } else {
        out.bundle.push(dep.clone());
      }
    } else {
      out.assets.push(dep.clone());
    }
  }

  Ok(out)
}

fn contains_segment(path: &str, segment: &str) -> bool {
  path.split('/').any(|s| s == segment)
}

pub fn entry_bundle_target(entry_name: &str) -> String {
  format!("{entry_name}.js")
}

pub fn entry_vendor_target(entry_name: &str) -> String {
  format!("{entry_name}.vendor.js")
}

/// The relative output path for a standalone asset: source-root prefix
/// stripped, extension replaced by the peeked terminal extension.
pub fn asset_target(asset: &File, terminal_extension: &str, source_root: &str) -> String {
  let stripped = asset
    .strip_prefix(source_root)
    .unwrap_or_else(|| asset.path().to_string());
  File::new(stripped).with_extension(terminal_extension).path().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pipeline::{IdentityProcessor, Pipeline, TsStripProcessor};
  use std::fs;
  use tempfile::TempDir;

  fn write(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn splits_bundle_vendor_and_asset() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "src/app.ts", "");
    write(tmp.path(), "node_modules/lib/index.js", "");
    write(tmp.path(), "src/app.css", "");

    let pipeline = Pipeline::new(
      tmp.path().to_path_buf(),
      vec![Box::new(TsStripProcessor::new()), Box::new(IdentityProcessor)],
      "src".to_string(),
    );

    let deps = vec![
      Dependency::new(File::new("src/app.ts")),
      Dependency::new(File::new("node_modules/lib/index.js")),
      Dependency::new(File::new("src/app.css")),
    ];

    let p = partition(&deps, &pipeline, "node_modules").unwrap();
    assert_eq!(p.bundle.len(), 1);
    assert_eq!(p.bundle[0].file.path(), "src/app.ts");
    assert_eq!(p.vendor.len(), 1);
    assert_eq!(p.vendor[0].file.path(), "node_modules/lib/index.js");
    assert_eq!(p.assets.len(), 1);
    assert_eq!(p.assets[0].file.path(), "src/app.css");
  }

  #[test]
  fn asset_target_strips_source_root_and_replaces_extension() {
    let target = asset_target(&File::new("src/styles/app.css"), "css", "src");
    assert_eq!(target, "styles/app.css");
  }
}
