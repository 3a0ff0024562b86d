//! Configuration loader: a serde-deserializable manifest describing a
//! project's bundler options, with `assetFiles` glob expansion layered on
//! top. The library itself (driver, pipeline, resolver, finder) never
//! depends on this module — only the CLI does.

use crate::error::{BundlerError, Result};
use crate::types::BundlerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManifestConfig {
  pub project_root: Option<PathBuf>,
  pub web_root: Option<PathBuf>,
  pub output_folder: Option<PathBuf>,
  pub source_root: Option<PathBuf>,
  #[serde(default)]
  pub entry_points: Vec<PathBuf>,
  #[serde(default)]
  pub asset_files: Vec<String>,
  #[serde(default)]
  pub include_paths: Vec<PathBuf>,
  pub cache_dir: Option<PathBuf>,
  pub is_dev: Option<bool>,
}

impl ManifestConfig {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
  }

  /// Expands `assetFiles` glob patterns against `project_root`. Entries
  /// that don't match anything on disk are kept literally, so a manifest
  /// can still declare an asset file that hasn't been created yet.
  pub fn expand_asset_files(&self, project_root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in &self.asset_files {
      let full_pattern = project_root.join(pattern);
      let paths = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
        BundlerError::InvalidConfig(format!("bad assetFiles glob '{pattern}': {e}"))
      })?;

      let mut matched_any = false;
      for entry in paths {
        let path = entry.map_err(|e| BundlerError::Io(e.into_error()))?;
        if let Ok(rel) = path.strip_prefix(project_root) {
          out.push(rel.to_path_buf());
          matched_any = true;
        }
      }
      if !matched_any {
        out.push(PathBuf::from(pattern));
      }
    }
    Ok(out)
  }

  pub fn into_bundler_config(self) -> Result<BundlerConfig> {
    let project_root = self
      .project_root
      .clone()
      .ok_or_else(|| BundlerError::InvalidConfig("projectRoot is required".to_string()))?;

    let asset_files = self.expand_asset_files(&project_root)?;

    Ok(BundlerConfig {
      web_root: self.web_root.unwrap_or_else(|| project_root.clone()),
      output_folder: self.output_folder.unwrap_or_else(|| PathBuf::from("build")),
      source_root: self.source_root.unwrap_or_else(|| PathBuf::from("src")),
      entry_points: self.entry_points,
      asset_files,
      include_paths: self.include_paths,
      cache_dir: self
        .cache_dir
        .unwrap_or_else(|| project_root.join(".bundlr-cache")),
      is_dev: self.is_dev.unwrap_or(false),
      external_packages_dir: "node_modules".to_string(),
      resolve_extensions: vec![
        "ts".to_string(),
        "js".to_string(),
        "json".to_string(),
        "node".to_string(),
      ],
      project_root,
    })
  }
}
