//! Node-style module resolution: turns an import specifier into a resolved
//! file or bare-package module.

use crate::error::{BundlerError, Result};
use crate::types::{File, Import, Module, Resolved};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ResolverOptions {
  pub extensions: Vec<String>,
  pub include_paths: Vec<PathBuf>,
  pub external_packages_dir: String,
}

impl Default for ResolverOptions {
  fn default() -> Self {
    Self {
      extensions: vec![
        "ts".to_string(),
        "js".to_string(),
        "json".to_string(),
        "node".to_string(),
      ],
      include_paths: Vec::new(),
      external_packages_dir: "node_modules".to_string(),
    }
  }
}

#[derive(Deserialize)]
struct PackageJson {
  #[serde(default)]
  main: Option<serde_json::Value>,
}

/// Resolves import specifiers to on-disk files, rooted at a single project
/// directory. Stateless beyond its configuration: callers are expected to
/// layer caching (the Import Collectors' `CachedImportCollector`) on top.
pub struct Resolver {
  root: PathBuf,
  extensions: Vec<String>,
  include_paths: Vec<String>,
  external_packages_dir: String,
}

impl Resolver {
  pub fn new(root: impl Into<PathBuf>, options: ResolverOptions) -> Self {
    let root = root.into();
    let include_paths = options
      .include_paths
      .into_iter()
      .map(|p| File::new(p.to_string_lossy()).path().to_string())
      .collect();
    Self {
      root,
      extensions: options.extensions,
      include_paths,
      external_packages_dir: options.external_packages_dir,
    }
  }

  /// Resolve `specifier` as written inside `from`.
  pub fn resolve(&self, specifier: &str, from: &File) -> Result<Import> {
    if specifier.starts_with("./") || specifier.starts_with("../") {
      let file = self.resolve_relative_to(specifier, from.dir(), from)?;
      Ok(Import {
        specifier: specifier.to_string(),
        resolved: Resolved::File(file),
      })
    } else {
      let file = self.resolve_bare(specifier, from)?;
      Ok(Import {
        specifier: specifier.to_string(),
        resolved: Resolved::Module(Module {
          name: specifier.to_string(),
          file,
        }),
      })
    }
  }

  fn exists(&self, file: &File) -> bool {
    file.to_disk_path(&self.root).is_file()
  }

  fn is_dir(&self, file: &File) -> bool {
    file.to_disk_path(&self.root).is_dir()
  }

  /// Extension-probe a literal candidate path, then fall back to
  /// `index.<ext>` if the candidate is (or could be) a directory.
  fn probe(&self, candidate: &File) -> Option<File> {
    if self.exists(candidate) {
      return Some(candidate.clone());
    }
    for ext in &self.extensions {
      let with_ext = candidate.append_extension(ext);
      if self.exists(&with_ext) {
        return Some(with_ext);
      }
    }
    if self.is_dir(candidate) || !candidate.to_disk_path(&self.root).exists() {
      for ext in &self.extensions {
        let index = File::new(format!("{}/index.{ext}", candidate.path()));
        if self.exists(&index) {
          return Some(index);
        }
      }
    }
    None
  }

  fn resolve_relative_to(&self, specifier: &str, dir: &str, from: &File) -> Result<File> {
    let candidate = if dir.is_empty() {
      File::new(specifier)
    } else {
      File::new(format!("{dir}/{specifier}"))
    };
    self.probe(&candidate).ok_or_else(|| BundlerError::NotFound {
      specifier: specifier.to_string(),
      from: from.to_disk_path(&self.root),
    })
  }

  fn resolve_bare(&self, specifier: &str, from: &File) -> Result<File> {
    let (head, remainder) = split_specifier(specifier);

    let mut search_dirs: Vec<String> = Vec::new();
    let mut cur = from.dir().to_string();
    loop {
      search_dirs.push(cur.clone());
      if cur.is_empty() {
        break;
      }
      match cur.rfind('/') {
        Some(idx) => cur.truncate(idx),
        None => cur.clear(),
      }
    }
    for include in &self.include_paths {
      search_dirs.push(include.clone());
    }

    for dir in &search_dirs {
      let package_root = if dir.is_empty() {
        format!("{}/{head}", self.external_packages_dir)
      } else {
        format!("{dir}/{}/{head}", self.external_packages_dir)
      };

      if let Some(file) = self.resolve_in_package(&package_root, remainder) {
        debug!("resolved '{specifier}' via {package_root}");
        return Ok(file);
      }
    }

    Err(BundlerError::NotFound {
      specifier: specifier.to_string(),
      from: from.to_disk_path(&self.root),
    })
  }

  fn resolve_in_package(&self, package_root: &str, remainder: &str) -> Option<File> {
    let package_dir = File::new(package_root);
    if !self.is_dir(&package_dir) {
      return None;
    }

    if !remainder.is_empty() {
      let candidate = File::new(format!("{package_root}/{remainder}"));
      return self.probe(&candidate);
    }

    if let Some(main) = self.read_package_main(&package_dir) {
      let candidate = File::new(format!("{package_root}/{main}"));
      if let Some(resolved) = self.probe(&candidate) {
        return Some(resolved);
      }
    }

    for ext in &self.extensions {
      let index = File::new(format!("{package_root}/index.{ext}"));
      if self.exists(&index) {
        return Some(index);
      }
    }
    None
  }

  /// Reads `package.json`'s `main` field. Only a string value is honored;
  /// array/object values fall through to `index.*` probing rather than
  /// attempting browser/esm-aware field selection.
  fn read_package_main(&self, package_dir: &File) -> Option<String> {
    let manifest = File::new(format!("{}/package.json", package_dir.path()));
    let contents = std::fs::read_to_string(manifest.to_disk_path(&self.root)).ok()?;
    let parsed: PackageJson = serde_json::from_str(&contents).ok()?;
    match parsed.main {
      Some(serde_json::Value::String(s)) => Some(s),
      _ => None,
    }
  }
}

/// Splits a bare specifier into its package head (`@scope/name` or `name`)
/// and the remaining path, if any.
fn split_specifier(specifier: &str) -> (&str, &str) {
  let mut parts = specifier.splitn(if specifier.starts_with('@') { 3 } else { 2 }, '/');
  let first = parts.next().unwrap_or("");
  if specifier.starts_with('@') {
    let second = parts.next().unwrap_or("");
    let head_len = first.len() + 1 + second.len();
    let remainder = specifier.get(head_len + 1..).unwrap_or("");
    let head = &specifier[..head_len];
    (head, remainder)
  } else {
    let remainder = specifier.get(first.len() + 1..).unwrap_or("");
    (first, remainder)
  }
}
