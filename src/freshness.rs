//! Freshness Oracle: decides whether an output is stale with respect to
//! its declared inputs and their mtimes.

use crate::error::Result;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct FreshnessOracle {
  cache_dir: PathBuf,
  is_dev: bool,
}

impl FreshnessOracle {
  pub fn new(cache_dir: PathBuf, is_dev: bool) -> Self {
    Self { cache_dir, is_dev }
  }

  /// Returns true if `output` needs to be rewritten given its current
  /// `inputs`. When stale, rewrites the sidecar with the current input set
  /// before returning, so a second call in the same run sees fresh.
  ///
  /// Bypassed entirely in non-dev mode: every call returns true.
  pub fn is_stale(&self, output: &Path, inputs: &[PathBuf]) -> Result<bool> {
    if !self.is_dev {
      return Ok(true);
    }

    let mut sorted_inputs: Vec<String> = inputs
      .iter()
      .map(|p| p.to_string_lossy().into_owned())
      .collect();
    sorted_inputs.sort();

    let sidecar = self.sidecar_path(output);
    let stale = self.check_stale(output, &sidecar, &sorted_inputs);

    if stale {
      if let Some(parent) = sidecar.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(&sidecar, serde_json::to_string(&sorted_inputs)?)?;
    }

    Ok(stale)
  }

  fn check_stale(&self, output: &Path, sidecar: &Path, sorted_inputs: &[String]) -> bool {
    if !sidecar.exists() {
      return true;
    }
    if !output.exists() {
      return true;
    }

    let stored: Vec<String> = match std::fs::read_to_string(sidecar) {
      Ok(raw) => match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
          warn!("corrupt sources sidecar {:?}: {e}", sidecar);
          return true;
        }
      },
      Err(e) => {
        warn!("could not read sources sidecar {:?}: {e}", sidecar);
        return true;
      }
    };

    if stored != sorted_inputs {
      return true;
    }

    let output_mtime = match std::fs::metadata(output).and_then(|m| m.modified()) {
      Ok(m) => m,
      Err(_) => return true,
    };

    sorted_inputs.iter().any(|input| {
      std::fs::metadata(input)
        .and_then(|m| m.modified())
        .map(|mtime| mtime > output_mtime)
        .unwrap_or(false)
    })
  }

  fn sidecar_path(&self, output: &Path) -> PathBuf {
    self.cache_dir.join(format!("{:x}.sources", hash_path(output)))
  }
}

fn hash_path(path: &Path) -> u64 {
  let mut hasher = FxHasher::default();
  path.to_string_lossy().hash(&mut hasher);
  hasher.finish()
}
