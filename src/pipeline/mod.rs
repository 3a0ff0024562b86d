//! Content Pipeline: drives each file through processors until a terminal
//! state, with a non-mutating peek mode.

mod processors;

pub use processors::{IdentityProcessor, TsStripProcessor};

use crate::error::{BundlerError, Result};
use crate::events::{EventSink, NullEventSink, PipelineEvent};
use crate::types::{ContentItem, ContentState, Dependency, File, PipelineState};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Each processor exposes the same three-way contract: whether it wants to
/// handle an item in its current state, a mutating transform, and a
/// state-only peek that must make the identical transition.
pub trait Processor {
  fn supports(&self, state: &ContentState) -> bool;
  fn transpile(&self, root: &Path, item: &mut ContentItem) -> Result<()>;
  fn peek(&self, state: &mut ContentState) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct CachedContent {
  content: String,
  extension: String,
}

/// A processor failure is wrapped with the offending module's name before
/// it's rethrown, so the error the driver ultimately sees always names which
/// module the pipeline was working on.
fn wrap_processor_error(module: String, error: BundlerError) -> BundlerError {
  BundlerError::Parse {
    module,
    message: error.to_string(),
  }
}

pub struct Pipeline {
  root: PathBuf,
  processors: Vec<Box<dyn Processor>>,
  events: Rc<dyn EventSink>,
  source_root: String,
  cache_dir: Option<PathBuf>,
}

impl Pipeline {
  pub fn new(root: PathBuf, processors: Vec<Box<dyn Processor>>, source_root: String) -> Self {
    Self {
      root,
      processors,
      events: Rc::new(NullEventSink),
      source_root,
      cache_dir: None,
    }
  }

  pub fn with_events(mut self, events: Rc<dyn EventSink>) -> Self {
    self.events = events;
    self
  }

  /// Enables the dev-mode per-item cache, storing `(content, extension)`
  /// pairs under `cache_dir` keyed by the input file's content hash.
  pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
    self.cache_dir = Some(cache_dir);
    self
  }

  /// The module name a file is given when no more specific name (e.g. a
  /// bare package specifier) is available: its path with the source root
  /// prefix stripped.
  pub(crate) fn module_name_for(&self, file: &File) -> String {
    file
      .strip_prefix(&self.source_root)
      .unwrap_or_else(|| file.path().to_string())
  }

  /// Runs only the state-machine side of processors to learn the terminal
  /// extension a file would reach after transpilation, without touching
  /// its content.
  pub fn peek(&self, file: &File) -> Result<String> {
    let mut state = ContentState::new(file.extension());
    self.drive_state(&mut state, file.path())?;
    Ok(state.extension().to_string())
  }

  /// Drives a single file through the processors (or loads it from the
  /// dev-mode cache) and returns its final, processed content.
  pub(crate) fn process_item(&self, file: &File, module_name: String) -> Result<String> {
    let mut item = self.load_or_build_item(file, module_name)?;
    if !item.state.is_ready() {
      self.drive_item(&mut item)?;
      self.store_cache(file, &item)?;
    }
    item.content(&self.root)
  }

  /// Dispatches the final "ready" event for a concatenated target, carrying
  /// its assembled content.
  pub(crate) fn notify_ready(&self, target: &str, content: &str) {
    let target_item = ContentItem {
      file: File::new(target),
      module_name: target.to_string(),
      state: {
        let mut s = ContentState::new("");
        s.set(PipelineState::Ready, "");
        s
      },
      source: crate::types::ContentSource::Buffered(content.to_string()),
    };
    self.events.handle(PipelineEvent::Ready { item: &target_item });
  }

  /// Runs every non-virtual dependency through processors and concatenates
  /// the resulting content in list order. The pipeline imposes no structure
  /// beyond that concatenation; a caller that wants the content wrapped in
  /// some registry format builds that wrapping itself from each item's
  /// processed content.
  pub fn push(&self, deps: &[Dependency], target: &str) -> Result<String> {
    let mut parts = Vec::new();

    for dep in deps {
      if dep.is_virtual {
        continue;
      }
      let module_name = self.module_name_for(&dep.file);
      parts.push(self.process_item(&dep.file, module_name)?);
    }

    let out = parts.join("\n");
    self.notify_ready(target, &out);
    Ok(out)
  }

  fn load_or_build_item(&self, file: &File, module_name: String) -> Result<ContentItem> {
    if let Some(cached) = self.load_cache(file)? {
      let mut item = ContentItem::new(file.clone(), module_name);
      item.set_content(cached.content);
      item.state.set(PipelineState::Ready, cached.extension);
      return Ok(item);
    }
    Ok(ContentItem::new(file.clone(), module_name))
  }

  fn drive_item(&self, item: &mut ContentItem) -> Result<()> {
    while !item.state.is_ready() {
      let before = (item.state.state(), item.state.extension().to_string());
      let processor = self
        .processors
        .iter()
        .find(|p| p.supports(&item.state))
        .ok_or_else(|| BundlerError::StateStuck {
          module: item.module_name.clone(),
        })?;

      self.events.handle(PipelineEvent::PreProcess { item });
      processor
        .transpile(&self.root, item)
        .map_err(|e| wrap_processor_error(item.module_name.clone(), e))?;
      self.events.handle(PipelineEvent::PostProcess { item });

      let after = (item.state.state(), item.state.extension().to_string());
      if before == after {
        return Err(BundlerError::StateStuck {
          module: item.module_name.clone(),
        });
      }
    }
    Ok(())
  }

  fn drive_state(&self, state: &mut ContentState, module: &str) -> Result<()> {
    while !state.is_ready() {
      let before = (state.state(), state.extension().to_string());
      let processor = self
        .processors
        .iter()
        .find(|p| p.supports(state))
        .ok_or_else(|| BundlerError::StateStuck {
          module: module.to_string(),
        })?;

      processor
        .peek(state)
        .map_err(|e| wrap_processor_error(module.to_string(), e))?;

      let after = (state.state(), state.extension().to_string());
      if before == after {
        return Err(BundlerError::StateStuck {
          module: module.to_string(),
        });
      }
    }
    Ok(())
  }

  fn cache_key(&self, file: &File) -> Result<u64> {
    let contents = std::fs::read(file.to_disk_path(&self.root))?;
    let mut hasher = FxHasher::default();
    contents.hash(&mut hasher);
    Ok(hasher.finish())
  }

  fn cache_path(&self, key: u64) -> Option<PathBuf> {
    self.cache_dir.as_ref().map(|dir| dir.join(format!("{key:x}")))
  }

  fn load_cache(&self, file: &File) -> Result<Option<CachedContent>> {
    if self.cache_dir.is_none() {
      return Ok(None);
    }
    let key = self.cache_key(file)?;
    let Some(path) = self.cache_path(key) else {
      return Ok(None);
    };
    if !path.exists() {
      return Ok(None);
    }
    let input_mtime = std::fs::metadata(file.to_disk_path(&self.root))?.modified()?;
    let cache_mtime = std::fs::metadata(&path)?.modified()?;
    if cache_mtime < input_mtime {
      return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
  }

  fn store_cache(&self, file: &File, item: &ContentItem) -> Result<()> {
    if self.cache_dir.is_none() {
      return Ok(());
    }
    let key = self.cache_key(file)?;
    let Some(path) = self.cache_path(key) else {
      return Ok(());
    };
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let payload = CachedContent {
      content: item.content(&self.root)?,
      extension: item.state.extension().to_string(),
    };
    std::fs::write(path, serde_json::to_string(&payload)?)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn default_pipeline(root: &Path, source_root: &str) -> Pipeline {
    Pipeline::new(
      root.to_path_buf(),
      vec![Box::new(TsStripProcessor::new()), Box::new(IdentityProcessor)],
      source_root.to_string(),
    )
  }

  #[test]
  fn peek_matches_push_terminal_extension() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("x.ts"), "const x: number = 1;\n").unwrap();

    let pipeline = default_pipeline(tmp.path(), "");
    assert_eq!(pipeline.peek(&File::new("x.ts")).unwrap(), "js");

    let deps = vec![Dependency::new(File::new("x.ts"))];
    let out = pipeline.push(&deps, "bundle.js").unwrap();
    assert!(out.contains("const x = 1;"));
  }

  #[test]
  fn push_concatenates_raw_processed_content_without_imposing_a_format() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("src/app.js"), "console.log(1);\n").unwrap();

    let pipeline = default_pipeline(tmp.path(), "src");
    let deps = vec![Dependency::new(File::new("src/app.js"))];
    let out = pipeline.push(&deps, "bundle.js").unwrap();

    assert_eq!(out, "console.log(1);\n");
  }

  #[test]
  fn push_joins_multiple_items_with_a_separator_and_no_trailing_bytes() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.js"), "const a = 1;").unwrap();
    fs::write(tmp.path().join("b.js"), "const b = 2;").unwrap();

    let pipeline = default_pipeline(tmp.path(), "");
    let deps = vec![
      Dependency::new(File::new("a.js")),
      Dependency::new(File::new("b.js")),
    ];
    let out = pipeline.push(&deps, "bundle.js").unwrap();

    assert_eq!(out, "const a = 1;\nconst b = 2;");
  }

  #[test]
  fn single_asset_push_produces_unmodified_content() {
    let tmp = TempDir::new().unwrap();
    let raw = "binary-ish-content-with-no-trailing-newline";
    fs::write(tmp.path().join("logo.png"), raw).unwrap();

    let pipeline = default_pipeline(tmp.path(), "");
    let deps = vec![Dependency::new(File::new("logo.png"))];
    let out = pipeline.push(&deps, "logo.png").unwrap();

    assert_eq!(out, raw);
  }

  #[test]
  fn module_name_strips_source_root() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("src/app.js"), "console.log(1);\n").unwrap();

    let pipeline = default_pipeline(tmp.path(), "src");
    assert_eq!(
      pipeline.module_name_for(&File::new("src/app.js")),
      "app.js"
    );
  }

  #[test]
  fn virtual_dependencies_are_skipped_in_push() {
    let tmp = TempDir::new().unwrap();
    let pipeline = default_pipeline(tmp.path(), "");
    let deps = vec![Dependency::virtual_dependency(File::new("require.js"))];
    let out = pipeline.push(&deps, "bundle.js").unwrap();
    assert_eq!(out, "");
  }

  #[test]
  fn dev_cache_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let cache_dir = tmp.path().join(".cache");
    fs::write(tmp.path().join("x.ts"), "const x: number = 1;\n").unwrap();

    let pipeline = default_pipeline(tmp.path(), "").with_cache_dir(cache_dir.clone());
    let deps = vec![Dependency::new(File::new("x.ts"))];
    pipeline.push(&deps, "bundle.js").unwrap();

    assert!(fs::read_dir(&cache_dir).unwrap().next().is_some());

    // Second run should load from cache without re-invoking processors.
    let out2 = pipeline.push(&deps, "bundle.js").unwrap();
    assert!(out2.contains("const x = 1;"));
  }
}
