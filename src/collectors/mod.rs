//! Import Collectors: per-extension parsers that scan a file's text for
//! imports and resources.

mod css;
mod es_module;
mod js;
mod json;

pub use css::CssCollector;
pub use es_module::EsModuleCollector;
pub use js::JsCollector;
pub use json::JsonCollector;

use crate::error::Result;
use crate::profiler::Profiler;
use crate::resolver::Resolver;
use crate::types::{File, ImportCollection};
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use rustc_hash::{FxHashMap, FxHasher};

/// A per-extension parser. Implementations return a freshly-built
/// `ImportCollection` rather than mutating a caller-owned one: order
/// preservation within the returned collection is the only contract a
/// caller relies on.
pub trait Collector {
  fn supports(&self, file: &File) -> bool;
  fn collect(&self, root: &Path, file: &File, resolver: &Resolver) -> Result<ImportCollection>;
}

/// Wraps a `Collector`, memoizing its output keyed by the content hash of
/// the input file. The cache is shared across every call into this
/// decorator, both within one Finder traversal and (since it's handed to
/// the Finder as an `Rc`) across repeated pushes in the same process.
pub struct CachedCollector<C> {
  inner: C,
  cache: RefCell<FxHashMap<u64, ImportCollection>>,
  profiler: Arc<Profiler>,
}

impl<C> CachedCollector<C> {
  pub fn new(inner: C) -> Self {
    Self::with_profiler(inner, Arc::new(Profiler::new(false)))
  }

  pub fn with_profiler(inner: C, profiler: Arc<Profiler>) -> Self {
    Self {
      inner,
      cache: RefCell::new(FxHashMap::default()),
      profiler,
    }
  }
}

impl<C: Collector> Collector for CachedCollector<C> {
  fn supports(&self, file: &File) -> bool {
    self.inner.supports(file)
  }

  fn collect(&self, root: &Path, file: &File, resolver: &Resolver) -> Result<ImportCollection> {
    let start = Instant::now();
    let contents = std::fs::read_to_string(file.to_disk_path(root))?;
    let mut hasher = FxHasher::default();
    contents.hash(&mut hasher);
    let key = hasher.finish();

    if let Some(cached) = self.cache.borrow().get(&key) {
      self
        .profiler
        .record_collector(true, start.elapsed().as_nanos() as u64);
      return Ok(cached.clone());
    }

    let collection = self.inner.collect(root, file, resolver)?;
    self.cache.borrow_mut().insert(key, collection.clone());
    self
      .profiler
      .record_collector(false, start.elapsed().as_nanos() as u64);
    Ok(collection)
  }
}

/// The built-in collector registry, in first-match order. The combined
/// ES-module collector is registered ahead of the bare JS collector so that
/// `.js` files (which both support) get the richer ES+require scan; the
/// plain JS collector only ends up selected for `.node` files. Each
/// collector's cache layer reports its invocations to `profiler`, feeding
/// the "Import Collectors" section of `Profiler::print_report`.
pub fn default_collectors(profiler: Arc<Profiler>) -> Vec<Rc<dyn Collector>> {
  vec![
    Rc::new(CachedCollector::with_profiler(JsonCollector, profiler.clone())),
    Rc::new(CachedCollector::with_profiler(EsModuleCollector::new(), profiler.clone())),
    Rc::new(CachedCollector::with_profiler(CssCollector::new(), profiler.clone())),
    Rc::new(CachedCollector::with_profiler(JsCollector::new(), profiler)),
  ]
}
