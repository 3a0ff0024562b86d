//! Import Finder: recursive, deduplicated traversal of a file's import
//! graph.

use crate::collectors::Collector;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::{Dependency, File};
use rustc_hash::FxHashSet;
use std::path::PathBuf;
use std::rc::Rc;

pub struct Finder {
  root: PathBuf,
  resolver: Resolver,
  collectors: Vec<Rc<dyn Collector>>,
}

impl Finder {
  pub fn new(root: PathBuf, resolver: Resolver, collectors: Vec<Rc<dyn Collector>>) -> Self {
    Self {
      root,
      resolver,
      collectors,
    }
  }

  /// Returns the transitive, deduplicated closure of imports rooted at
  /// `entry`, with `entry` itself last in emission order.
  pub fn all(&self, entry: &File) -> Result<Vec<Dependency>> {
    let mut visited = FxHashSet::default();
    let mut deps = Vec::new();
    self.visit(entry, false, None, &mut visited, &mut deps)?;
    Ok(deps)
  }

  fn visit(
    &self,
    file: &File,
    inlined_asset: bool,
    module_name: Option<String>,
    visited: &mut FxHashSet<String>,
    deps: &mut Vec<Dependency>,
  ) -> Result<()> {
    if !visited.insert(file.path().to_string()) {
      return Ok(());
    }

    if let Some(collector) = self.collectors.iter().find(|c| c.supports(file)) {
      let collection = collector.collect(&self.root, file, &self.resolver)?;

      for import in collection.imports() {
        let child_module_name = import.resolved.module_name().map(str::to_string);
        self.visit(import.resolved.file(), false, child_module_name, visited, deps)?;
      }
      for resource in collection.resources() {
        self.visit(resource, true, None, visited, deps)?;
      }
    }

    let mut dep = Dependency::new(file.clone());
    dep.inlined_asset = inlined_asset;
    dep.module_name = module_name;
    deps.push(dep);
    Ok(())
  }
}
