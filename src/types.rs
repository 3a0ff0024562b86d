use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// A relative-or-absolute POSIX-style path, stored normalized (`/`-separated,
/// `.`/`..` segments collapsed where that can be done without touching disk).
///
/// Two `File`s are equal iff their normalized `path` strings are equal.
#[derive(Debug, Clone, Eq)]
pub struct File {
  path: String,
}

impl File {
  pub fn new(path: impl AsRef<str>) -> Self {
    Self {
      path: normalize(path.as_ref()),
    }
  }

  /// The full normalized path.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// The directory portion (everything before the final `/`), `""` if none.
  pub fn dir(&self) -> &str {
    match self.path.rfind('/') {
      Some(idx) => &self.path[..idx],
      None => "",
    }
  }

  /// The final path segment, including its extension.
  pub fn name(&self) -> &str {
    match self.path.rfind('/') {
      Some(idx) => &self.path[idx + 1..],
      None => &self.path,
    }
  }

  /// The final segment without its extension.
  pub fn basename(&self) -> &str {
    let name = self.name();
    match name.rfind('.') {
      // A leading dot (dotfile) is not an extension separator.
      Some(idx) if idx > 0 => &name[..idx],
      _ => name,
    }
  }

  /// The final dot-suffix, without the leading dot. `""` if there is none.
  pub fn extension(&self) -> &str {
    let name = self.name();
    match name.rfind('.') {
      Some(idx) if idx > 0 => &name[idx + 1..],
      _ => "",
    }
  }

  pub fn is_absolute(&self) -> bool {
    self.path.starts_with('/')
  }

  /// Join a specifier onto this file's directory, the way a requiring module
  /// joins a relative import.
  pub fn join_from_dir(&self, specifier: &str) -> File {
    if specifier.starts_with('/') {
      return File::new(specifier);
    }
    let joined = if self.dir().is_empty() {
      specifier.to_string()
    } else {
      format!("{}/{}", self.dir(), specifier)
    };
    File::new(joined)
  }

  /// Return a new File with `.ext` appended to the full path, leaving any
  /// existing extension in place (e.g. `colors.css` + `ts` -> `colors.css.ts`).
  pub fn append_extension(&self, ext: &str) -> File {
    File::new(format!("{}.{ext}", self.path))
  }

  /// Return a new File with its extension replaced (no leading dot in `ext`).
  pub fn with_extension(&self, ext: &str) -> File {
    let dir = self.dir();
    let base = self.basename();
    let new_name = if ext.is_empty() {
      base.to_string()
    } else {
      format!("{base}.{ext}")
    };
    let path = if dir.is_empty() {
      new_name
    } else {
      format!("{dir}/{new_name}")
    };
    File::new(path)
  }

  /// Strip a leading `prefix` (itself a `File`-style path), if present,
  /// returning the remainder without a leading `/`.
  pub fn strip_prefix(&self, prefix: &str) -> Option<String> {
    let prefix = normalize(prefix);
    let stripped = self.path.strip_prefix(&prefix)?;
    Some(stripped.trim_start_matches('/').to_string())
  }

  pub fn starts_with(&self, prefix: &str) -> bool {
    let prefix = normalize(prefix);
    self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
  }

  /// Resolve this (possibly relative) File against a root directory on disk.
  pub fn to_disk_path(&self, root: &Path) -> PathBuf {
    if self.is_absolute() {
      PathBuf::from(&self.path)
    } else {
      root.join(&self.path)
    }
  }
}

impl PartialEq for File {
  fn eq(&self, other: &Self) -> bool {
    self.path == other.path
  }
}

impl Hash for File {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.path.hash(state);
  }
}

impl std::fmt::Display for File {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.path)
  }
}

/// Collapse `.` and resolvable `..` segments and normalize separators to `/`,
/// without touching the filesystem.
fn normalize(path: &str) -> String {
  let is_absolute = path.starts_with('/');
  let mut out: Vec<&str> = Vec::new();

  for segment in path.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        if matches!(out.last(), Some(last) if *last != "..") {
          out.pop();
        } else if !is_absolute {
          out.push("..");
        }
      }
      seg => out.push(seg),
    }
  }

  let joined = out.join("/");
  if is_absolute {
    format!("/{joined}")
  } else {
    joined
  }
}

/// A file plus the logical specifier dependents use to import it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
  pub name: String,
  pub file: File,
}

/// The resolved side of an [`Import`]: either a project-relative file or a
/// named package module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
  File(File),
  Module(Module),
}

impl Resolved {
  pub fn file(&self) -> &File {
    match self {
      Resolved::File(f) => f,
      Resolved::Module(m) => &m.file,
    }
  }

  /// The module name to emit into the runtime registry: the package
  /// specifier for bare imports, or `None` for project-relative files
  /// (the caller derives a source-root-relative name for those).
  pub fn module_name(&self) -> Option<&str> {
    match self {
      Resolved::File(_) => None,
      Resolved::Module(m) => Some(&m.name),
    }
  }
}

/// A single import statement as seen by a collector: the specifier text and
/// what it resolved to.
#[derive(Debug, Clone)]
pub struct Import {
  pub specifier: String,
  pub resolved: Resolved,
}

/// A dependency entry in the list the Import Finder produces.
#[derive(Debug, Clone)]
pub struct Dependency {
  pub file: File,
  /// True when this dependency is synthesized rather than read from disk.
  pub is_virtual: bool,
  /// True when this dependency is a side-channel asset (e.g. a
  /// CSS-referenced image) that must be emitted separately.
  pub inlined_asset: bool,
  /// Extensions this dependency has traversed so far, oldest first.
  pub extension_history: Vec<String>,
  /// The specifier this dependency was imported under, when it was reached
  /// through a bare package import. `None` for project files, which are
  /// named from their source-root-relative path instead.
  pub module_name: Option<String>,
}

impl Dependency {
  pub fn new(file: File) -> Self {
    let ext = file.extension().to_string();
    Self {
      file,
      is_virtual: false,
      inlined_asset: false,
      extension_history: vec![ext],
      module_name: None,
    }
  }

  pub fn virtual_dependency(file: File) -> Self {
    let mut dep = Self::new(file);
    dep.is_virtual = true;
    dep
  }

  pub fn current_extension(&self) -> &str {
    self
      .extension_history
      .last()
      .map(String::as_str)
      .unwrap_or("")
  }
}

/// Mutable builder a collector fills in via `add_import`/`add_resource`.
/// Insertion order is preserved; this is the stable emission order
/// downstream consumers (the Finder) rely on.
#[derive(Debug, Default, Clone)]
pub struct ImportCollection {
  imports: Vec<Import>,
  resources: Vec<File>,
}

impl ImportCollection {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_import(&mut self, import: Import) {
    self.imports.push(import);
  }

  pub fn add_resource(&mut self, file: File) {
    self.resources.push(file);
  }

  pub fn imports(&self) -> &[Import] {
    &self.imports
  }

  pub fn resources(&self) -> &[File] {
    &self.resources
  }

  pub fn is_empty(&self) -> bool {
    self.imports.is_empty() && self.resources.is_empty()
  }
}

/// Top-level bundler configuration.
#[derive(Debug, Clone)]
pub struct BundlerConfig {
  pub project_root: PathBuf,
  pub web_root: PathBuf,
  pub output_folder: PathBuf,
  pub source_root: PathBuf,
  pub entry_points: Vec<PathBuf>,
  pub asset_files: Vec<PathBuf>,
  pub include_paths: Vec<PathBuf>,
  pub cache_dir: PathBuf,
  pub is_dev: bool,
  /// Directory name (relative to `project_root`) that marks a dependency as
  /// vendor rather than first-party. Conventionally `node_modules`.
  pub external_packages_dir: String,
  /// Extensions probed by the resolver, in tie-breaking order.
  pub resolve_extensions: Vec<String>,
}

impl BundlerConfig {
  pub fn output_dir(&self) -> PathBuf {
    self.web_root.join(&self.output_folder)
  }
}

/// The three states a [`ContentState`] cycles through on its way to a
/// terminal, bundle-ready form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Reading,
  Processing,
  Ready,
}

/// A small state machine tracking a file's progress through the content
/// pipeline: its current state, current extension, and the append-only
/// history of extensions it has already passed through.
#[derive(Debug, Clone)]
pub struct ContentState {
  state: PipelineState,
  extension: String,
  history: Vec<String>,
}

impl ContentState {
  pub fn new(extension: impl Into<String>) -> Self {
    Self {
      state: PipelineState::Reading,
      extension: extension.into(),
      history: Vec::new(),
    }
  }

  pub fn state(&self) -> PipelineState {
    self.state
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  pub fn history(&self) -> &[String] {
    &self.history
  }

  pub fn is_ready(&self) -> bool {
    self.state == PipelineState::Ready
  }

  /// Unconditionally sets the new state/extension. Whether this actually
  /// advanced anything is the pipeline driver loop's responsibility to
  /// check — this type itself stays a dumb value object.
  pub fn set(&mut self, state: PipelineState, extension: impl Into<String>) {
    let extension = extension.into();
    if extension != self.extension {
      self.history.push(std::mem::replace(&mut self.extension, extension));
    }
    self.state = state;
  }
}

/// Where a [`ContentItem`]'s bytes currently live.
#[derive(Debug, Clone)]
pub enum ContentSource {
  /// Not yet read; lazily loaded from disk on first use.
  Reader(File),
  /// Already read or produced by a processor.
  Buffered(String),
}

/// A `ContentState` bound to a file, a module name, and its content.
/// Processors transition the state and replace the content simultaneously.
#[derive(Debug, Clone)]
pub struct ContentItem {
  pub file: File,
  pub module_name: String,
  pub state: ContentState,
  pub source: ContentSource,
}

impl ContentItem {
  pub fn new(file: File, module_name: String) -> Self {
    let extension = file.extension().to_string();
    Self {
      source: ContentSource::Reader(file.clone()),
      file,
      module_name,
      state: ContentState::new(extension),
    }
  }

  pub fn content(&self, root: &Path) -> crate::error::Result<String> {
    match &self.source {
      ContentSource::Buffered(s) => Ok(s.clone()),
      ContentSource::Reader(f) => Ok(std::fs::read_to_string(f.to_disk_path(root))?),
    }
  }

  pub fn set_content(&mut self, content: String) {
    self.source = ContentSource::Buffered(content);
  }
}

/// Summary of one driver run, used for the CLI's `--json` output.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BuildSummary {
  pub rebuilt: Vec<String>,
  pub fresh: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_dot_segments() {
    let f = File::new("./src/../src/app.ts");
    assert_eq!(f.path(), "src/app.ts");
  }

  #[test]
  fn preserves_leading_parent_segments() {
    let f = File::new("../lib/util.js");
    assert_eq!(f.path(), "../lib/util.js");
  }

  #[test]
  fn splits_dir_basename_extension() {
    let f = File::new("src/components/button.tsx");
    assert_eq!(f.dir(), "src/components");
    assert_eq!(f.name(), "button.tsx");
    assert_eq!(f.basename(), "button");
    assert_eq!(f.extension(), "tsx");
  }

  #[test]
  fn dotfiles_have_no_extension() {
    let f = File::new("src/.env");
    assert_eq!(f.basename(), ".env");
    assert_eq!(f.extension(), "");
  }

  #[test]
  fn equality_is_by_normalized_path() {
    assert_eq!(File::new("./src/a.js"), File::new("src/a.js"));
  }

  #[test]
  fn join_from_dir_resolves_relative_specifier() {
    let from = File::new("src/pages/index.ts");
    assert_eq!(from.join_from_dir("../lib/util").path(), "src/lib/util");
  }

  #[test]
  fn with_extension_replaces_suffix() {
    let f = File::new("src/app.ts");
    assert_eq!(f.with_extension("js").path(), "src/app.js");
  }
}
