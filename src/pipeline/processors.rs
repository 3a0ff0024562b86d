use super::Processor;
use crate::error::Result;
use crate::types::{ContentItem, ContentState, PipelineState};
use std::path::Path;

/// Passes content through untouched, moving any non-ready state straight to
/// `READY` at its current extension. Handles everything that doesn't need a
/// real transform: `.js`, `.json`, `.css`, images, and so on.
pub struct IdentityProcessor;

impl Processor for IdentityProcessor {
  fn supports(&self, state: &ContentState) -> bool {
    !state.is_ready()
  }

  fn transpile(&self, root: &Path, item: &mut ContentItem) -> Result<()> {
    let content = item.content(root)?;
    item.set_content(content);
    let ext = item.state.extension().to_string();
    item.state.set(PipelineState::Ready, ext);
    Ok(())
  }

  fn peek(&self, state: &mut ContentState) -> Result<()> {
    let ext = state.extension().to_string();
    state.set(PipelineState::Ready, ext);
    Ok(())
  }
}

/// A deliberately trivial `.ts -> .js` step: strips a handful of
/// type-annotation shapes via regex rather than parsing. Good enough to
/// exercise the pipeline end to end without shipping a real TypeScript
/// compiler; a real processor would replace this one.
pub struct TsStripProcessor {
  type_annotation: regex::Regex,
  interface_block: regex::Regex,
  import_type_only: regex::Regex,
}

impl TsStripProcessor {
  pub fn new() -> Self {
    Self {
      type_annotation: regex::Regex::new(r":\s*[A-Za-z_][A-Za-z0-9_<>\[\]., |&]*(?=[,)=;\n])").unwrap(),
      interface_block: regex::Regex::new(r"(?s)\binterface\s+\w+\s*\{.*?\}\s*").unwrap(),
      import_type_only: regex::Regex::new(r"import\s+type\s+.*?;\n?").unwrap(),
    }
  }

  fn strip(&self, source: &str) -> String {
    let without_interfaces = self.interface_block.replace_all(source, "");
    let without_type_imports = self.import_type_only.replace_all(&without_interfaces, "");
    self.type_annotation.replace_all(&without_type_imports, "").into_owned()
  }
}

impl Default for TsStripProcessor {
  fn default() -> Self {
    Self::new()
  }
}

impl Processor for TsStripProcessor {
  fn supports(&self, state: &ContentState) -> bool {
    !state.is_ready() && state.extension() == "ts"
  }

  fn transpile(&self, root: &Path, item: &mut ContentItem) -> Result<()> {
    let content = item.content(root)?;
    let stripped = self.strip(&content);
    item.set_content(stripped);
    item.state.set(PipelineState::Ready, "js");
    Ok(())
  }

  fn peek(&self, state: &mut ContentState) -> Result<()> {
    state.set(PipelineState::Ready, "js");
    Ok(())
  }
}
