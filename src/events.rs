//! Pluggable, advisory notification hook for the content pipeline.
//! The pipeline's own correctness never depends on a sink's behavior.

use crate::types::ContentItem;
use tracing::debug;

pub enum PipelineEvent<'a> {
  PreProcess { item: &'a ContentItem },
  PostProcess { item: &'a ContentItem },
  Ready { item: &'a ContentItem },
}

pub trait EventSink {
  fn handle(&self, event: PipelineEvent<'_>);
}

/// Does nothing; the default when no sink is configured.
pub struct NullEventSink;

impl EventSink for NullEventSink {
  fn handle(&self, _event: PipelineEvent<'_>) {}
}

/// Logs each event at debug level, in the shape every other component in
/// this crate reports its progress.
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
  fn handle(&self, event: PipelineEvent<'_>) {
    match event {
      PipelineEvent::PreProcess { item } => {
        debug!("pre-process {} (.{})", item.file, item.state.extension());
      }
      PipelineEvent::PostProcess { item } => {
        debug!("post-process {} -> .{}", item.file, item.state.extension());
      }
      PipelineEvent::Ready { item } => {
        debug!("ready: {}", item.module_name);
      }
    }
  }
}
