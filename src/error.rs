use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundlerError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Regex error: {0}")]
  Regex(#[from] regex::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("could not resolve '{specifier}' from {}", from.display())]
  NotFound { specifier: String, from: PathBuf },

  #[error("pipeline made no progress on module '{module}'")]
  StateStuck { module: String },

  #[error("parse error in {module}: {message}")]
  Parse { module: String, message: String },

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("{0}")]
  Other(String),
}

pub type Result<T> = std::result::Result<T, BundlerError>;
