#![deny(clippy::all)]

pub mod cli;
pub mod collectors;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod finder;
pub mod freshness;
pub mod partition;
pub mod pipeline;
pub mod profiler;
pub mod resolver;
pub mod types;

pub use error::{BundlerError, Result};
pub use profiler::Profiler;
