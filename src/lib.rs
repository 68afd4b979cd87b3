pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::{MergeConfig, RowOrder};
pub use crate::core::{engine::MergeEngine, pipeline::MergePipeline, validator::Schema};
pub use utils::error::{MergeError, Result};
