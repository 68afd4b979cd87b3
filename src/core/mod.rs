pub mod duplicates;
pub mod engine;
pub mod pipeline;
pub mod projector;
pub mod validator;

pub use crate::domain::model::{MergedTable, SourceTable, ValidationOutcome};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
