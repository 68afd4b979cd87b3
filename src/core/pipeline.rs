use crate::adapters::{sheet_reader, sheet_writer};
use crate::core::projector;
use crate::core::validator::Schema;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{MergedTable, SourceTable, ValidationOutcome};
use crate::domain::ports::LoadReport;
use crate::utils::error::{MergeError, Result};
use std::path::Path;

pub const VALIDATED_FILE_NAME: &str = "validated_merged_data.csv";
pub const ERRORS_FILE_NAME: &str = "validation_errors.csv";

/// `reports_<timestamp>.csv`, stamped with local time.
pub fn merged_file_name() -> String {
    chrono::Local::now()
        .format("reports_%Y%m%d%H%M%S.csv")
        .to_string()
}

/// Display name of an input: its final path component.
pub fn source_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// 讀取並解析單一來源檔案；任何失敗都以該檔名回報
pub fn read_source<S: Storage + ?Sized>(storage: &S, path: &str) -> Result<SourceTable> {
    let name = source_name(path);
    let data = storage
        .read_file(path)
        .map_err(|e| MergeError::SourceReadError {
            file: name.clone(),
            reason: e.to_string(),
        })?;

    sheet_reader::parse_table(&name, &data).map_err(|e| match e {
        MergeError::UnsupportedFileError { .. } => e,
        other => MergeError::SourceReadError {
            file: name.clone(),
            reason: other.to_string(),
        },
    })
}

/// Reads every input in the given order, stopping at the first failure.
pub fn read_sources<S: Storage + ?Sized>(storage: &S, inputs: &[String]) -> Result<Vec<SourceTable>> {
    let mut sources = Vec::with_capacity(inputs.len());
    for path in inputs {
        tracing::debug!("Reading {}", path);
        sources.push(read_source(storage, path)?);
    }
    Ok(sources)
}

pub struct MergePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    inputs: Vec<String>,
    output_dir: String,
    schema: Schema,
    merged_file_name: String,
}

impl<S: Storage, C: ConfigProvider> MergePipeline<S, C> {
    pub fn new(storage: S, config: C, inputs: Vec<String>, output_dir: String) -> Self {
        Self {
            storage,
            config,
            inputs,
            output_dir,
            schema: Schema::birth_records(),
            merged_file_name: merged_file_name(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Overrides the timestamped merged output name.
    pub fn with_merged_file_name(mut self, name: impl Into<String>) -> Self {
        self.merged_file_name = name.into();
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn output_path(&self, file_name: &str) -> String {
        Path::new(&self.output_dir)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for MergePipeline<S, C> {
    fn extract(&self) -> Result<Vec<SourceTable>> {
        read_sources(&self.storage, &self.inputs)
    }

    fn transform(&self, sources: Vec<SourceTable>) -> Result<MergedTable> {
        projector::project(sources, &self.config)
    }

    fn validate(&self, table: &MergedTable) -> ValidationOutcome {
        self.schema.validate(table)
    }

    fn load(&self, table: &MergedTable, outcome: &ValidationOutcome) -> Result<LoadReport> {
        let mut report = LoadReport {
            merged_path: self.output_path(&self.merged_file_name),
            ..LoadReport::default()
        };
        self.storage
            .write_file(&report.merged_path, &sheet_writer::merged_to_csv(table)?)?;

        match outcome {
            ValidationOutcome::Valid(validated) => {
                let path = self.output_path(VALIDATED_FILE_NAME);
                self.storage
                    .write_file(&path, &sheet_writer::validated_to_csv(validated)?)?;
                report.validated_path = Some(path);
            }
            ValidationOutcome::Invalid(violations) => {
                let path = self.output_path(ERRORS_FILE_NAME);
                self.storage
                    .write_file(&path, &sheet_writer::violations_to_csv(violations)?)?;
                report.errors_path = Some(path);
            }
        }

        tracing::debug!("Outputs written: {:?}", report);
        Ok(report)
    }
}
