use crate::core::Pipeline;
use crate::domain::model::{SourceTable, ValidationOutcome};
use crate::domain::ports::LoadReport;
use crate::utils::error::Result;

/// 一次合併與驗證的結果摘要
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub outcome: ValidationOutcome,
    pub outputs: LoadReport,
}

impl RunSummary {
    pub fn violation_count(&self) -> usize {
        self.outcome.report().map_or(0, |r| r.len())
    }
}

pub struct MergeEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MergeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn run(&self) -> Result<RunSummary> {
        tracing::info!("📥 Reading source files...");
        let sources = self.pipeline.extract()?;
        tracing::info!("Read {} source files", sources.len());
        self.process(sources)
    }

    /// Runs everything after extraction, for callers that already hold the sources.
    pub fn process(&self, sources: Vec<SourceTable>) -> Result<RunSummary> {
        tracing::info!("🔄 Merging {} files...", sources.len());
        let merged = self.pipeline.transform(sources)?;
        tracing::info!(
            "Merged {} rows x {} fields",
            merged.len(),
            merged.fields.len()
        );

        tracing::info!("🔍 Running data quality checks...");
        let outcome = self.pipeline.validate(&merged);
        match &outcome {
            ValidationOutcome::Valid(_) => tracing::info!("✅ Data validation passed"),
            ValidationOutcome::Invalid(report) => {
                tracing::warn!("❌ Data validation failed with {} violations", report.len())
            }
        }

        tracing::info!("💾 Writing outputs...");
        let outputs = self.pipeline.load(&merged, &outcome)?;
        tracing::info!("📁 Merged table saved to: {}", outputs.merged_path);

        Ok(RunSummary {
            rows: merged.len(),
            outcome,
            outputs,
        })
    }
}
