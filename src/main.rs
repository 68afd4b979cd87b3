use clap::Parser;
use sheet_merger::adapters::{sheet_reader, sheet_writer};
use sheet_merger::config::cli::LogFormat;
use sheet_merger::core::pipeline::{read_sources, ERRORS_FILE_NAME, VALIDATED_FILE_NAME};
use sheet_merger::core::projector;
use sheet_merger::domain::model::{SourceTable, ValidationOutcome, ViolationReport};
use sheet_merger::domain::ports::{ConfigProvider, Storage};
use sheet_merger::utils::error::{ErrorSeverity, MergeError};
use sheet_merger::utils::{logger, validation::Validate};
use sheet_merger::{CliConfig, LocalStorage, MergeConfig, MergeEngine, MergePipeline, Schema};
use std::path::Path;

const VALIDATION_FAILED_EXIT_CODE: i32 = 2;

fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting sheet-merger");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證命令列參數
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &CliConfig) -> Result<i32, MergeError> {
    let storage = LocalStorage::default();

    if let Some(merged_path) = &cli.validate_only {
        return validate_only(&storage, merged_path, &cli.output_dir);
    }

    if cli.files.is_empty() {
        return Err(MergeError::MissingConfigError {
            field: "files".to_string(),
        });
    }

    let mut config = cli.resolve_merge_config()?;
    let sources = read_sources(&storage, &cli.files)?;
    tracing::info!("Read {} source files", sources.len());

    if cli.list_fields {
        print_fields(&sources, &config)?;
        return Ok(0);
    }

    if config.requested_field_names.is_empty() {
        let fields = projector::candidate_fields(
            &sources,
            config.field_name_column_index,
            config.field_value_column_index,
        )?;
        tracing::info!("No fields configured, selecting all {} found", fields.len());
        config.set_requested_fields(fields);
    }

    if let Some(path) = &cli.save_config {
        config.save(path)?;
    }

    let pipeline = MergePipeline::new(storage, config, cli.files.clone(), cli.output_dir.clone());

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        display_dry_run(pipeline.config(), sources, &cli.output_dir);
        return Ok(0);
    }

    let engine = MergeEngine::new(pipeline);
    let summary = engine.process(sources)?;

    println!("✅ Merged {} files", summary.rows);
    println!("📁 Merged table saved to: {}", summary.outputs.merged_path);

    match &summary.outcome {
        ValidationOutcome::Valid(_) => {
            println!("✅ Data validation passed!");
            if let Some(path) = &summary.outputs.validated_path {
                println!("📁 Validated table saved to: {}", path);
            }
            Ok(0)
        }
        ValidationOutcome::Invalid(report) => {
            print_violations(report);
            if let Some(path) = &summary.outputs.errors_path {
                println!("📁 Validation errors saved to: {}", path);
            }
            Ok(VALIDATION_FAILED_EXIT_CODE)
        }
    }
}

/// Validates a merged CSV that may have been edited by hand.
fn validate_only(storage: &LocalStorage, merged_path: &str, output_dir: &str) -> Result<i32, MergeError> {
    let data = storage.read_file(merged_path)?;
    let table = sheet_reader::parse_merged_table(merged_path, &data)?;
    tracing::info!("🔍 Validating {} rows from {}", table.len(), merged_path);

    match Schema::birth_records().validate(&table) {
        ValidationOutcome::Valid(validated) => {
            let path = Path::new(output_dir).join(VALIDATED_FILE_NAME);
            storage.write_file(&path.to_string_lossy(), &sheet_writer::validated_to_csv(&validated)?)?;
            println!("✅ Data validation passed!");
            println!("📁 Validated table saved to: {}", path.display());
            Ok(0)
        }
        ValidationOutcome::Invalid(report) => {
            let path = Path::new(output_dir).join(ERRORS_FILE_NAME);
            storage.write_file(&path.to_string_lossy(), &sheet_writer::violations_to_csv(&report)?)?;
            print_violations(&report);
            println!("📁 Validation errors saved to: {}", path.display());
            Ok(VALIDATION_FAILED_EXIT_CODE)
        }
    }
}

fn print_fields(sources: &[SourceTable], config: &MergeConfig) -> Result<(), MergeError> {
    if let Some(first) = sources.first() {
        println!("📋 Columns in {}:", first.name);
        for example in projector::column_examples(first) {
            println!("  {}", example);
        }
        println!();
    }

    let fields = projector::candidate_fields(
        sources,
        config.field_name_column_index,
        config.field_value_column_index,
    )?;
    println!("🔖 Field names in column {}:", config.field_name_column_index);
    for field in fields {
        let marker = if config.requested_field_names.contains(&field) {
            "✅"
        } else {
            "  "
        };
        println!("  {} {}", marker, field);
    }
    Ok(())
}

fn print_violations(report: &ViolationReport) {
    println!("❌ Data validation failed with {} violations:", report.len());
    for violation in report.violations() {
        let row = violation
            .row
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!(
            "  row {}: {} failed {} (value: {})",
            row,
            violation.column,
            violation.check,
            violation.failure_case.as_deref().unwrap_or("-")
        );
    }
}

fn display_dry_run<C: ConfigProvider>(config: &C, mut sources: Vec<SourceTable>, output_dir: &str) {
    projector::order_sources(&mut sources, config.row_order());

    println!("📋 Configuration Summary:");
    println!("  Field name column: {}", config.field_name_column());
    println!("  Field value column: {}", config.field_value_column());
    println!("  Row order: {:?}", config.row_order());
    println!("  Fields: {}", config.requested_fields().join(", "));
    println!("  Output: {}", output_dir);
    println!();

    println!("📄 Rows in output order:");
    for source in &sources {
        println!("  {} ({} columns)", source.name, source.width());
    }
    println!();

    let schema = Schema::birth_records();
    println!("🔍 Data quality rules:");
    for rule in schema.rules() {
        if let Some(description) = schema.describe(&rule.column) {
            println!("  {}: {}", rule.column, description);
        }
    }
}

fn report_failure(e: &MergeError) -> i32 {
    tracing::error!(
        "❌ Merge failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium | ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
