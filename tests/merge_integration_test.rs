use anyhow::Result;
use sheet_merger::core::pipeline::{ERRORS_FILE_NAME, VALIDATED_FILE_NAME};
use sheet_merger::domain::model::ValidationOutcome;
use sheet_merger::{LocalStorage, MergeConfig, MergeEngine, MergeError, MergePipeline, RowOrder};
use std::path::Path;
use tempfile::TempDir;

fn write_source(dir: &Path, name: &str, rows: &[(&str, &str)]) -> Result<String> {
    let mut content = String::new();
    for (field, value) in rows {
        content.push_str(&format!("{},note,{}\n", field, value));
    }
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path.display().to_string())
}

fn birth_fields() -> Vec<&'static str> {
    vec!["BIRTH_YEAR", "BIRTH_MNTH", "BIRTH_DAY", "BIRTH_WGHT", "SEX"]
}

/// 三個檔案、欄位順序不同、一個檔案缺欄位
#[test]
fn test_end_to_end_merge_and_validate() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_dir = temp_dir.path().join("in");
    std::fs::create_dir_all(&input_dir)?;
    let output_dir = temp_dir.path().join("out").display().to_string();

    let files = vec![
        write_source(
            &input_dir,
            "2019 report B.csv",
            &[("SEX", "2"), ("BIRTH_YEAR", "1999"), ("BIRTH_MNTH", "4"), ("BIRTH_DAY", "30"), ("BIRTH_WGHT", "2900")],
        )?,
        write_source(
            &input_dir,
            "2020 report A.csv",
            &[("BIRTH_YEAR", "2001"), ("BIRTH_MNTH", "12"), ("BIRTH_DAY", "1"), ("BIRTH_WGHT", "3500.5"), ("SEX", "1")],
        )?,
        write_source(
            &input_dir,
            "2018 report C.csv",
            &[("BIRTH_YEAR", "2005"), ("SEX", "1")],
        )?,
    ];

    let config = MergeConfig::new(0, 2, birth_fields(), RowOrder::ByFilenameLastToken);
    let pipeline = MergePipeline::new(LocalStorage::default(), config, files, output_dir.clone())
        .with_merged_file_name("merged.csv");
    let engine = MergeEngine::new(pipeline);

    let summary = engine.run()?;
    assert_eq!(summary.rows, 3);
    assert!(summary.outcome.is_valid(), "unexpected violations: {:?}", summary.outcome);

    let merged = std::fs::read_to_string(Path::new(&output_dir).join("merged.csv"))?;
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(lines[0], "Filename,BIRTH_YEAR,BIRTH_MNTH,BIRTH_DAY,BIRTH_WGHT,SEX");
    assert_eq!(lines[1], "2020 report A.csv,2001,12,1,3500.5,1");
    assert_eq!(lines[2], "2019 report B.csv,1999,4,30,2900,2");
    assert_eq!(lines[3], "2018 report C.csv,2005,,,,1");

    let validated_path = summary.outputs.validated_path.expect("validated output");
    assert!(validated_path.ends_with(VALIDATED_FILE_NAME));
    let validated = std::fs::read_to_string(&validated_path)?;
    assert!(validated.contains("2019 report B.csv,1999,4,30,2900,2"));
    assert!(summary.outputs.errors_path.is_none());

    Ok(())
}

#[test]
fn test_invalid_values_produce_error_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().join("out").display().to_string();

    let files = vec![write_source(
        temp_dir.path(),
        "bad.csv",
        &[("BIRTH_YEAR", "1800"), ("BIRTH_MNTH", "13"), ("BIRTH_DAY", "2"), ("BIRTH_WGHT", "3000"), ("SEX", "3")],
    )?];

    let config = MergeConfig::new(0, 2, birth_fields(), RowOrder::ByFilename);
    let engine = MergeEngine::new(MergePipeline::new(
        LocalStorage::default(),
        config,
        files,
        output_dir.clone(),
    ));

    let summary = engine.run()?;
    let report = match &summary.outcome {
        ValidationOutcome::Invalid(report) => report,
        ValidationOutcome::Valid(_) => panic!("expected validation to fail"),
    };
    assert_eq!(report.len(), 3);
    assert_eq!(summary.violation_count(), 3);
    assert!(summary.outputs.validated_path.is_none());

    let errors = std::fs::read_to_string(Path::new(&output_dir).join(ERRORS_FILE_NAME))?;
    assert_eq!(errors.lines().count(), 4);
    assert!(errors.contains("0,SEX,\"isin([1, 2])\",3"));

    Ok(())
}

#[test]
fn test_narrow_file_aborts_whole_merge() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().join("out");

    let good = write_source(temp_dir.path(), "a.csv", &[("SEX", "1")])?;
    let narrow = temp_dir.path().join("b.csv");
    std::fs::write(&narrow, "SEX,1\n")?;

    let config = MergeConfig::new(0, 2, ["SEX"], RowOrder::ByFilename);
    let engine = MergeEngine::new(MergePipeline::new(
        LocalStorage::default(),
        config,
        vec![good, narrow.display().to_string()],
        output_dir.display().to_string(),
    ));

    match engine.run() {
        Err(MergeError::InsufficientColumnsError { file, .. }) => assert_eq!(file, "b.csv"),
        other => panic!("expected InsufficientColumnsError, got {:?}", other.map(|s| s.rows)),
    }
    assert!(!output_dir.exists(), "no output should be written");

    Ok(())
}

#[test]
fn test_unreadable_source_is_reported_by_name() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let broken = temp_dir.path().join("broken.xlsx");
    std::fs::write(&broken, b"not a workbook")?;

    let config = MergeConfig::new(0, 1, ["SEX"], RowOrder::ByFilename);
    let engine = MergeEngine::new(MergePipeline::new(
        LocalStorage::default(),
        config,
        vec![broken.display().to_string()],
        temp_dir.path().join("out").display().to_string(),
    ));

    match engine.run() {
        Err(MergeError::SourceReadError { file, .. }) => assert_eq!(file, "broken.xlsx"),
        other => panic!("expected SourceReadError, got {:?}", other.map(|s| s.rows)),
    }

    Ok(())
}
