use crate::domain::model::{MergedTable, ValidatedTable, ViolationReport};
use crate::utils::error::{MergeError, Result};
use csv::Writer;

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| MergeError::IoError(e.into_error()))
}

/// 合併結果：標題列為 `Filename` 加上欄位名稱，缺少的欄位輸出為空白
pub fn merged_to_csv(table: &MergedTable) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(table.header())?;

    for row in &table.rows {
        let record = std::iter::once(row.filename.as_str())
            .chain(row.values.iter().map(|v| v.as_deref().unwrap_or("")));
        writer.write_record(record)?;
    }

    finish(writer)
}

pub fn validated_to_csv(table: &ValidatedTable) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;

    for row in &table.rows {
        writer.write_record(row.iter().map(|value| value.to_cell()))?;
    }

    finish(writer)
}

pub fn violations_to_csv(report: &ViolationReport) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for violation in report.violations() {
        writer.serialize(violation)?;
    }
    finish(writer)
}
