use crate::domain::model::{MergedRow, MergedTable, SourceTable, FILENAME_COLUMN};
use crate::utils::error::{MergeError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Csv,
    Tsv,
    Workbook,
}

impl SheetKind {
    pub fn from_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Some(SheetKind::Csv),
            "tsv" => Some(SheetKind::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetKind::Workbook),
            _ => None,
        }
    }
}

/// 將檔案內容解析成 [`SourceTable`]，不假設有標題列
pub fn parse_table(file_name: &str, data: &[u8]) -> Result<SourceTable> {
    let kind = SheetKind::from_name(file_name).ok_or_else(|| MergeError::UnsupportedFileError {
        file: file_name.to_string(),
    })?;

    let table = match kind {
        SheetKind::Csv => parse_delimited(file_name, data, b',')?,
        SheetKind::Tsv => parse_delimited(file_name, data, b'\t')?,
        SheetKind::Workbook => parse_workbook(file_name, data)?,
    };

    tracing::debug!(
        "Parsed {} ({} rows x {} columns)",
        file_name,
        table.height(),
        table.width()
    );
    Ok(table)
}

fn text_cell(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_delimited(file_name: &str, data: &[u8], delimiter: u8) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(SourceTable::new(file_name, rows))
}

fn parse_workbook(file_name: &str, data: &[u8]) -> Result<SourceTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::SourceReadError {
            file: file_name.to_string(),
            reason: "workbook has no worksheets".to_string(),
        })??;

    Ok(SourceTable::new(file_name, range_rows(&range)))
}

/// Positions are relative to cell A1, so a range that starts further in is padded.
fn range_rows(range: &Range<Data>) -> Vec<Vec<Option<String>>> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells = vec![None; start_col as usize];
        cells.extend(row.iter().map(data_cell));
        rows.push(cells);
    }

    rows
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 儲存格轉文字：日期以固定格式輸出，布林值寫成 `True` / `False`
fn data_cell(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::String(s) => text_cell(s),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => {
            let text = if dt.is_duration() {
                dt.as_duration().map(format_duration)
            } else {
                dt.as_datetime()
                    .map(|d| d.format(DATETIME_FORMAT).to_string())
            };
            Some(text.unwrap_or_else(|| dt.to_string()))
        }
        Data::DateTimeIso(iso) => Some(format_iso_datetime(iso)),
        Data::DurationIso(iso) => text_cell(iso),
        other => Some(other.to_string()),
    }
}

fn format_duration(duration: chrono::Duration) -> String {
    let seconds = duration.num_seconds();
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// ODS stores dates as ISO text; anything that does not parse is kept verbatim.
fn format_iso_datetime(iso: &str) -> String {
    if let Ok(datetime) = iso.parse::<NaiveDateTime>() {
        return datetime.format(DATETIME_FORMAT).to_string();
    }
    match iso.parse::<NaiveDate>() {
        Ok(date) => date
            .and_time(NaiveTime::MIN)
            .format(DATETIME_FORMAT)
            .to_string(),
        Err(_) => iso.to_string(),
    }
}

/// Reads a merged table back from CSV, e.g. after it was edited by hand.
/// The first header must be `Filename`; empty cells become absent values.
pub fn parse_merged_table(file_name: &str, data: &[u8]) -> Result<MergedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    match headers.get(0) {
        Some(first) if first.trim_start_matches('\u{feff}') == FILENAME_COLUMN => {}
        _ => {
            return Err(MergeError::SourceReadError {
                file: file_name.to_string(),
                reason: format!("first column must be \"{}\"", FILENAME_COLUMN),
            })
        }
    }

    let fields: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    let mut table = MergedTable::new(fields);

    for record in reader.records() {
        let record = record?;
        let filename = record.get(0).unwrap_or_default().to_string();
        let values = (1..=table.fields.len())
            .map(|i| record.get(i).and_then(text_cell))
            .collect();
        table.rows.push(MergedRow { filename, values });
    }

    Ok(table)
}
