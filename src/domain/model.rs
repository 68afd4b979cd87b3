use serde::Serialize;
use std::collections::HashMap;

/// 單一來源檔案讀進來的表格，欄位只用位置存取
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub name: String,
    rows: Vec<Vec<Option<String>>>,
    width: usize,
}

impl SourceTable {
    /// Builds a table from raw rows, padding short rows with empty cells.
    pub fn new(name: impl Into<String>, mut rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, None);
        }
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(column).and_then(|c| c.as_deref()))
    }
}

/// 欄位名稱 → 欄位值。同名欄位後出現者覆蓋先出現者。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: HashMap<String, String>,
}

impl FieldMap {
    pub fn insert(&mut self, name: String, value: String) {
        self.entries.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub filename: String,
    /// `None` means the field is absent from the file, `Some("")` means present but empty.
    pub values: Vec<Option<String>>,
}

pub const FILENAME_COLUMN: &str = "Filename";

#[derive(Debug, Clone, PartialEq)]
pub struct MergedTable {
    pub fields: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Vec<String> {
        std::iter::once(FILENAME_COLUMN.to_string())
            .chain(self.fields.iter().cloned())
            .collect()
    }

    /// Index into the header, so `0` is always the filename column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        if column == FILENAME_COLUMN {
            return Some(0);
        }
        self.fields.iter().position(|f| f == column).map(|i| i + 1)
    }

    pub fn value(&self, row: usize, column_index: usize) -> Option<&str> {
        let row = self.rows.get(row)?;
        if column_index == 0 {
            Some(row.filename.as_str())
        } else {
            row.values.get(column_index - 1).and_then(|v| v.as_deref())
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Text(String),
    Int(i32),
    Float(f64),
}

impl TypedValue {
    pub fn to_cell(&self) -> String {
        match self {
            TypedValue::Null => String::new(),
            TypedValue::Text(s) => s.clone(),
            TypedValue::Int(i) => i.to_string(),
            TypedValue::Float(f) => f.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<TypedValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// `None` for table-level failures such as a missing column.
    pub row: Option<usize>,
    pub column: String,
    pub check: String,
    pub failure_case: Option<String>,
}

/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    pub fn new(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(ValidatedTable),
    Invalid(ViolationReport),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn table(&self) -> Option<&ValidatedTable> {
        match self {
            ValidationOutcome::Valid(table) => Some(table),
            ValidationOutcome::Invalid(_) => None,
        }
    }

    pub fn report(&self) -> Option<&ViolationReport> {
        match self {
            ValidationOutcome::Valid(_) => None,
            ValidationOutcome::Invalid(report) => Some(report),
        }
    }
}
