use crate::domain::model::SourceTable;
use crate::utils::error::{MergeError, Result};
use std::collections::HashMap;

/// 單一檔案某欄位的重複值檢查結果
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    /// Non-empty values inspected.
    pub total_values: usize,
    /// Each repeated value once, in order of first appearance.
    pub duplicates: Vec<String>,
}

impl DuplicateReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Finds values that appear more than once in `column`. Empty cells are ignored
/// and, with `has_header`, so is the first row. A repeated name in the field
/// name column means later rows overwrite earlier ones during a merge.
pub fn find_duplicates(table: &SourceTable, column: usize, has_header: bool) -> Result<DuplicateReport> {
    if table.width() <= column {
        return Err(MergeError::InsufficientColumnsError {
            file: table.name.clone(),
            columns: table.width(),
            required_index: column,
        });
    }

    let skip = usize::from(has_header);
    let values: Vec<&str> = table.column(column).skip(skip).flatten().collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in &values {
        *counts.entry(*value).or_default() += 1;
    }

    let mut duplicates = Vec::new();
    for value in &values {
        if let Some(count) = counts.get_mut(value) {
            if *count > 1 {
                duplicates.push(value.to_string());
                // 只回報一次
                *count = 0;
            }
        }
    }

    Ok(DuplicateReport {
        total_values: values.len(),
        duplicates,
    })
}
