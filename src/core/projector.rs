use crate::config::{dedup_fields, RowOrder};
use crate::domain::model::{FieldMap, MergedRow, MergedTable, SourceTable};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MergeError, Result};

/// Sort key for [`RowOrder::ByFilenameLastToken`]; a name without whitespace is its own token.
fn last_token(name: &str) -> &str {
    name.split_whitespace().last().unwrap_or("")
}

/// 依排序策略排列來源檔案（穩定排序）
pub fn order_sources(sources: &mut [SourceTable], order: RowOrder) {
    match order {
        RowOrder::ByFilename => sources.sort_by(|a, b| a.name.cmp(&b.name)),
        RowOrder::ByFilenameLastToken => {
            sources.sort_by(|a, b| last_token(&a.name).cmp(last_token(&b.name)))
        }
    }
}

fn ensure_columns(table: &SourceTable, name_col: usize, value_col: usize) -> Result<()> {
    let required_index = name_col.max(value_col);
    if table.width() <= required_index {
        return Err(MergeError::InsufficientColumnsError {
            file: table.name.clone(),
            columns: table.width(),
            required_index,
        });
    }
    Ok(())
}

/// Zips the name column with the value column. Empty cells become `""` on both
/// sides; when a name repeats, the later row wins.
pub fn field_map(table: &SourceTable, name_col: usize, value_col: usize) -> FieldMap {
    let mut map = FieldMap::default();
    for row in table.rows() {
        let name = row.get(name_col).and_then(|c| c.clone()).unwrap_or_default();
        let value = row.get(value_col).and_then(|c| c.clone()).unwrap_or_default();
        map.insert(name, value);
    }
    map
}

/// 將每個來源檔案投影成一列，欄位順序依設定。
/// 任一檔案欄數不足時整批失敗，不產生部分結果。
pub fn project<C: ConfigProvider + ?Sized>(
    mut sources: Vec<SourceTable>,
    config: &C,
) -> Result<MergedTable> {
    let fields = config.requested_fields();
    if fields.is_empty() {
        return Err(MergeError::NoFieldsSelectedError);
    }

    let name_col = config.field_name_column();
    let value_col = config.field_value_column();

    order_sources(&mut sources, config.row_order());

    let mut table = MergedTable::new(fields.to_vec());
    for source in &sources {
        ensure_columns(source, name_col, value_col)?;

        let map = field_map(source, name_col, value_col);
        let values = fields
            .iter()
            .map(|field| map.get(field).map(str::to_string))
            .collect();

        tracing::debug!(
            "📄 {}: {} distinct field names",
            source.name,
            map.len()
        );
        table.rows.push(MergedRow {
            filename: source.name.clone(),
            values,
        });
    }

    Ok(table)
}

/// Every non-empty field name across all sources, first occurrence first.
/// Fails like [`project`] when a source lacks the requested columns.
pub fn candidate_fields(
    sources: &[SourceTable],
    name_col: usize,
    value_col: usize,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for source in sources {
        ensure_columns(source, name_col, value_col)?;
        names.extend(source.column(name_col).flatten().map(str::to_string));
    }
    Ok(dedup_fields(names))
}

/// `Index i: <first row value>` for each column, to help pick the two columns.
pub fn column_examples(table: &SourceTable) -> Vec<String> {
    (0..table.width())
        .map(|i| format!("Index {}: {}", i, table.cell(0, i).unwrap_or("")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;

    fn source(name: &str, pairs: &[(&str, &str)]) -> SourceTable {
        let rows = pairs
            .iter()
            .map(|(k, v)| {
                vec![
                    (!k.is_empty()).then(|| k.to_string()),
                    (!v.is_empty()).then(|| v.to_string()),
                ]
            })
            .collect();
        SourceTable::new(name, rows)
    }

    fn names(sources: &[SourceTable]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_order_by_filename() {
        let mut sources = vec![
            source("b.xlsx", &[]),
            source("a.xlsx", &[]),
            source("c.xlsx", &[]),
        ];
        order_sources(&mut sources, RowOrder::ByFilename);
        assert_eq!(names(&sources), vec!["a.xlsx", "b.xlsx", "c.xlsx"]);
    }

    #[test]
    fn test_order_by_last_token() {
        let mut sources = vec![
            source("2019 report B.xlsx", &[]),
            source("2020 report A.xlsx", &[]),
        ];
        order_sources(&mut sources, RowOrder::ByFilenameLastToken);
        assert_eq!(
            names(&sources),
            vec!["2020 report A.xlsx", "2019 report B.xlsx"]
        );

        order_sources(&mut sources, RowOrder::ByFilename);
        assert_eq!(
            names(&sources),
            vec!["2019 report B.xlsx", "2020 report A.xlsx"]
        );
    }

    #[test]
    fn test_last_token_without_whitespace() {
        assert_eq!(last_token("single.xlsx"), "single.xlsx");
        assert_eq!(last_token(""), "");
    }

    #[test]
    fn test_field_map_last_write_wins() {
        let table = source("a.xlsx", &[("SEX", "1"), ("BIRTH_DAY", ""), ("SEX", "2")]);
        let map = field_map(&table, 0, 1);
        assert_eq!(map.get("SEX"), Some("2"));
        assert_eq!(map.get("BIRTH_DAY"), Some(""));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_project_one_row_per_file_in_order() {
        let sources = vec![
            source("b.xlsx", &[("BIRTH_YEAR", "1991"), ("SEX", "2")]),
            source("a.xlsx", &[("SEX", "1"), ("BIRTH_YEAR", "1990")]),
        ];
        let config = MergeConfig::new(0, 1, ["SEX", "BIRTH_YEAR"], RowOrder::ByFilename);

        let table = project(sources, &config).unwrap();
        assert_eq!(table.header(), vec!["Filename", "SEX", "BIRTH_YEAR"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].filename, "a.xlsx");
        assert_eq!(
            table.rows[0].values,
            vec![Some("1".to_string()), Some("1990".to_string())]
        );
        assert_eq!(table.rows[1].filename, "b.xlsx");
    }

    #[test]
    fn test_absent_field_is_none_not_empty() {
        let sources = vec![source("a.xlsx", &[("SEX", ""), ("BIRTH_DAY", "4")])];
        let config = MergeConfig::new(0, 1, ["SEX", "BIRTH_WGHT"], RowOrder::ByFilename);

        let table = project(sources, &config).unwrap();
        assert_eq!(table.rows[0].values, vec![Some(String::new()), None]);
    }

    #[test]
    fn test_insufficient_columns_aborts_whole_merge() {
        let sources = vec![
            source("a.xlsx", &[("SEX", "1")]),
            SourceTable::new("narrow.xlsx", vec![vec![Some("SEX".to_string())]]),
        ];
        let config = MergeConfig::new(0, 1, ["SEX"], RowOrder::ByFilename);

        match project(sources, &config) {
            Err(MergeError::InsufficientColumnsError {
                file,
                columns,
                required_index,
            }) => {
                assert_eq!(file, "narrow.xlsx");
                assert_eq!(columns, 1);
                assert_eq!(required_index, 1);
            }
            other => panic!("expected InsufficientColumnsError, got {:?}", other),
        }
    }

    #[test]
    fn test_index_equal_to_width_is_insufficient() {
        let sources = vec![source("a.xlsx", &[("SEX", "1")])];
        let config = MergeConfig::new(2, 1, ["SEX"], RowOrder::ByFilename);
        assert!(project(sources, &config).is_err());
    }

    #[test]
    fn test_no_fields_selected() {
        let sources = vec![source("a.xlsx", &[("SEX", "1")])];
        let config = MergeConfig::new(0, 1, Vec::<String>::new(), RowOrder::ByFilename);
        assert!(matches!(
            project(sources, &config),
            Err(MergeError::NoFieldsSelectedError)
        ));
    }

    #[test]
    fn test_candidate_fields_dedup_across_files() {
        let sources = vec![
            source("a.xlsx", &[("BIRTH_YEAR", "1990"), ("", "x"), ("SEX", "1")]),
            source("b.xlsx", &[("SEX", "2"), ("BIRTH_WGHT", "3100")]),
        ];
        let fields = candidate_fields(&sources, 0, 1).unwrap();
        assert_eq!(fields, vec!["BIRTH_YEAR", "SEX", "BIRTH_WGHT"]);
    }

    #[test]
    fn test_column_examples() {
        let table = source("a.xlsx", &[("BIRTH_YEAR", "1990")]);
        assert_eq!(
            column_examples(&table),
            vec!["Index 0: BIRTH_YEAR", "Index 1: 1990"]
        );
    }
}
