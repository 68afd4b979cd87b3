use crate::domain::model::{
    MergedTable, TypedValue, ValidatedTable, ValidationOutcome, Violation, ViolationReport,
    FILENAME_COLUMN,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int32,
    Float64,
}

impl ColumnType {
    fn dtype_check(&self) -> String {
        match self {
            ColumnType::String => "dtype('str')".to_string(),
            ColumnType::Int32 => "dtype('int32')".to_string(),
            ColumnType::Float64 => "dtype('float64')".to_string(),
        }
    }

    fn coerce(&self, raw: &str) -> Option<TypedValue> {
        let trimmed = raw.trim();
        match self {
            ColumnType::String => Some(TypedValue::Text(raw.to_string())),
            ColumnType::Int32 => parse_int32(trimmed).map(TypedValue::Int),
            ColumnType::Float64 => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(TypedValue::Float),
        }
    }
}

/// Accepts plain integers and integral floats such as `1990.0`.
fn parse_int32(raw: &str) -> Option<i32> {
    if let Ok(value) = raw.parse::<i32>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// Inclusive on both ends.
    InRange { min: f64, max: f64 },
    IsIn { allowed: Vec<i64> },
}

impl Check {
    fn passes(&self, value: &TypedValue) -> bool {
        let number = match value {
            TypedValue::Int(i) => *i as f64,
            TypedValue::Float(f) => *f,
            TypedValue::Null | TypedValue::Text(_) => return true,
        };
        match self {
            Check::InRange { min, max } => number >= *min && number <= *max,
            Check::IsIn { allowed } => allowed.iter().any(|a| *a as f64 == number),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::InRange { min, max } => write!(f, "in_range({}, {})", min, max),
            Check::IsIn { allowed } => write!(f, "isin({:?})", allowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRule {
    pub column: String,
    pub dtype: ColumnType,
    pub nullable: bool,
    pub check: Option<Check>,
}

impl SchemaRule {
    pub fn new(column: &str, dtype: ColumnType) -> Self {
        Self {
            column: column.to_string(),
            dtype,
            nullable: false,
            check: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn in_range(mut self, min: f64, max: f64) -> Self {
        self.check = Some(Check::InRange { min, max });
        self
    }

    pub fn is_in(mut self, allowed: &[i64]) -> Self {
        self.check = Some(Check::IsIn {
            allowed: allowed.to_vec(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    rules: Vec<SchemaRule>,
}

impl Schema {
    pub fn new(rules: Vec<SchemaRule>) -> Self {
        Self { rules }
    }

    /// 出生資料的固定檢查規則
    pub fn birth_records() -> Self {
        Self::new(vec![
            SchemaRule::new(FILENAME_COLUMN, ColumnType::String),
            SchemaRule::new("BIRTH_YEAR", ColumnType::Int32)
                .in_range(1900.0, 2023.0)
                .nullable(),
            SchemaRule::new("BIRTH_MNTH", ColumnType::Int32)
                .in_range(1.0, 12.0)
                .nullable(),
            SchemaRule::new("BIRTH_DAY", ColumnType::Int32)
                .in_range(1.0, 31.0)
                .nullable(),
            SchemaRule::new("BIRTH_WGHT", ColumnType::Float64)
                .in_range(300.0, 6000.0)
                .nullable(),
            SchemaRule::new("SEX", ColumnType::Int32).is_in(&[1, 2]).nullable(),
        ])
    }

    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    fn rule_for(&self, column: &str) -> Option<&SchemaRule> {
        self.rules.iter().find(|r| r.column == column)
    }

    /// 檢查整張表並收集所有違規，不在第一個錯誤就停止。
    ///
    /// Missing schema columns are reported first, then cell violations in
    /// row order and, within a row, in schema order. Columns that the schema
    /// does not name pass through as text.
    pub fn validate(&self, table: &MergedTable) -> ValidationOutcome {
        let mut violations = Vec::new();

        let mut present = Vec::new();
        for rule in &self.rules {
            match table.column_index(&rule.column) {
                Some(index) => present.push((rule, index)),
                None => violations.push(Violation {
                    row: None,
                    column: rule.column.clone(),
                    check: "column_in_dataframe".to_string(),
                    failure_case: None,
                }),
            }
        }

        let columns = table.header();
        let mut rows = Vec::with_capacity(table.len());

        for row in 0..table.len() {
            let mut typed: Vec<TypedValue> = (0..columns.len())
                .map(|i| {
                    table
                        .value(row, i)
                        .map_or(TypedValue::Null, |v| TypedValue::Text(v.to_string()))
                })
                .collect();

            for (rule, index) in &present {
                let raw = table.value(row, *index);
                typed[*index] = self.check_cell(rule, row, raw, &mut violations);
            }

            rows.push(typed);
        }

        match ViolationReport::new(violations) {
            None => ValidationOutcome::Valid(ValidatedTable { columns, rows }),
            Some(report) => {
                tracing::debug!("Validation found {} violations", report.len());
                ValidationOutcome::Invalid(report)
            }
        }
    }

    fn check_cell(
        &self,
        rule: &SchemaRule,
        row: usize,
        raw: Option<&str>,
        violations: &mut Vec<Violation>,
    ) -> TypedValue {
        let violation = |check: String| Violation {
            row: Some(row),
            column: rule.column.clone(),
            check,
            failure_case: raw.map(str::to_string),
        };

        // 空字串只對數值欄位視為缺值
        let present = match raw {
            Some(text) if rule.dtype == ColumnType::String || !text.trim().is_empty() => {
                Some(text)
            }
            _ => None,
        };

        let Some(text) = present else {
            if !rule.nullable {
                violations.push(violation("not_nullable".to_string()));
            }
            return TypedValue::Null;
        };

        let Some(value) = rule.dtype.coerce(text) else {
            violations.push(violation(rule.dtype.dtype_check()));
            return TypedValue::Null;
        };

        if let Some(check) = &rule.check {
            if !check.passes(&value) {
                violations.push(violation(check.to_string()));
            }
        }

        value
    }

    /// Rule lookup by column name, used when reporting.
    pub fn describe(&self, column: &str) -> Option<String> {
        let rule = self.rule_for(column)?;
        let mut parts = vec![format!("{:?}", rule.dtype).to_lowercase()];
        if let Some(check) = &rule.check {
            parts.push(check.to_string());
        }
        if rule.nullable {
            parts.push("nullable".to_string());
        }
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MergedRow;

    fn table(fields: &[&str], rows: Vec<(&str, Vec<Option<&str>>)>) -> MergedTable {
        let mut table = MergedTable::new(fields.iter().map(|f| f.to_string()).collect());
        for (filename, values) in rows {
            table.rows.push(MergedRow {
                filename: filename.to_string(),
                values: values.iter().map(|v| v.map(str::to_string)).collect(),
            });
        }
        table
    }

    const ALL: &[&str] = &["BIRTH_YEAR", "BIRTH_MNTH", "BIRTH_DAY", "BIRTH_WGHT", "SEX"];

    #[test]
    fn test_valid_table_is_fully_coerced() {
        let input = table(
            ALL,
            vec![
                ("a.xlsx", vec![Some("1990"), Some("5"), Some("17"), Some("3250.5"), Some("1")]),
                ("b.xlsx", vec![None, Some(""), Some("1.0"), None, Some("2")]),
            ],
        );

        let outcome = Schema::birth_records().validate(&input);
        let validated = outcome.table().expect("table should be valid");

        assert!(outcome.report().is_none());
        assert_eq!(validated.columns[0], "Filename");
        assert_eq!(
            validated.rows[0],
            vec![
                TypedValue::Text("a.xlsx".to_string()),
                TypedValue::Int(1990),
                TypedValue::Int(5),
                TypedValue::Int(17),
                TypedValue::Float(3250.5),
                TypedValue::Int(1),
            ]
        );
        assert_eq!(validated.rows[1][1], TypedValue::Null);
        assert_eq!(validated.rows[1][2], TypedValue::Null);
        assert_eq!(validated.rows[1][3], TypedValue::Int(1));
    }

    #[test]
    fn test_collects_every_violation() {
        let input = table(
            ALL,
            vec![("a.xlsx", vec![Some("1800"), Some("13"), Some("4"), Some("3000"), Some("3")])],
        );

        let outcome = Schema::birth_records().validate(&input);
        assert!(outcome.table().is_none());

        let report = outcome.report().unwrap();
        assert_eq!(report.len(), 3);

        let checks: Vec<(&str, &str, Option<&str>)> = report
            .violations()
            .iter()
            .map(|v| (v.column.as_str(), v.check.as_str(), v.failure_case.as_deref()))
            .collect();
        assert_eq!(
            checks,
            vec![
                ("BIRTH_YEAR", "in_range(1900, 2023)", Some("1800")),
                ("BIRTH_MNTH", "in_range(1, 12)", Some("13")),
                ("SEX", "isin([1, 2])", Some("3")),
            ]
        );
    }

    #[test]
    fn test_violations_are_row_major() {
        let input = table(
            ALL,
            vec![
                ("a.xlsx", vec![None, None, Some("40"), None, None]),
                ("b.xlsx", vec![Some("abc"), None, None, Some("7000"), None]),
            ],
        );

        let outcome = Schema::birth_records().validate(&input);
        let report = outcome.report().unwrap();
        let rows: Vec<Option<usize>> = report.violations().iter().map(|v| v.row).collect();
        assert_eq!(rows, vec![Some(0), Some(1), Some(1)]);
        assert_eq!(report.violations()[1].check, "dtype('int32')");
        assert_eq!(report.violations()[2].check, "in_range(300, 6000)");
    }

    #[test]
    fn test_missing_schema_column_is_reported() {
        let input = table(&["BIRTH_YEAR"], vec![("a.xlsx", vec![Some("1990")])]);

        let outcome = Schema::birth_records().validate(&input);
        let report = outcome.report().unwrap();
        assert_eq!(report.len(), 4);
        assert!(report
            .violations()
            .iter()
            .all(|v| v.row.is_none() && v.check == "column_in_dataframe"));
    }

    #[test]
    fn test_not_nullable_column() {
        let schema = Schema::new(vec![SchemaRule::new("COUNT", ColumnType::Int32)]);
        let input = table(&["COUNT"], vec![("a.xlsx", vec![None]), ("b.xlsx", vec![Some(" ")])]);

        let outcome = schema.validate(&input);
        let report = outcome.report().unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.violations().iter().all(|v| v.check == "not_nullable"));
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let schema = Schema::new(vec![SchemaRule::new(FILENAME_COLUMN, ColumnType::String)]);
        let input = table(&["NOTE"], vec![("a.xlsx", vec![Some("anything")])]);

        let outcome = schema.validate(&input);
        let validated = outcome.table().unwrap();
        assert_eq!(validated.rows[0][1], TypedValue::Text("anything".to_string()));
    }

    #[test]
    fn test_non_finite_weight_is_dtype_violation() {
        let input = table(
            ALL,
            vec![
                ("a.xlsx", vec![None, None, None, Some("NaN"), None]),
                ("b.xlsx", vec![None, None, None, Some("inf"), None]),
                ("c.xlsx", vec![None, None, None, Some("-infinity"), None]),
            ],
        );

        let outcome = Schema::birth_records().validate(&input);
        let report = outcome.report().unwrap();
        assert_eq!(report.len(), 3);
        assert!(report
            .violations()
            .iter()
            .all(|v| v.column == "BIRTH_WGHT" && v.check == "dtype('float64')"));
    }

    #[test]
    fn test_parse_int32() {
        assert_eq!(parse_int32("1990"), Some(1990));
        assert_eq!(parse_int32("1990.0"), Some(1990));
        assert_eq!(parse_int32("1990.5"), None);
        assert_eq!(parse_int32("x"), None);
        assert_eq!(parse_int32("NaN"), None);
        assert_eq!(parse_int32("inf"), None);
    }

    #[test]
    fn test_describe() {
        let schema = Schema::birth_records();
        assert_eq!(
            schema.describe("SEX").as_deref(),
            Some("int32 isin([1, 2]) nullable")
        );
        assert_eq!(schema.describe("UNKNOWN"), None);
    }
}
