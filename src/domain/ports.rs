use crate::config::RowOrder;
use crate::domain::model::{MergedTable, SourceTable, ValidationOutcome};
use crate::utils::error::Result;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn field_name_column(&self) -> usize;
    fn field_value_column(&self) -> usize;
    fn requested_fields(&self) -> &[String];
    fn row_order(&self) -> RowOrder;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<SourceTable>>;
    fn transform(&self, sources: Vec<SourceTable>) -> Result<MergedTable>;
    fn validate(&self, table: &MergedTable) -> ValidationOutcome;
    fn load(&self, table: &MergedTable, outcome: &ValidationOutcome) -> Result<LoadReport>;
}

/// 各輸出檔寫入的位置
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadReport {
    pub merged_path: String,
    pub validated_path: Option<String>,
    pub errors_path: Option<String>,
}
