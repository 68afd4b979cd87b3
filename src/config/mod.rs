#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MergeError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 輸出列（每個檔案一列）的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Lexicographic by the full file name.
    #[default]
    #[serde(alias = "By filename")]
    ByFilename,
    /// Lexicographic by the last whitespace-delimited token of the file name.
    #[serde(alias = "By last word in filename")]
    ByFilenameLastToken,
}

/// 合併設定：兩個欄位索引、要輸出的欄位與排序方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(alias = "data_header_idx")]
    pub field_name_column_index: usize,

    #[serde(alias = "data_col_idx")]
    pub field_value_column_index: usize,

    #[serde(
        alias = "selected_headers",
        default,
        deserialize_with = "deserialize_fields"
    )]
    pub requested_field_names: Vec<String>,

    #[serde(default)]
    pub row_order_policy: RowOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Removes repeated names, keeping the first occurrence of each.
pub fn dedup_fields<I, S>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .map(Into::into)
        .filter(|field| seen.insert(field.clone()))
        .collect()
}

fn deserialize_fields<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let fields = Vec::<String>::deserialize(deserializer)?;
    Ok(dedup_fields(fields))
}

impl MergeConfig {
    pub fn new<I, S>(
        field_name_column_index: usize,
        field_value_column_index: usize,
        requested_field_names: I,
        row_order_policy: RowOrder,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_name_column_index,
            field_value_column_index,
            requested_field_names: dedup_fields(requested_field_names),
            row_order_policy,
        }
    }

    pub fn set_requested_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_field_names = dedup_fields(fields);
    }

    /// 從 JSON 或 TOML 檔案載入設定（依副檔名判斷）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MergeError::IoError)?;
        match ConfigFormat::from_path(&path) {
            ConfigFormat::Json => Self::from_json_str(&content),
            ConfigFormat::Toml => Self::from_toml_str(&content),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 儲存設定，格式依副檔名決定
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match ConfigFormat::from_path(&path) {
            ConfigFormat::Json => self.to_json_string()?,
            ConfigFormat::Toml => self.to_toml_string()?,
        };
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, content)?;
        tracing::info!("💾 Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Replaces `self` with the configuration stored at `path`.
    /// On any error `self` is left untouched.
    pub fn reload_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let loaded = Self::from_file(&path)?;
        loaded.validate()?;
        *self = loaded;
        tracing::info!("✅ Configuration loaded from {}", path.as_ref().display());
        Ok(())
    }
}

impl ConfigProvider for MergeConfig {
    fn field_name_column(&self) -> usize {
        self.field_name_column_index
    }

    fn field_value_column(&self) -> usize {
        self.field_value_column_index
    }

    fn requested_fields(&self) -> &[String] {
        &self.requested_field_names
    }

    fn row_order(&self) -> RowOrder {
        self.row_order_policy
    }
}

impl Validate for MergeConfig {
    fn validate(&self) -> Result<()> {
        for field in &self.requested_field_names {
            validate_non_empty_string("requested_field_names", field)?;
        }

        if self.field_name_column_index == self.field_value_column_index {
            tracing::warn!(
                "Field name and field value both read from column {}",
                self.field_name_column_index
            );
        }

        Ok(())
    }
}
