use crate::config::{MergeConfig, RowOrder};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_required_field, Validate,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "tsv", "xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "sheet-merger")]
#[command(about = "Merge selected fields from many spreadsheets into one table and validate it")]
pub struct CliConfig {
    /// Spreadsheet files to merge
    pub files: Vec<String>,

    /// Load column indices, fields and row order from a JSON or TOML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Index of the column holding field names
    #[arg(long)]
    pub name_column: Option<usize>,

    /// Index of the column holding field values [default: name column + 1]
    #[arg(long)]
    pub value_column: Option<usize>,

    /// Ordered, comma separated list of fields to output
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Row ordering policy
    #[arg(long, value_enum)]
    pub order: Option<RowOrder>,

    #[arg(short, long, default_value = "./output")]
    pub output_dir: String,

    /// Write the effective configuration to this path before merging
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Print the field names found in the input files and exit
    #[arg(long)]
    pub list_fields: bool,

    /// Validate an already merged CSV instead of merging input files
    #[arg(long)]
    pub validate_only: Option<String>,

    /// Show what would be merged without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 合併設定檔與命令列參數，命令列優先
    pub fn resolve_merge_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => MergeConfig::from_file(path)?,
            None => {
                let name_column = *validate_required_field("name_column", &self.name_column)?;
                MergeConfig::new(
                    name_column,
                    self.value_column.unwrap_or(name_column + 1),
                    Vec::<String>::new(),
                    RowOrder::default(),
                )
            }
        };

        if let Some(index) = self.name_column {
            config.field_name_column_index = index;
        }
        if let Some(index) = self.value_column {
            config.field_value_column_index = index;
        }
        if !self.fields.is_empty() {
            config.set_requested_fields(self.fields.iter().map(|f| f.trim().to_string()));
        }
        if let Some(order) = self.order {
            config.row_order_policy = order;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_dir", &self.output_dir)?;

        if self.validate_only.is_none() {
            validate_file_extensions("files", &self.files, SUPPORTED_EXTENSIONS)?;
        }

        Ok(())
    }
}
