use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    #[error("Failed to read source file \"{file}\": {reason}")]
    SourceReadError { file: String, reason: String },

    #[error("Unsupported file type for \"{file}\"")]
    UnsupportedFileError { file: String },

    #[error("File \"{file}\" does not have enough columns ({columns} found, column index {required_index} requested)")]
    InsufficientColumnsError {
        file: String,
        columns: usize,
        required_index: usize,
    },

    #[error("No field names selected")]
    NoFieldsSelectedError,

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Configuration,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MergeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MergeError::IoError(_) => ErrorCategory::Io,
            MergeError::CsvError(_)
            | MergeError::SpreadsheetError(_)
            | MergeError::SourceReadError { .. }
            | MergeError::UnsupportedFileError { .. }
            | MergeError::InsufficientColumnsError { .. } => ErrorCategory::Input,
            MergeError::SerializationError(_)
            | MergeError::TomlParseError(_)
            | MergeError::TomlWriteError(_) => ErrorCategory::Serialization,
            MergeError::NoFieldsSelectedError
            | MergeError::InvalidConfigValueError { .. }
            | MergeError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Serialization => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            MergeError::InsufficientColumnsError { file, .. } => {
                format!("File \"{}\" does not have enough columns.", file)
            }
            MergeError::NoFieldsSelectedError => {
                "No field names selected. Please select at least one field before merging."
                    .to_string()
            }
            MergeError::SourceReadError { file, .. } | MergeError::UnsupportedFileError { file } => {
                format!("Could not read \"{}\".", file)
            }
            MergeError::TomlParseError(_) | MergeError::SerializationError(_) => {
                "Error loading configuration.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MergeError::InsufficientColumnsError { .. } => {
                "Check the column indices or make sure every file shares the layout of the first one"
            }
            MergeError::NoFieldsSelectedError => {
                "Pass --fields or use --list-fields to see what is available"
            }
            MergeError::SourceReadError { .. } | MergeError::SpreadsheetError(_) => {
                "Make sure the file is a valid spreadsheet and not open in another program"
            }
            MergeError::UnsupportedFileError { .. } => {
                "Supported file types are csv, tsv, xlsx, xlsm, xls and ods"
            }
            MergeError::CsvError(_) => "Check the CSV file for unbalanced quotes",
            MergeError::SerializationError(_)
            | MergeError::TomlParseError(_)
            | MergeError::TomlWriteError(_) => {
                "Check the configuration file syntax (JSON or TOML)"
            }
            MergeError::InvalidConfigValueError { .. } | MergeError::MissingConfigError { .. } => {
                "Fix the configuration and run again"
            }
            MergeError::IoError(_) => "Check that the path exists and is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
