use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed record at index {index}: missing or invalid '{field}'")]
    MalformedRecordError { index: usize, field: &'static str },

    #[error("Malformed date key '{key}': expected YYYYMM")]
    MalformedDateKeyError { key: String },

    #[error("Count overflow while summing '{field}'")]
    CountOverflowError { field: String },

    #[error("Duplicate process status '{status}' in consumption response")]
    DuplicateStatusError { status: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status} for {endpoint}")]
    ApiStatusError { endpoint: String, status: u16 },

    #[error("Unexpected API response: {message}")]
    UnexpectedResponseError { message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Network,
    Authentication,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::MalformedRecordError { .. }
            | ReportError::MalformedDateKeyError { .. }
            | ReportError::CountOverflowError { .. }
            | ReportError::DuplicateStatusError { .. }
            | ReportError::UnexpectedResponseError { .. }
            | ReportError::SerializationError(_)
            | ReportError::CsvError(_) => ErrorCategory::Data,
            ReportError::ApiError(_) | ReportError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            ReportError::AuthError { .. } => ErrorCategory::Authentication,
            ReportError::ZipError(_) | ReportError::IoError(_) => ErrorCategory::Storage,
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Authentication | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReportError::MalformedRecordError { .. } => {
                "Check that every record carries 'processStatus' and 'consumption'"
            }
            ReportError::MalformedDateKeyError { .. } => {
                "Monthly keys under 'consolidados' must look like 202401"
            }
            ReportError::CountOverflowError { .. } => {
                "A count in the response does not fit a 64-bit integer; narrow the date range"
            }
            ReportError::DuplicateStatusError { .. } => {
                "Set normalize.duplicate_status = \"merge\" to combine repeated statuses"
            }
            ReportError::ApiError(_) | ReportError::ApiStatusError { .. } => {
                "Verify api.base_url and network connectivity, then retry"
            }
            ReportError::AuthError { .. } => "Check auth.email and auth.password",
            ReportError::ZipError(_) | ReportError::IoError(_) => {
                "Check that load.output_path exists and is writable"
            }
            ReportError::UnexpectedResponseError { .. }
            | ReportError::CsvError(_)
            | ReportError::SerializationError(_) => {
                "The API response shape may have changed; inspect it with --verbose"
            }
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Data => format!("The consumption data could not be processed: {}", self),
            ErrorCategory::Network => format!("Could not reach the consumption API: {}", self),
            ErrorCategory::Authentication => format!("Could not sign in: {}", self),
            ErrorCategory::Storage => format!("Could not write the report: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
