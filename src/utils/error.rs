use thiserror::Error;

#[derive(Error, Debug)]
pub enum HorizonError {
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

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Parse error in {path} (line {line}): {message}")]
    ParseError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Time series error: {message}")]
    TimeSeriesError { message: String },

    #[error("Horizon not found (qlm: {qlm:?}, ah: {ah:?})")]
    HorizonNotFound {
        qlm: Option<usize>,
        ah: Option<usize>,
    },

    #[error("Quantity '{name}' not available in {namespace}")]
    QuantityNotFound { namespace: String, name: String },

    #[error("Iteration {iteration} not available for apparent horizon {ah:?}")]
    IterationNotFound { ah: Option<usize>, iteration: u64 },

    #[error("Invalid cut: {message}")]
    InvalidCut { message: String },

    #[error("Background task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Config,
    Lookup,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HorizonError {
    pub fn series(message: impl Into<String>) -> Self {
        HorizonError::TimeSeriesError {
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        HorizonError::ParseError {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            HorizonError::IoError(_) | HorizonError::ZipError(_) => ErrorCategory::Io,
            HorizonError::CsvError(_)
            | HorizonError::SerializationError(_)
            | HorizonError::ParseError { .. }
            | HorizonError::TimeSeriesError { .. }
            | HorizonError::InvalidCut { .. } => ErrorCategory::Data,
            HorizonError::ConfigError { .. }
            | HorizonError::ConfigValidationError { .. }
            | HorizonError::InvalidConfigValueError { .. }
            | HorizonError::MissingConfigError { .. } => ErrorCategory::Config,
            HorizonError::HorizonNotFound { .. }
            | HorizonError::QuantityNotFound { .. }
            | HorizonError::IterationNotFound { .. } => ErrorCategory::Lookup,
            HorizonError::TaskError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup => ErrorSeverity::Medium,
            ErrorCategory::Config | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HorizonError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("File or directory not found: {}", e)
            }
            HorizonError::ParseError { path, line, .. } => {
                format!("Could not read data file {} (line {})", path, line)
            }
            HorizonError::HorizonNotFound { qlm, ah } => {
                let mut wanted = Vec::new();
                if let Some(qlm) = qlm {
                    wanted.push(format!("QLM index {}", qlm));
                }
                if let Some(ah) = ah {
                    wanted.push(format!("AH index {}", ah));
                }
                if wanted.is_empty() {
                    "No horizon index was given".to_string()
                } else {
                    format!("No horizon data found for {}", wanted.join(" and "))
                }
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HorizonError::IoError(_) => "Check that the simulation directory exists and is readable",
            HorizonError::ZipError(_) | HorizonError::CsvError(_) => {
                "Check that the output path is writable"
            }
            HorizonError::SerializationError(_) => "Report the problem together with the manifest contents",
            HorizonError::ConfigError { .. }
            | HorizonError::ConfigValidationError { .. }
            | HorizonError::InvalidConfigValueError { .. }
            | HorizonError::MissingConfigError { .. } => {
                "Fix the configuration file or command line flags and retry"
            }
            HorizonError::ParseError { .. } => {
                "The file may be truncated; remove it or rerun the finder output"
            }
            HorizonError::TimeSeriesError { .. } => "Check the requested time range and sampling",
            HorizonError::HorizonNotFound { .. } => {
                "Run `horizon-scan list <SIMDIR>` to see available horizon indices"
            }
            HorizonError::QuantityNotFound { .. } => {
                "Run `horizon-scan list <SIMDIR>` to see available quantities"
            }
            HorizonError::IterationNotFound { .. } => {
                "Pick one of the shape iterations reported by `horizon-scan list`"
            }
            HorizonError::InvalidCut { .. } => "Use cuts like `z=0`, `x=1,y=0` or `_,_,0`",
            HorizonError::TaskError { .. } => "Retry; if it persists run with --verbose",
        }
    }
}

pub type Result<T> = std::result::Result<T, HorizonError>;
