use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Upstream responded with {status}: {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Invalid CSRF token")]
    CsrfError,

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Validation,
    Security,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EdgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        EdgeError::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EdgeError::ApiError(_) | EdgeError::UpstreamError { .. } => ErrorCategory::Network,
            EdgeError::IoError(_) | EdgeError::StorageError { .. } => ErrorCategory::Storage,
            EdgeError::SerializationError(_) => ErrorCategory::Internal,
            EdgeError::ConfigError { .. }
            | EdgeError::MissingConfigError { .. }
            | EdgeError::InvalidConfigValueError { .. }
            | EdgeError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EdgeError::ValidationError { .. } => ErrorCategory::Validation,
            EdgeError::CsrfError => ErrorCategory::Security,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Security => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Storage | ErrorCategory::Internal => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EdgeError::ApiError(_) => {
                "Check that the backend is reachable from this host (BACKEND_URL)".to_string()
            }
            EdgeError::UpstreamError { status, .. } => {
                format!("The backend answered {}; inspect the backend logs", status)
            }
            EdgeError::IoError(_) | EdgeError::StorageError { .. } => {
                "Check file permissions and free disk space for the storage directory".to_string()
            }
            EdgeError::SerializationError(_) => {
                "The payload is not valid JSON; check the producer of this data".to_string()
            }
            EdgeError::MissingConfigError { field } => {
                format!("Provide a value for '{}' in the config file or environment", field)
            }
            EdgeError::InvalidConfigValueError { field, .. }
            | EdgeError::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}' and restart", field)
            }
            EdgeError::ConfigError { .. } => "Review the configuration file syntax".to_string(),
            EdgeError::ValidationError { .. } => "Correct the request payload".to_string(),
            EdgeError::CsrfError => {
                "Fetch /api/csrf-token and echo it in the x-csrf-token header".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => "Could not reach the Wearsearch backend".to_string(),
            ErrorCategory::Validation => self.to_string(),
            ErrorCategory::Security => "Request was rejected".to_string(),
            ErrorCategory::Storage => "Could not read or write local data".to_string(),
            ErrorCategory::Internal => "Unexpected internal error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EdgeError>;
