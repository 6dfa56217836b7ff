use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A request the platform answered with `ok: false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub code: i32,
    pub description: String,
    /// Seconds to wait before retrying, present when the request was rate limited.
    pub retry_after: Option<u64>,
}

impl ApiFailure {
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: 429,
            description: format!("Too Many Requests: retry after {}", retry_after),
            retry_after: Some(retry_after),
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// Codes 400-409: the target message or chat is unusable, so retrying is pointless.
    pub fn is_message_gone(&self) -> bool {
        (400..410).contains(&self.code)
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Telegram says: [{}] {}", self.code, self.description)
    }
}

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("{0}")]
    Telegram(ApiFailure),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{message}")]
    Link { message: String },

    #[error("{operation} is not supported by this session")]
    Unsupported { operation: String },

    #[error("Unexpected response: {message}")]
    ResponseError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Platform,
    Network,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CourierError {
    pub fn link(message: impl Into<String>) -> Self {
        Self::Link {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// The platform failure behind this error, if any.
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Telegram(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.api_failure()
            .and_then(|failure| failure.retry_after)
            .map(Duration::from_secs)
    }

    pub fn is_client_error(&self) -> bool {
        self.api_failure()
            .map(ApiFailure::is_client_error)
            .unwrap_or(false)
    }

    pub fn is_message_gone(&self) -> bool {
        self.api_failure()
            .map(ApiFailure::is_message_gone)
            .unwrap_or(false)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Telegram(_) | Self::Unsupported { .. } | Self::ResponseError { .. } => {
                ErrorCategory::Platform
            }
            Self::ApiError(_) => ErrorCategory::Network,
            Self::Link { .. } => ErrorCategory::Input,
            Self::InvalidConfigValueError { .. } | Self::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Telegram(failure) if failure.retry_after.is_some() => ErrorSeverity::Medium,
            Self::ApiError(_) => ErrorSeverity::Medium,
            Self::Telegram(_)
            | Self::Link { .. }
            | Self::Unsupported { .. }
            | Self::ResponseError { .. } => ErrorSeverity::High,
            _ => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Platform if self.retry_after().is_some() => {
                "Wait for the rate limit to expire and try again"
            }
            ErrorCategory::Platform => "Check that the bot can access the target chat",
            ErrorCategory::Network => "Check network connectivity and the API base URL",
            ErrorCategory::Input => "Check the message link format",
            ErrorCategory::Configuration => "Review the configuration file",
            ErrorCategory::System => "Check file permissions and disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Telegram(failure) => failure.to_string(),
            Self::Link { message } => message.clone(),
            Self::ApiError(_) => "Could not reach the Telegram API".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;
