use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote service rejected the request: {message}")]
    RemoteValidation { message: String },

    #[error("Remote service unavailable at {endpoint}: {source}")]
    RemoteUnavailable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote service returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Unexpected response from remote service: {message}")]
    MalformedResponse { message: String },

    #[error("{message}")]
    UserFacing { message: String },

    #[error("Queue is full ({max} requests already waiting)")]
    QueueFull { max: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
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
    Remote,
    User,
    Capacity,
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

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::RemoteValidation { .. }
            | AppError::RemoteUnavailable { .. }
            | AppError::RemoteStatus { .. }
            | AppError::MalformedResponse { .. } => ErrorCategory::Remote,
            AppError::UserFacing { .. } => ErrorCategory::User,
            AppError::QueueFull { .. } => ErrorCategory::Capacity,
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            AppError::IoError(_) | AppError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::User => ErrorSeverity::Low,
            ErrorCategory::Capacity | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息，不包含內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::UserFacing { message } | AppError::RemoteValidation { message } => {
                message.clone()
            }
            AppError::QueueFull { .. } => {
                "Too many people are using this demo right now, please try again shortly."
                    .to_string()
            }
            AppError::RemoteUnavailable { .. }
            | AppError::RemoteStatus { .. }
            | AppError::MalformedResponse { .. } => {
                "An upstream image service failed to produce a result.".to_string()
            }
            other if other.category() == ErrorCategory::Configuration => {
                format!("Invalid configuration: {}", other)
            }
            _ => "Something went wrong while processing the request.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::RemoteValidation { .. } | AppError::UserFacing { .. } => {
                "Adjust the prompt or portrait and submit again"
            }
            AppError::RemoteUnavailable { .. } => {
                "Check that both remote spaces are running and reachable"
            }
            AppError::RemoteStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check that HF_TOKEN grants access to both remote spaces"
            }
            AppError::RemoteStatus { .. } | AppError::MalformedResponse { .. } => {
                "The remote space API may have changed; verify its endpoints"
            }
            AppError::QueueFull { .. } => "Wait for pending requests to finish",
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::ConfigValidationError { .. } => {
                "Review command-line flags, environment variables and the config file"
            }
            AppError::IoError(_) | AppError::SerializationError(_) => {
                "Check file permissions and input formats"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
