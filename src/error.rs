use std::fmt;
use thiserror::Error;

/// Uniform failure shape for every JSON-bodied API call.
///
/// `status_code` is the HTTP status that was observed. A decode failure of a
/// `200` body keeps `200` here, which marks a contract violation rather than a
/// rejection by the service. `details` carries the raw response body verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
    pub details: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: u16, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            details: details.into(),
        }
    }

    pub fn unexpected_status(status_code: u16, body: impl Into<String>) -> Self {
        Self::new("unexpected non 200 status code", status_code, body)
    }

    pub fn decode(err: &serde_json::Error, status_code: u16, body: impl Into<String>) -> Self {
        Self::new(err.to_string(), status_code, body)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dalle: {} (status: {}, details: {})",
            self.message, self.status_code, self.details
        )
    }
}

impl std::error::Error for ApiError {}

#[derive(Error, Debug)]
pub enum DalleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Task {task_id} was rejected")]
    TaskRejected { task_id: String },

    #[error("Task {task_id} still not finished after {attempts} polls")]
    PollExhausted { task_id: String, attempts: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DalleError {
    /// The structured API error, if this is one.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            DalleError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DalleError>;
