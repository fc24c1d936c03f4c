//! Unified SDK error types.

use thiserror::Error;

/// Result alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Top-level SDK error.
///
/// Every terminal failure of an operation is delivered through its
/// `ResultHandle` as exactly one of these variants.
#[derive(Error, Debug)]
pub enum SdkError {
    /// The server answered `success: false` with an error payload.
    #[error("Error id: {id}, message: {message}, http status: {status}, path: {path}")]
    Remote {
        id: String,
        message: String,
        status: u16,
        path: String,
    },

    /// Required response metadata was missing or malformed.
    #[error("{message} http status: {status}, path: {path}")]
    Protocol {
        message: String,
        status: u16,
        path: String,
    },

    /// Transient errors (429 / 5xx) outlasted the configured retry budget.
    #[error("Too many retries http status: {status}, path: {path}")]
    RetryBudgetExhausted { status: u16, path: String, retries: u32 },

    /// The response body could not be decoded as an envelope.
    #[error("Deserialization error: {source} http status: {status}, path: {path}")]
    Decode {
        status: u16,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SdkError {
    pub(crate) fn protocol(message: impl Into<String>, status: u16, path: impl Into<String>) -> Self {
        SdkError::Protocol {
            message: message.into(),
            status,
            path: path.into(),
        }
    }

    /// HTTP status of the response that caused the error, if one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SdkError::Remote { status, .. }
            | SdkError::Protocol { status, .. }
            | SdkError::RetryBudgetExhausted { status, .. }
            | SdkError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Encoded path of the request that caused the error.
    pub fn path(&self) -> Option<&str> {
        match self {
            SdkError::Remote { path, .. }
            | SdkError::Protocol { path, .. }
            | SdkError::RetryBudgetExhausted { path, .. }
            | SdkError::Decode { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Server-issued diagnostic id (only set for remote errors, may be empty).
    pub fn error_id(&self) -> Option<&str> {
        match self {
            SdkError::Remote { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Message without the status/path decoration.
    pub fn error_message(&self) -> String {
        match self {
            SdkError::Remote { message, .. } | SdkError::Protocol { message, .. } => {
                message.clone()
            }
            SdkError::RetryBudgetExhausted { .. } => "Too many retries".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SdkError::Cancelled)
    }
}

/// Network-level failures. Never retried by the task lifecycle.
#[derive(Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),
}
