//! Shared error type across promfacade crates.

use std::time::Duration;

use thiserror::Error;

/// Stable error codes (used as metric labels and in logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Network failure talking to the backend.
    Transport,
    /// Backend call did not finish in time.
    Timeout,
    /// Backend answered with an error envelope.
    Backend,
    /// Backend payload could not be decoded.
    Decode,
    /// Invalid input / configuration.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in labels and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Backend => "BACKEND",
            ErrorCode::Decode => "DECODE",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromFacadeError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum PromFacadeError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("timeout: query exceeded {0:?}")]
    Timeout(Duration),
    #[error("{error_type}: {message}")]
    Backend { error_type: String, message: String },
    #[error("decode: {0}")]
    Decode(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl PromFacadeError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PromFacadeError::Transport(_) => ErrorCode::Transport,
            PromFacadeError::Timeout(_) => ErrorCode::Timeout,
            PromFacadeError::Backend { .. } => ErrorCode::Backend,
            PromFacadeError::Decode(_) => ErrorCode::Decode,
            PromFacadeError::BadRequest(_) => ErrorCode::BadRequest,
            PromFacadeError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            PromFacadeError::Internal(_) => ErrorCode::Internal,
        }
    }
}
