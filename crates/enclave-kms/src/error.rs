//! Backend adapter error types.

use enclave_core::errors::{ERROR_BACKEND, ERROR_CONNECT, ERROR_DECODE};

/// Key-management backend error.
#[derive(Debug, thiserror::Error)]
pub enum KmsError {
    /// The HTTP request could not be built, sent or read.
    #[error("http: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    /// The backend answered with a body that is not the expected JSON.
    #[error("decode: {0}")]
    Decode(String),
}

impl KmsError {
    /// Create an HTTP error from any error type.
    #[inline]
    pub fn http<E: std::fmt::Display>(err: E) -> Self {
        Self::Http(err.to_string())
    }

    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            KmsError::Http(_) => ERROR_CONNECT,
            KmsError::Backend { .. } => ERROR_BACKEND,
            KmsError::Decode(_) => ERROR_DECODE,
        }
    }
}
