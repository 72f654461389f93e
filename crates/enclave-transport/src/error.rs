//! Error types for the transport crate.

use thiserror::Error;

/// Errors that can occur in transport operations.
///
/// Listener setup is split by step so callers can retry only the bind.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("socket creation failed: {0}")]
    Socket(#[source] std::io::Error),

    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    #[error("listen failed: {0}")]
    Listen(#[source] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl TransportError {
    /// Whether a fresh socket may succeed where this one failed.
    pub fn is_bind_contention(&self) -> bool {
        matches!(self, TransportError::Bind(_))
    }
}
