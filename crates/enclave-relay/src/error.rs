//! Error types for the relay crate.

use std::io;

use enclave_core::ChannelAddr;
use enclave_core::errors::{
    ERROR_ACCEPT, ERROR_CLOSED, ERROR_CONFIG, ERROR_CONNECT, ERROR_READ,
    ERROR_SOCKET, ERROR_WRITE,
};
use enclave_kms::KmsError;
use enclave_transport::TransportError;
use thiserror::Error;

/// Errors that can occur in the relay system.
///
/// Only [`Socket`](Self::Socket), [`BindExhausted`](Self::BindExhausted) and
/// [`Config`](Self::Config) are fatal; everything else ends a single Exchange.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("socket error on {addr}: {source}")]
    Socket {
        addr: ChannelAddr,
        #[source]
        source: TransportError,
    },

    #[error("failed to bind {addr} after {attempts} attempts: {source}")]
    BindExhausted {
        addr: ChannelAddr,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] TransportError),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: ChannelAddr,
        #[source]
        source: TransportError,
    },

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("peer closed the connection without a reply")]
    ConnectionClosed,

    #[error("backend: {0}")]
    Backend(#[from] KmsError),

    #[error("config error: {0}")]
    Config(String),
}

impl RelayError {
    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            RelayError::Socket { .. } | RelayError::BindExhausted { .. } => ERROR_SOCKET,
            RelayError::Accept(_) => ERROR_ACCEPT,
            RelayError::Connect { .. } => ERROR_CONNECT,
            RelayError::Read(_) => ERROR_READ,
            RelayError::Write(_) => ERROR_WRITE,
            RelayError::ConnectionClosed => ERROR_CLOSED,
            RelayError::Backend(e) => e.error_type(),
            RelayError::Config(_) => ERROR_CONFIG,
        }
    }

    /// Whether the error terminates the process rather than one Exchange.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Socket { .. } | RelayError::BindExhausted { .. } | RelayError::Config(_)
        )
    }
}

impl From<enclave_config::ConfigError> for RelayError {
    fn from(err: enclave_config::ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use enclave_core::errors::ERROR_BACKEND;

    use super::*;

    #[test]
    fn classification() {
        let addr = ChannelAddr::new(2, 8000);
        let io_err = || io::Error::from(io::ErrorKind::AddrInUse);
        let bind = RelayError::BindExhausted {
            addr,
            attempts: 5,
            source: TransportError::Io(io_err()),
        };
        assert!(bind.is_fatal());
        assert_eq!(bind.error_type(), ERROR_SOCKET);
        assert!(bind.to_string().contains("2:8000 after 5 attempts"));

        let read = RelayError::Read(io_err());
        assert!(!read.is_fatal());
        assert_eq!(read.error_type(), ERROR_READ);

        let backend = RelayError::from(KmsError::Backend {
            status: 400,
            body: String::new(),
        });
        assert!(!backend.is_fatal());
        assert_eq!(backend.error_type(), ERROR_BACKEND);
    }
}
