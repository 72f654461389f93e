//! Error type constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Socket create/bind/listen failure.
pub const ERROR_SOCKET: &str = "socket";
/// Accepting an inbound connection failed.
pub const ERROR_ACCEPT: &str = "accept";
/// Outbound connect failure.
pub const ERROR_CONNECT: &str = "connect";
/// Read failure on a connection.
pub const ERROR_READ: &str = "read";
/// Write failure on a connection.
pub const ERROR_WRITE: &str = "write";
/// Peer closed the connection without a reply.
pub const ERROR_CLOSED: &str = "closed";
/// Key-management backend rejected the request.
pub const ERROR_BACKEND: &str = "backend";
/// Malformed backend response.
pub const ERROR_DECODE: &str = "decode";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
