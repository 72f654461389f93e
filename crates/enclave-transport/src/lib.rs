//! Transport channel abstraction.
//!
//! A transport channel is a stream socket address space keyed by
//! `(context-id, port)`. Relay endpoints bind and accept through
//! [`ChannelTransport`] / [`ChannelListener`], forwarders connect through
//! [`ChannelTransport::connect`], so the relay logic never touches a
//! concrete socket family.
//!
//! # Transports
//!
//! - [`vsock`]: AF_VSOCK hypervisor sockets (Linux, `vsock` feature).
//! - [`tcp`]: loopback TCP keyed by port only, for local runs and tests.

pub mod error;
pub mod tcp;
#[cfg(all(target_os = "linux", feature = "vsock"))]
pub mod vsock;

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

pub use enclave_core::ChannelAddr;
pub use error::TransportError;

/// Boxed future returned by transport operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Marker trait for streams carried by a transport channel.
pub trait ChannelStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> ChannelStream for T {}

/// A bound, listening channel socket.
pub trait ChannelListener: Send + 'static {
    /// The stream type produced for each accepted connection.
    type Stream: ChannelStream;

    /// Wait for the next inbound connection and the peer's address.
    fn accept(&mut self) -> BoxFuture<'_, Result<(Self::Stream, ChannelAddr), TransportError>>;

    /// The address actually bound (resolves port 0 on the tcp transport).
    fn local_addr(&self) -> Result<ChannelAddr, TransportError>;
}

/// Creates listening sockets and outbound connections on one address space.
pub trait ChannelTransport: Clone + Send + Sync + 'static {
    /// The stream type for both accepted and dialed connections.
    type Stream: ChannelStream;
    /// The listener type produced by [`bind`](Self::bind).
    type Listener: ChannelListener<Stream = Self::Stream>;

    /// Create a fresh socket, bind it to `addr` and start listening.
    ///
    /// Each call owns a new socket; a failed call leaves nothing behind.
    fn bind(&self, addr: ChannelAddr, backlog: u32) -> Result<Self::Listener, TransportError>;

    /// Open a new connection to `addr`.
    fn connect(&self, addr: ChannelAddr) -> BoxFuture<'_, Result<Self::Stream, TransportError>>;
}
