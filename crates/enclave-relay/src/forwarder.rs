//! Outbound request/reply calls to the next hop.

use std::time::Instant;

use bytes::Bytes;
use enclave_core::ChannelAddr;
use enclave_transport::ChannelTransport;
use tracing::debug;

use crate::error::RelayError;
use crate::framing::{Framing, SingleShot};

/// Opens one connection per call, sends one request and reads one reply.
///
/// The connection is never reused: it is closed when [`call`](Self::call)
/// returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct Forwarder<T, F = SingleShot> {
    transport: T,
    framing: F,
}

impl<T: ChannelTransport> Forwarder<T> {
    pub fn new(transport: T) -> Self {
        Self::with_framing(transport, SingleShot::default())
    }
}

impl<T: ChannelTransport, F: Framing> Forwarder<T, F> {
    pub fn with_framing(transport: T, framing: F) -> Self {
        Self { transport, framing }
    }

    /// Send `request` to `peer` and return its reply.
    ///
    /// A peer that closes without answering yields
    /// [`RelayError::ConnectionClosed`].
    pub async fn call(&self, peer: ChannelAddr, request: &[u8]) -> Result<Bytes, RelayError> {
        let start = Instant::now();
        let mut stream = self
            .transport
            .connect(peer)
            .await
            .map_err(|source| RelayError::Connect { addr: peer, source })?;
        debug!(%peer, elapsed_us = start.elapsed().as_micros() as u64, "connected");

        let written = self
            .framing
            .write_message(&mut stream, request)
            .await
            .map_err(RelayError::Write)?;
        debug!(%peer, bytes = written, elapsed_us = start.elapsed().as_micros() as u64, "request sent");

        let reply = self
            .framing
            .read_message(&mut stream)
            .await
            .map_err(RelayError::Read)?;
        if reply.is_empty() {
            return Err(RelayError::ConnectionClosed);
        }
        debug!(%peer, bytes = reply.len(), elapsed_us = start.elapsed().as_micros() as u64, "reply received");
        Ok(reply)
    }
}
