//! What an endpoint does with one request.
//!
//! The Inner Relay hands the request to the next hop with a
//! [`ForwardHandler`]; the Outer Relay encrypts it with an
//! [`EncryptHandler`]. Both return the bytes written back to the caller.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use enclave_core::ChannelAddr;
use enclave_kms::Encryptor;
use enclave_transport::ChannelTransport;
use tracing::{debug, info};

use crate::error::RelayError;
use crate::forwarder::Forwarder;
use crate::framing::{Framing, SingleShot};

/// Turns one request into one reply.
#[async_trait]
pub trait ExchangeHandler: Send + Sync + 'static {
    async fn exchange(&self, request: Bytes) -> Result<Bytes, RelayError>;
}

#[async_trait]
impl<H: ExchangeHandler + ?Sized> ExchangeHandler for Arc<H> {
    async fn exchange(&self, request: Bytes) -> Result<Bytes, RelayError> {
        (**self).exchange(request).await
    }
}

/// Drop one trailing `\n` or `\r\n`, if present.
pub fn strip_line_ending(message: &[u8]) -> &[u8] {
    match message.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => message,
    }
}

/// Forwards each request to a fixed upstream address.
///
/// One trailing line ending is stripped first. A request that is nothing but
/// a line ending is forwarded unchanged.
#[derive(Debug, Clone)]
pub struct ForwardHandler<T, F = SingleShot> {
    forwarder: Forwarder<T, F>,
    upstream: ChannelAddr,
}

impl<T: ChannelTransport, F: Framing> ForwardHandler<T, F> {
    pub fn new(forwarder: Forwarder<T, F>, upstream: ChannelAddr) -> Self {
        Self {
            forwarder,
            upstream,
        }
    }
}

#[async_trait]
impl<T: ChannelTransport, F: Framing> ExchangeHandler for ForwardHandler<T, F> {
    async fn exchange(&self, request: Bytes) -> Result<Bytes, RelayError> {
        let payload = match strip_line_ending(&request) {
            [] => &request[..],
            stripped => stripped,
        };
        debug!(upstream = %self.upstream, bytes = payload.len(), "forwarding");
        self.forwarder.call(self.upstream, payload).await
    }
}

/// Encrypts each request and replies with the ciphertext text.
#[derive(Debug, Clone)]
pub struct EncryptHandler<E> {
    encryptor: E,
}

impl<E: Encryptor + 'static> EncryptHandler<E> {
    pub fn new(encryptor: E) -> Self {
        Self { encryptor }
    }
}

#[async_trait]
impl<E: Encryptor + 'static> ExchangeHandler for EncryptHandler<E> {
    async fn exchange(&self, request: Bytes) -> Result<Bytes, RelayError> {
        let start = Instant::now();
        let ciphertext = self.encryptor.encrypt(&request).await?;
        let ratio = if request.is_empty() {
            0.0
        } else {
            ciphertext.len() as f64 / request.len() as f64
        };
        info!(
            plaintext_bytes = request.len(),
            ciphertext_bytes = ciphertext.len(),
            ratio = format_args!("{ratio:.2}"),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "encrypted"
        );
        Ok(Bytes::from(ciphertext))
    }
}
