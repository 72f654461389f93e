//! Message framing on a relay connection.
//!
//! The protocol has no length prefix and no delimiter: a request is whatever
//! one read returns, a reply is whatever one write accepts. [`SingleShot`]
//! implements exactly that. Endpoints and forwarders only talk to the
//! [`Framing`] trait, so a length-prefixed strategy can replace it without
//! touching them.
//!
//! # Known limitations
//!
//! - A message larger than the buffer capacity is silently truncated to the
//!   first `capacity` bytes.
//! - A message split across several segments is cut at whatever the first
//!   read returns.
//! - A short write is neither detected nor retried.
//!
//! An empty message has no bytes to carry it, so [`SingleShot`] sends it by
//! shutting down the write half; the peer's single read then returns empty.

use std::io;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use enclave_core::defaults::DEFAULT_BUFFER_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// How one message is read from or written to a connection.
#[async_trait]
pub trait Framing: Clone + Send + Sync + 'static {
    /// Read one message. An empty result means the peer closed first.
    async fn read_message<S>(&self, stream: &mut S) -> io::Result<Bytes>
    where
        S: AsyncRead + Unpin + Send;

    /// Write one message, returning how many bytes the stream accepted.
    async fn write_message<S>(&self, stream: &mut S, message: &[u8]) -> io::Result<usize>
    where
        S: AsyncWrite + Unpin + Send;
}

/// One read into a fixed-capacity buffer, one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleShot {
    capacity: usize,
}

impl SingleShot {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for SingleShot {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

#[async_trait]
impl Framing for SingleShot {
    async fn read_message<S>(&self, stream: &mut S) -> io::Result<Bytes>
    where
        S: AsyncRead + Unpin + Send,
    {
        let mut buf = BytesMut::zeroed(self.capacity);
        let n = stream.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    async fn write_message<S>(&self, stream: &mut S, message: &[u8]) -> io::Result<usize>
    where
        S: AsyncWrite + Unpin + Send,
    {
        if message.is_empty() {
            stream.shutdown().await?;
            return Ok(0);
        }
        let n = stream.write(message).await?;
        stream.flush().await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn empty_message_ends_the_peer_read() {
        let (mut a, mut b) = duplex(1024);
        let framing = SingleShot::default();
        assert_eq!(framing.write_message(&mut a, b"").await.unwrap(), 0);

        let read = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            framing.read_message(&mut b),
        )
        .await
        .expect("peer read must not wait for more data")
        .unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn short_message_is_read_as_is() {
        let (mut a, mut b) = duplex(16 * 1024);
        a.write_all(b"hello\n").await.unwrap();
        let msg = SingleShot::default().read_message(&mut b).await.unwrap();
        assert_eq!(&msg[..], b"hello\n");
    }

    #[tokio::test]
    async fn message_at_capacity_is_not_truncated() {
        let (mut a, mut b) = duplex(16 * 1024);
        let payload = vec![b'x'; 4096];
        a.write_all(&payload).await.unwrap();
        let msg = SingleShot::default().read_message(&mut b).await.unwrap();
        assert_eq!(msg.len(), 4096);
        assert_eq!(&msg[..], &payload[..]);
    }

    #[tokio::test]
    async fn message_over_capacity_is_truncated() {
        let (mut a, mut b) = duplex(16 * 1024);
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        a.write_all(&payload).await.unwrap();
        let framing = SingleShot::default();

        let first = framing.read_message(&mut b).await.unwrap();
        assert_eq!(first.len(), 4096);
        assert_eq!(&first[..], &payload[..4096]);

        // The tail is left unread on the stream; nobody asks for it.
        let rest = framing.read_message(&mut b).await.unwrap();
        assert_eq!(&rest[..], &payload[4096..]);
    }

    #[tokio::test]
    async fn closed_peer_reads_empty() {
        let (a, mut b) = duplex(64);
        drop(a);
        let msg = SingleShot::new(8).read_message(&mut b).await.unwrap();
        assert!(msg.is_empty());
    }

    #[tokio::test]
    async fn write_is_a_single_call() {
        let (mut a, mut b) = duplex(4);
        let written = SingleShot::default()
            .write_message(&mut a, b"0123456789")
            .await
            .unwrap();
        // The duplex only had room for 4 bytes; the rest is dropped, not retried.
        assert_eq!(written, 4);
        drop(a);
        let mut got = Vec::new();
        b.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, b"0123");
    }
}
