//! Interactive client at the head of the chain.

use std::time::Instant;

use enclave_core::ChannelAddr;
use enclave_core::defaults::{CONNECTOR_PROMPT, EXIT_SENTINEL};
use enclave_transport::ChannelTransport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::forwarder::Forwarder;
use crate::framing::{Framing, SingleShot};

/// Reads lines from an operator and sends each one to the Inner Relay.
pub struct Connector<T, F = SingleShot> {
    forwarder: Forwarder<T, F>,
    target: ChannelAddr,
}

impl<T: ChannelTransport, F: Framing> Connector<T, F> {
    pub fn new(forwarder: Forwarder<T, F>, target: ChannelAddr) -> Self {
        Self { forwarder, target }
    }

    /// One request/reply with the Inner Relay. The line is sent unmodified.
    pub async fn round_trip(&self, line: &[u8]) -> Result<String, RelayError> {
        let start = Instant::now();
        let reply = self.forwarder.call(self.target, line).await?;
        debug!(
            sent = line.len(),
            received = reply.len(),
            total_ms = start.elapsed().as_millis() as u64,
            "round trip completed"
        );
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Prompt, read a line, forward it, print the reply; repeat.
    ///
    /// Stops on end of input or on a line that is exactly `exit`. A failed
    /// round trip is logged and the loop continues with the next prompt.
    pub async fn run<R, W>(&self, mut input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();
        loop {
            output.write_all(CONNECTOR_PROMPT.as_bytes()).await?;
            output.flush().await?;

            line.clear();
            if input.read_until(b'\n', &mut line).await? == 0 {
                debug!("end of input");
                break;
            }
            if line == EXIT_SENTINEL.as_bytes() {
                break;
            }

            match self.round_trip(&line).await {
                Ok(reply) => {
                    output
                        .write_all(format!("Encrypted result: {reply}\n").as_bytes())
                        .await?;
                }
                Err(err) => {
                    warn!(target_addr = %self.target, error = %err, error_type = err.error_type(), "request failed");
                }
            }
        }

        info!("connector exiting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use enclave_transport::ChannelListener;
    use enclave_transport::tcp::TcpTransport;
    use tokio::io::{AsyncReadExt, BufReader};

    use super::*;

    fn connector(target: ChannelAddr) -> Connector<TcpTransport> {
        Connector::new(Forwarder::new(TcpTransport::loopback()), target)
    }

    #[tokio::test]
    async fn exit_makes_no_request() {
        let transport = TcpTransport::loopback();
        let mut listener = transport.bind(ChannelAddr::new(3, 0), 8).unwrap();
        let target = listener.local_addr().unwrap();

        let mut out = Vec::new();
        connector(target)
            .run(BufReader::new(&b"exit\n"[..]), &mut out)
            .await
            .unwrap();
        assert_eq!(out, CONNECTOR_PROMPT.as_bytes());

        let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err(), "connector must not connect on exit");
    }

    #[tokio::test]
    async fn exit_needs_exact_line() {
        let transport = TcpTransport::loopback();
        let mut listener = transport.bind(ChannelAddr::new(3, 0), 8).unwrap();
        let target = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"exit now\n");
            stream.write_all(b"ok").await.unwrap();
        });

        let mut out = Vec::new();
        connector(target)
            .run(BufReader::new(&b"exit now\n"[..]), &mut out)
            .await
            .unwrap();
        server.await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Encrypted result: ok\n"), "output: {out}");
    }

    #[tokio::test]
    async fn failed_round_trip_keeps_prompting() {
        let transport = TcpTransport::loopback();
        let listener = transport.bind(ChannelAddr::new(3, 0), 8).unwrap();
        let target = listener.local_addr().unwrap();
        drop(listener);

        let mut out = Vec::new();
        connector(target)
            .run(BufReader::new(&b"one\ntwo\nexit\n"[..]), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches(CONNECTOR_PROMPT).count(), 3);
        assert!(!out.contains("Encrypted result"));
    }
}
