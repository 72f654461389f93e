//! Relay endpoint: bind, accept, one Exchange per connection.
//!
//! Every accepted connection gets its own task that reads one request,
//! runs the endpoint's [`ExchangeHandler`], writes one reply and closes.
//! The accept loop never waits for an Exchange and survives accept errors,
//! handler errors and handler panics.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use enclave_core::ChannelAddr;
use enclave_core::defaults::DEFAULT_LISTEN_BACKLOG;
use enclave_transport::{ChannelListener, ChannelStream, ChannelTransport};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::bind::{BindPolicy, bind_with_retry};
use crate::error::RelayError;
use crate::exchange::ExchangeHandler;
use crate::framing::{Framing, SingleShot};

/// Which hop an endpoint plays in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Inner,
    Outer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Inner => f.write_str("inner"),
            Role::Outer => f.write_str("outer"),
        }
    }
}

pub struct RelayEndpoint<T, H, F = SingleShot> {
    role: Role,
    transport: T,
    addr: ChannelAddr,
    backlog: u32,
    bind_policy: BindPolicy,
    handler: Arc<H>,
    framing: F,
}

impl<T, H> RelayEndpoint<T, H>
where
    T: ChannelTransport,
    H: ExchangeHandler,
{
    pub fn new(role: Role, transport: T, addr: ChannelAddr, handler: H) -> Self {
        Self {
            role,
            transport,
            addr,
            backlog: DEFAULT_LISTEN_BACKLOG,
            bind_policy: BindPolicy::default(),
            handler: Arc::new(handler),
            framing: SingleShot::default(),
        }
    }
}

impl<T, H, F> RelayEndpoint<T, H, F>
where
    T: ChannelTransport,
    H: ExchangeHandler,
    F: Framing,
{
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn with_bind_policy(mut self, policy: BindPolicy) -> Self {
        self.bind_policy = policy;
        self
    }

    pub fn with_framing<G: Framing>(self, framing: G) -> RelayEndpoint<T, H, G> {
        RelayEndpoint {
            role: self.role,
            transport: self.transport,
            addr: self.addr,
            backlog: self.backlog,
            bind_policy: self.bind_policy,
            handler: self.handler,
            framing,
        }
    }

    /// Bind the endpoint address, retrying contended binds.
    pub async fn bind_and_listen(&self) -> Result<T::Listener, RelayError> {
        bind_with_retry(&self.transport, self.addr, self.backlog, self.bind_policy).await
    }

    /// Bind, then serve until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), RelayError> {
        let listener = self.bind_and_listen().await?;
        info!(role = %self.role, addr = %self.addr, "relay endpoint listening");
        self.serve(listener, shutdown).await
    }

    /// Accept connections on an already bound listener until `shutdown`.
    ///
    /// In-flight Exchanges are not awaited on shutdown.
    pub async fn serve<L>(&self, mut listener: L, shutdown: CancellationToken) -> Result<(), RelayError>
    where
        L: ChannelListener,
    {
        let mut conn_id: u64 = 0;
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(role = %self.role, "shutdown signal received, stopping accept loop");
                    break;
                }

                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            let err = RelayError::Accept(err);
                            warn!(role = %self.role, error = %err, "accept failed");
                            continue;
                        }
                    };

                    conn_id += 1;
                    debug!(role = %self.role, conn = conn_id, peer = %peer, "new connection");

                    let handler = self.handler.clone();
                    let framing = self.framing.clone();
                    tokio::spawn(
                        async move {
                            handle_exchange(stream, handler.as_ref(), &framing).await;
                        }
                        .instrument(info_span!("exchange", role = %self.role, conn = conn_id, peer = %peer)),
                    );
                }
            }
        }

        info!(role = %self.role, "relay endpoint stopped");
        Ok(())
    }
}

/// Run one Exchange on an accepted stream and close it.
///
/// On a handler error nothing is written back; the caller sees the
/// connection close.
pub async fn handle_exchange<S, H, F>(mut stream: S, handler: &H, framing: &F)
where
    S: ChannelStream,
    H: ExchangeHandler + ?Sized,
    F: Framing,
{
    let start = Instant::now();

    let request = match framing.read_message(&mut stream).await {
        Ok(request) => request,
        Err(err) => {
            let err = RelayError::Read(err);
            warn!(error = %err, error_type = err.error_type(), "exchange failed");
            return;
        }
    };
    let read_us = start.elapsed().as_micros() as u64;
    debug!(bytes = request.len(), read_us, "request received");

    let downstream = Instant::now();
    let reply = match handler.exchange(request).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(
                error = %err,
                error_type = err.error_type(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "exchange failed"
            );
            return;
        }
    };
    let downstream_us = downstream.elapsed().as_micros() as u64;

    let write = Instant::now();
    match framing.write_message(&mut stream, &reply).await {
        Ok(written) => {
            if written < reply.len() {
                debug!(written, expected = reply.len(), "short write");
            }
            debug!(
                bytes = written,
                read_us,
                downstream_us,
                write_us = write.elapsed().as_micros() as u64,
                total_us = start.elapsed().as_micros() as u64,
                "exchange completed"
            );
        }
        Err(err) => {
            let err = RelayError::Write(err);
            warn!(error = %err, error_type = err.error_type(), "exchange failed");
        }
    }
}
