//! Listener setup with bounded bind retries.
//!
//! A relay killed without cleanup can keep its address for a moment, so a
//! restarted endpoint retries the bind a fixed number of times. Each attempt
//! asks the transport for a brand-new socket; the failed one is dropped.
//!
//! ```text
//! Idle(n) --bind ok--------------------------> Bound
//! Idle(n) --contention, n < attempts---------> Backoff(n) --sleep--> Idle(n + 1)
//! Idle(n) --contention, n = attempts---------> Exhausted
//! Idle(n) --socket/listen failure------------> Fatal
//! ```

use std::time::Duration;

use enclave_config::RelayConfig;
use enclave_core::ChannelAddr;
use enclave_core::defaults::{DEFAULT_BIND_ATTEMPTS, DEFAULT_BIND_BACKOFF_MS};
use enclave_transport::{ChannelTransport, TransportError};
use tracing::{info, warn};

use crate::error::RelayError;

/// How often and how patiently to retry a contended bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindPolicy {
    /// Total attempts, including the first one. Treated as at least 1.
    pub attempts: u32,
    /// Pause after each failed attempt.
    pub backoff: Duration,
}

impl BindPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    pub fn from_config(relay: &RelayConfig) -> Self {
        Self::new(relay.bind_attempts, Duration::from_millis(relay.bind_backoff_ms))
    }
}

impl Default for BindPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_BIND_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BIND_BACKOFF_MS),
        }
    }
}

enum BindState<L> {
    Idle { attempt: u32 },
    Backoff { attempt: u32, error: TransportError },
    Bound(L),
    Exhausted { attempts: u32, error: TransportError },
    Fatal(TransportError),
}

/// Bind and listen on `addr`, retrying contended binds per `policy`.
pub async fn bind_with_retry<T>(
    transport: &T,
    addr: ChannelAddr,
    backlog: u32,
    policy: BindPolicy,
) -> Result<T::Listener, RelayError>
where
    T: ChannelTransport,
{
    let max = policy.attempts.max(1);
    let mut state = BindState::Idle { attempt: 1 };

    loop {
        state = match state {
            BindState::Idle { attempt } => match transport.bind(addr, backlog) {
                Ok(listener) => BindState::Bound(listener),
                Err(error) if !error.is_bind_contention() => BindState::Fatal(error),
                Err(error) if attempt < max => BindState::Backoff { attempt, error },
                Err(error) => BindState::Exhausted {
                    attempts: attempt,
                    error,
                },
            },
            BindState::Backoff { attempt, error } => {
                warn!(
                    %addr,
                    attempt,
                    max,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %error,
                    "bind failed, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                BindState::Idle {
                    attempt: attempt + 1,
                }
            }
            BindState::Bound(listener) => {
                info!(%addr, backlog, "bound");
                return Ok(listener);
            }
            BindState::Exhausted { attempts, error } => {
                return Err(RelayError::BindExhausted {
                    addr,
                    attempts,
                    source: error,
                });
            }
            BindState::Fatal(error) => {
                return Err(RelayError::Socket {
                    addr,
                    source: error,
                });
            }
        };
    }
}
