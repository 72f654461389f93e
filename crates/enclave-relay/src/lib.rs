//! Relay chain between an enclave and the key-management backend.
//!
//! Three processes cooperate over a transport channel:
//! `Connector → Inner Relay (enclave) → Outer Relay (parent) → KMS`.
//!
//! # Architecture
//!
//! - **Connector**: reads lines from an operator and sends each one to the
//!   Inner Relay, printing the reply.
//! - **Inner Relay**: accepts a request, strips one trailing line ending and
//!   forwards it to the Outer Relay over a fresh connection.
//! - **Outer Relay**: accepts a request, encrypts it through the KMS and
//!   replies with the ciphertext.
//!
//! Every hop is one request and one reply per connection; nothing is reused.

pub mod bind;
pub mod cli;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod exchange;
pub mod forwarder;
pub mod framing;

pub use bind::{BindPolicy, bind_with_retry};
pub use cli::{ConnectArgs, InnerArgs, OuterArgs};
pub use connector::Connector;
pub use endpoint::{RelayEndpoint, Role, handle_exchange};
pub use error::RelayError;
pub use exchange::{EncryptHandler, ExchangeHandler, ForwardHandler, strip_line_ending};
pub use forwarder::Forwarder;
pub use framing::{Framing, SingleShot};
pub use tokio_util::sync::CancellationToken;
