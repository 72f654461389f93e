//! # enclave-rs
//!
//! A relay chain that lets code inside an isolated enclave reach a
//! key-management backend through its parent host.
//!
//! ## Crates
//!
//! - [`enclave_core`] - Channel addresses and default settings
//! - [`enclave_config`] - Configuration loading and validation
//! - [`enclave_transport`] - Transport channel (vsock and loopback TCP)
//! - [`enclave_kms`] - Key-management backend client
//! - [`enclave_relay`] - Relay endpoints, forwarder and connector

pub use enclave_config as config;
pub use enclave_core as core;
pub use enclave_kms as kms;
pub use enclave_relay as relay;
pub use enclave_transport as transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use enclave_config::Config;
    pub use enclave_core::ChannelAddr;
    pub use enclave_kms::{Encryptor, KmsClient};
    pub use enclave_relay::{
        CancellationToken, Connector, EncryptHandler, ExchangeHandler, ForwardHandler, Forwarder,
        RelayEndpoint, RelayError, Role,
    };
    pub use enclave_transport::{ChannelListener, ChannelTransport};
}
