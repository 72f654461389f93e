//! Configuration loading and CLI definitions.
//!
//! Every field has a default, so a relay process can start without any
//! configuration file. Values are layered: file, then environment
//! ([`apply_env_overrides`]), then command line ([`apply_overrides`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use enclave_core::ChannelAddr;

mod cli;
mod defaults;
mod env;
mod loader;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use env::{apply_env_overrides, apply_process_env};
pub use loader::{ConfigError, load_config, load_or_default};
pub use validate::validate_config;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inner: InnerConfig,
    #[serde(default)]
    pub outer: OuterConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub kms: KmsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Address the inner relay listens on, and the connector dials.
    pub fn inner_addr(&self) -> ChannelAddr {
        ChannelAddr::new(self.inner.cid, self.inner.port)
    }

    /// Address the outer relay listens on, and the inner relay dials.
    pub fn outer_addr(&self) -> ChannelAddr {
        ChannelAddr::new(self.outer.cid, self.outer.port)
    }
}

/// Inner relay (enclave side) listening address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnerConfig {
    #[serde(default = "default_inner_cid")]
    pub cid: u32,
    #[serde(default = "default_inner_port")]
    pub port: u32,
}

impl Default for InnerConfig {
    fn default() -> Self {
        Self {
            cid: default_inner_cid(),
            port: default_inner_port(),
        }
    }
}

/// Outer relay (parent side) listening address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuterConfig {
    #[serde(default = "default_outer_cid")]
    pub cid: u32,
    #[serde(default = "default_outer_port")]
    pub port: u32,
}

impl Default for OuterConfig {
    fn default() -> Self {
        Self {
            cid: default_outer_cid(),
            port: default_outer_port(),
        }
    }
}

/// Which socket family carries the transport channel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// AF_VSOCK sockets (Linux hypervisor sockets).
    #[default]
    Vsock,
    /// Loopback TCP; the port is kept and the context id is ignored.
    Tcp,
}

/// Settings shared by both relay endpoints and the connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub transport: TransportKind,
    /// Host used when `transport = "tcp"`.
    #[serde(default = "default_tcp_host")]
    pub tcp_host: String,
    /// Listen backlog.
    #[serde(default = "default_listen_backlog")]
    pub backlog: u32,
    /// Capacity of the single read per request or reply.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Bind attempts before startup fails.
    #[serde(default = "default_bind_attempts")]
    pub bind_attempts: u32,
    /// Pause between bind attempts (milliseconds).
    #[serde(default = "default_bind_backoff_ms")]
    pub bind_backoff_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            tcp_host: default_tcp_host(),
            backlog: default_listen_backlog(),
            buffer_size: default_buffer_size(),
            bind_attempts: default_bind_attempts(),
            bind_backoff_ms: default_bind_backoff_ms(),
        }
    }
}

/// Key-management backend settings used by the outer relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmsConfig {
    /// Base URL; requests go to `{endpoint}/kms`.
    #[serde(default = "default_kms_endpoint")]
    pub endpoint: String,
    /// Key reference (id, ARN or `alias/...`).
    #[serde(default = "default_kms_key_id")]
    pub key_id: String,
    #[serde(default = "default_kms_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_kms_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
    /// List keys and aliases at startup for diagnostics.
    #[serde(default = "default_kms_verify_on_startup")]
    pub verify_on_startup: bool,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_kms_endpoint(),
            key_id: default_kms_key_id(),
            timeout_secs: default_kms_timeout_secs(),
            verify_timeout_secs: default_kms_verify_timeout_secs(),
            verify_on_startup: default_kms_verify_on_startup(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"enclave_kms": "debug", "hyper": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.inner_addr(), ChannelAddr::new(3, 9000));
        assert_eq!(cfg.outer_addr(), ChannelAddr::new(2, 8000));
        assert_eq!(cfg.relay.transport, TransportKind::Vsock);
        assert_eq!(cfg.relay.backlog, 128);
        assert_eq!(cfg.relay.buffer_size, 4096);
        assert_eq!(cfg.relay.bind_attempts, 5);
        assert_eq!(cfg.relay.bind_backoff_ms, 2000);
        assert_eq!(cfg.kms.endpoint, "http://localhost:4566");
        assert_eq!(cfg.kms.key_id, "alias/dev-key");
        assert_eq!(cfg.kms.timeout_secs, 10);
        assert_eq!(cfg.kms.verify_timeout_secs, 5);
        assert!(cfg.kms.verify_on_startup);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[outer]
port = 8500

[relay]
transport = "tcp"
bind_attempts = 2

[kms]
key_id = "alias/prod"

[logging]
level = "debug"
filters = { enclave_kms = "trace" }
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.outer_addr(), ChannelAddr::new(2, 8500));
        assert_eq!(cfg.inner_addr(), ChannelAddr::new(3, 9000));
        assert_eq!(cfg.relay.transport, TransportKind::Tcp);
        assert_eq!(cfg.relay.bind_attempts, 2);
        assert_eq!(cfg.relay.bind_backoff_ms, 2000);
        assert_eq!(cfg.kms.key_id, "alias/prod");
        assert_eq!(cfg.kms.endpoint, "http://localhost:4566");
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
        assert_eq!(cfg.logging.filters["enclave_kms"], "trace");
    }
}
