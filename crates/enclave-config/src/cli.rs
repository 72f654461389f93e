//! CLI override definitions and application logic.

use clap::Parser;

use crate::{Config, TransportKind};

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Transport backing the channel: vsock or tcp (loopback, for local runs)
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,
    /// Host used by the tcp transport
    #[arg(long)]
    pub tcp_host: Option<String>,
    /// Override inner relay context id
    #[arg(long)]
    pub inner_cid: Option<u32>,
    /// Override inner relay port
    #[arg(long)]
    pub inner_port: Option<u32>,
    /// Override outer relay context id
    #[arg(long)]
    pub outer_cid: Option<u32>,
    /// Override outer relay port
    #[arg(long)]
    pub outer_port: Option<u32>,
    /// Override listen backlog
    #[arg(long)]
    pub backlog: Option<u32>,
    /// Override read buffer capacity (bytes)
    #[arg(long)]
    pub buffer_size: Option<usize>,
    /// Override bind attempts before giving up
    #[arg(long)]
    pub bind_attempts: Option<u32>,
    /// Override pause between bind attempts (milliseconds)
    #[arg(long)]
    pub bind_backoff_ms: Option<u64>,
    /// Override KMS endpoint, e.g. http://localhost:4566
    #[arg(long)]
    pub kms_endpoint: Option<String>,
    /// Override KMS key reference, e.g. alias/dev-key
    #[arg(long)]
    pub kms_key_id: Option<String>,
    /// List KMS keys and aliases at startup
    #[arg(long)]
    pub kms_verify: Option<bool>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = overrides.transport {
        config.relay.transport = v;
    }
    if let Some(v) = &overrides.tcp_host {
        config.relay.tcp_host = v.clone();
    }
    if let Some(v) = overrides.inner_cid {
        config.inner.cid = v;
    }
    if let Some(v) = overrides.inner_port {
        config.inner.port = v;
    }
    if let Some(v) = overrides.outer_cid {
        config.outer.cid = v;
    }
    if let Some(v) = overrides.outer_port {
        config.outer.port = v;
    }
    if let Some(v) = overrides.backlog {
        config.relay.backlog = v;
    }
    if let Some(v) = overrides.buffer_size {
        config.relay.buffer_size = v;
    }
    if let Some(v) = overrides.bind_attempts {
        config.relay.bind_attempts = v;
    }
    if let Some(v) = overrides.bind_backoff_ms {
        config.relay.bind_backoff_ms = v;
    }
    if let Some(v) = &overrides.kms_endpoint {
        config.kms.endpoint = v.clone();
    }
    if let Some(v) = &overrides.kms_key_id {
        config.kms.key_id = v.clone();
    }
    if let Some(v) = overrides.kms_verify {
        config.kms.verify_on_startup = v;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut cfg = Config::default();
        let overrides = CliOverrides::parse_from([
            "test",
            "--transport",
            "tcp",
            "--outer-port",
            "8123",
            "--kms-key-id",
            "alias/other",
            "--kms-verify",
            "false",
        ]);
        apply_overrides(&mut cfg, &overrides);
        assert_eq!(cfg.relay.transport, TransportKind::Tcp);
        assert_eq!(cfg.outer.port, 8123);
        assert_eq!(cfg.outer.cid, 2);
        assert_eq!(cfg.kms.key_id, "alias/other");
        assert!(!cfg.kms.verify_on_startup);
        assert_eq!(cfg.inner.port, 9000);
    }
}
