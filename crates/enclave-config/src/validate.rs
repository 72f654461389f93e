//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.inner.port == 0 {
        return Err(ConfigError::Validation("inner.port must be > 0".into()));
    }
    if config.outer.port == 0 {
        return Err(ConfigError::Validation("outer.port must be > 0".into()));
    }
    if config.inner_addr() == config.outer_addr() {
        return Err(ConfigError::Validation(format!(
            "inner and outer relays share the address {}",
            config.inner_addr()
        )));
    }
    if config.relay.backlog == 0 {
        return Err(ConfigError::Validation("relay.backlog must be > 0".into()));
    }
    if config.relay.buffer_size == 0 {
        return Err(ConfigError::Validation(
            "relay.buffer_size must be > 0".into(),
        ));
    }
    if config.relay.bind_attempts == 0 {
        return Err(ConfigError::Validation(
            "relay.bind_attempts must be > 0".into(),
        ));
    }
    if config.relay.tcp_host.trim().is_empty() {
        return Err(ConfigError::Validation("relay.tcp_host is empty".into()));
    }
    if config.kms.key_id.trim().is_empty() {
        return Err(ConfigError::Validation("kms.key_id is empty".into()));
    }
    let endpoint = config.kms.endpoint.trim();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ConfigError::Validation(
            "kms.endpoint must be an http:// or https:// URL".into(),
        ));
    }
    if config.kms.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "kms.timeout_secs must be > 0".into(),
        ));
    }
    if config.kms.verify_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "kms.verify_timeout_secs must be > 0".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(mutate: impl FnOnce(&mut Config)) -> String {
        let mut cfg = Config::default();
        mutate(&mut cfg);
        match validate_config(&cfg) {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        assert!(invalid(|c| c.outer.port = 0).contains("outer.port"));
        assert!(invalid(|c| c.relay.bind_attempts = 0).contains("bind_attempts"));
        assert!(invalid(|c| c.relay.buffer_size = 0).contains("buffer_size"));
        assert!(invalid(|c| c.kms.key_id = " ".into()).contains("key_id"));
        assert!(invalid(|c| c.kms.endpoint = "localhost:4566".into()).contains("endpoint"));
    }

    #[test]
    fn rejects_shared_address() {
        let msg = invalid(|c| {
            c.outer.cid = c.inner.cid;
            c.outer.port = c.inner.port;
        });
        assert!(msg.contains("3:9000"));
    }
}
