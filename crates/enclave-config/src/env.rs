//! Environment variable overrides.
//!
//! `KMS_TARGET` replaces the KMS endpoint. `VSOCK_PORT` replaces the outer
//! relay port; a value that is not a port number is reported and ignored.

use enclave_core::defaults::{ENV_KMS_TARGET, ENV_VSOCK_PORT};
use tracing::warn;

use crate::Config;

/// Apply overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(target) = lookup(ENV_KMS_TARGET).filter(|v| !v.is_empty()) {
        config.kms.endpoint = target;
    }
    if let Some(port) = lookup(ENV_VSOCK_PORT).filter(|v| !v.is_empty()) {
        match port.trim().parse::<u32>() {
            Ok(p) => config.outer.port = p,
            Err(_) => warn!(
                value = %port,
                port = config.outer.port,
                "invalid {ENV_VSOCK_PORT}, keeping configured port"
            ),
        }
    }
}

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut Config) {
    apply_env_overrides(config, |key| std::env::var(key).ok());
}
