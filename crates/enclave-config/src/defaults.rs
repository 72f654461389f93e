//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `enclave_core::defaults`.

use enclave_core::defaults;

/// Generate default value functions that forward to enclave_core::defaults constants.
macro_rules! default_fns {
    // For Copy types (integers, bool, etc.)
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_inner_cid               => DEFAULT_INNER_CID: u32,
    default_inner_port              => DEFAULT_INNER_PORT: u32,
    default_outer_cid               => DEFAULT_OUTER_CID: u32,
    default_outer_port              => DEFAULT_OUTER_PORT: u32,
    default_listen_backlog          => DEFAULT_LISTEN_BACKLOG: u32,
    default_buffer_size             => DEFAULT_BUFFER_SIZE: usize,
    default_bind_attempts           => DEFAULT_BIND_ATTEMPTS: u32,
    default_bind_backoff_ms         => DEFAULT_BIND_BACKOFF_MS: u64,
    default_kms_timeout_secs        => DEFAULT_KMS_TIMEOUT_SECS: u64,
    default_kms_verify_timeout_secs => DEFAULT_KMS_VERIFY_TIMEOUT_SECS: u64,
    default_kms_verify_on_startup   => DEFAULT_KMS_VERIFY_ON_STARTUP: bool,
}

default_string_fns! {
    default_tcp_host     => DEFAULT_TCP_HOST,
    default_kms_endpoint => DEFAULT_KMS_ENDPOINT,
    default_kms_key_id   => DEFAULT_KMS_KEY_ID,
}
