//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Well-known Channel Addresses
// ============================================================================

/// Context id the inner relay listens on (the enclave).
pub const DEFAULT_INNER_CID: u32 = 3;
/// Port the inner relay listens on.
pub const DEFAULT_INNER_PORT: u32 = 9000;
/// Context id the outer relay listens on (the parent instance).
pub const DEFAULT_OUTER_CID: u32 = 2;
/// Port the outer relay listens on.
pub const DEFAULT_OUTER_PORT: u32 = 8000;
/// Context id reported for peers reached through the loopback TCP backend.
pub const LOOPBACK_CID: u32 = 1;

// ============================================================================
// Listener Defaults
// ============================================================================

/// Default listen backlog.
pub const DEFAULT_LISTEN_BACKLOG: u32 = 128;
/// Default number of bind attempts before startup fails.
pub const DEFAULT_BIND_ATTEMPTS: u32 = 5;
/// Default pause between bind attempts in milliseconds.
pub const DEFAULT_BIND_BACKOFF_MS: u64 = 2000;
/// Default host used by the loopback TCP transport.
pub const DEFAULT_TCP_HOST: &str = "127.0.0.1";

// ============================================================================
// Buffer/Size Defaults
// ============================================================================

/// Capacity of the single read performed per request or reply.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

// ============================================================================
// Key-management Backend Defaults
// ============================================================================

/// Default KMS endpoint (a local emulator).
pub const DEFAULT_KMS_ENDPOINT: &str = "http://localhost:4566";
/// Default key reference.
pub const DEFAULT_KMS_KEY_ID: &str = "alias/dev-key";
/// Encrypt call timeout in seconds.
pub const DEFAULT_KMS_TIMEOUT_SECS: u64 = 10;
/// Startup diagnostics timeout in seconds.
pub const DEFAULT_KMS_VERIFY_TIMEOUT_SECS: u64 = 5;
/// Whether the outer relay lists keys and aliases at startup.
pub const DEFAULT_KMS_VERIFY_ON_STARTUP: bool = true;
/// Path appended to the KMS endpoint.
pub const KMS_PATH: &str = "/kms";
/// Content type of the KMS JSON protocol.
pub const KMS_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
/// Target header name selecting the KMS operation.
pub const KMS_TARGET_HEADER: &str = "X-Amz-Target";
/// Encrypt operation.
pub const KMS_TARGET_ENCRYPT: &str = "TrentService.Encrypt";
/// ListKeys operation.
pub const KMS_TARGET_LIST_KEYS: &str = "TrentService.ListKeys";
/// ListAliases operation.
pub const KMS_TARGET_LIST_ALIASES: &str = "TrentService.ListAliases";

// ============================================================================
// Environment
// ============================================================================

/// Environment variable overriding the KMS endpoint.
pub const ENV_KMS_TARGET: &str = "KMS_TARGET";
/// Environment variable overriding the outer relay port.
pub const ENV_VSOCK_PORT: &str = "VSOCK_PORT";

// ============================================================================
// Connector
// ============================================================================

/// Line that ends the interactive connector loop.
pub const EXIT_SENTINEL: &str = "exit\n";
/// Prompt printed before each line is read.
pub const CONNECTOR_PROMPT: &str = "Enter text to encrypt (or type exit): ";
