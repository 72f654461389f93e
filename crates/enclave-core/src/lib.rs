//! Core types and constants shared across enclave crates.
//!
//! This crate provides:
//! - Default configuration values
//! - The [`ChannelAddr`] address type for the transport channel
//! - Error type constants for logging

pub mod addr;
pub mod defaults;
pub mod errors;

// Re-export commonly used items at crate root
pub use addr::ChannelAddr;
pub use defaults::*;
pub use errors::*;
