//! Key-management backend adapter.
//!
//! Turns a plaintext payload into ciphertext through the KMS JSON API
//! (`POST {endpoint}/kms`, `X-Amz-Target: TrentService.Encrypt`).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use enclave_kms::{Encryptor, KmsClient};
//!
//! # async fn example() -> Result<(), enclave_kms::KmsError> {
//! let kms = KmsClient::new(
//!     "http://localhost:4566",
//!     "alias/dev-key",
//!     Duration::from_secs(10),
//!     Duration::from_secs(5),
//! )?;
//! let ciphertext = kms.encrypt(b"hello").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod traits;

pub use client::{AliasEntry, KeyInventory, KmsClient};
pub use error::KmsError;
pub use traits::Encryptor;
