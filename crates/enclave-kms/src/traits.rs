//! Encryption backend trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KmsError;

/// Something that turns plaintext into a backend-encoded ciphertext string.
///
/// Implementations must be thread-safe (`Send + Sync`) as they may be
/// called concurrently from multiple connections.
#[async_trait]
pub trait Encryptor: Send + Sync {
    /// Encrypt `plaintext` under the implementation's fixed key reference.
    ///
    /// The returned string is passed back to the caller verbatim.
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, KmsError>;
}

/// Blanket implementation for `Arc<E>` where `E: Encryptor`.
#[async_trait]
impl<E: Encryptor + ?Sized> Encryptor for Arc<E> {
    #[inline]
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, KmsError> {
        (**self).encrypt(plaintext).await
    }
}
