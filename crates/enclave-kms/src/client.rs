//! HTTP client for the KMS JSON protocol.
//!
//! Every call is a `POST {endpoint}/kms` with content type
//! `application/x-amz-json-1.1`; the operation is selected by the
//! `X-Amz-Target` header.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use enclave_core::defaults::{
    KMS_CONTENT_TYPE, KMS_PATH, KMS_TARGET_ENCRYPT, KMS_TARGET_HEADER, KMS_TARGET_LIST_ALIASES,
    KMS_TARGET_LIST_KEYS,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, trace, warn};

use crate::error::KmsError;
use crate::traits::Encryptor;

// ── KmsClient ─────────────────────────────────────────────────────

/// KMS backend with a fixed key reference.
#[derive(Debug, Clone)]
pub struct KmsClient {
    client: Client,
    verify_client: Client,
    url: String,
    key_id: String,
}

/// Keys and aliases reported by the backend at startup.
///
/// A listing the backend refused or answered with garbage stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInventory {
    pub keys: Vec<String>,
    pub aliases: Vec<AliasEntry>,
}

/// One alias and the key it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub target_key_id: String,
}

impl KmsClient {
    /// Create a client for `endpoint` (e.g. `http://localhost:4566`).
    ///
    /// `timeout` bounds each encrypt call, `verify_timeout` each diagnostic
    /// listing made by [`verify_configuration`](Self::verify_configuration).
    pub fn new(
        endpoint: impl Into<String>,
        key_id: impl Into<String>,
        timeout: Duration,
        verify_timeout: Duration,
    ) -> Result<Self, KmsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KmsError::Http(format!("failed to build HTTP client: {e}")))?;
        let verify_client = Client::builder()
            .timeout(verify_timeout)
            .build()
            .map_err(|e| KmsError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_clients(client, verify_client, endpoint, key_id))
    }

    /// Create with custom reqwest [`Client`]s (for proxies, TLS roots, etc.).
    pub fn with_clients(
        client: Client,
        verify_client: Client,
        endpoint: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        let base = endpoint.trim_end_matches('/');
        Self {
            client,
            verify_client,
            url: format!("{base}{KMS_PATH}"),
            key_id: key_id.into(),
        }
    }

    /// Full request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Key reference used for every encrypt call.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// POST `body` as operation `target`; returns the status and raw body.
    async fn post<Req: Serialize + ?Sized>(
        &self,
        client: &Client,
        target: &str,
        body: &Req,
    ) -> Result<(u16, String), KmsError> {
        let body = serde_json::to_vec(body).map_err(KmsError::http)?;
        let resp = client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, KMS_CONTENT_TYPE)
            .header(KMS_TARGET_HEADER, target)
            .body(body)
            .send()
            .await
            .map_err(|e| KmsError::Http(format!("{target} request to {} failed: {e}", self.url)))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| KmsError::Http(format!("failed to read {target} response: {e}")))?;
        Ok((status, text))
    }

    /// List available keys and aliases, logging what the backend reports.
    ///
    /// Only transport failures are errors; a refused or malformed listing is
    /// logged and left empty in the returned inventory.
    pub async fn verify_configuration(&self) -> Result<KeyInventory, KmsError> {
        let mut inventory = KeyInventory::default();

        let (status, body) = self
            .post(&self.verify_client, KMS_TARGET_LIST_KEYS, &wire::Empty {})
            .await?;
        if let Some(keys) = parse_listing::<wire::ListKeysResponse>("keys", status, &body) {
            info!(count = keys.keys.len(), "available KMS keys");
            for (i, key) in keys.keys.into_iter().enumerate() {
                info!(index = i + 1, key_id = %key.key_id, "KMS key");
                inventory.keys.push(key.key_id);
            }
        }

        let (status, body) = self
            .post(&self.verify_client, KMS_TARGET_LIST_ALIASES, &wire::Empty {})
            .await?;
        if let Some(aliases) = parse_listing::<wire::ListAliasesResponse>("aliases", status, &body) {
            info!(count = aliases.aliases.len(), "available KMS aliases");
            for (i, alias) in aliases.aliases.into_iter().enumerate() {
                info!(
                    index = i + 1,
                    alias = %alias.alias_name,
                    target = %alias.target_key_id,
                    "KMS alias"
                );
                inventory.aliases.push(AliasEntry {
                    name: alias.alias_name,
                    target_key_id: alias.target_key_id,
                });
            }
        }

        Ok(inventory)
    }
}

fn parse_listing<T: DeserializeOwned>(what: &str, status: u16, body: &str) -> Option<T> {
    if status != 200 {
        warn!(status, body = %body, "failed to list {what}");
        return None;
    }
    match serde_json::from_str(body) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(error = %e, "failed to parse {what} response");
            None
        }
    }
}

#[async_trait]
impl Encryptor for KmsClient {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<String, KmsError> {
        let req = wire::EncryptRequest {
            key_id: &self.key_id,
            plaintext: STANDARD.encode(plaintext),
        };
        trace!(plaintext_b64 = %req.plaintext, "encrypt request");

        let (status, body) = self.post(&self.client, KMS_TARGET_ENCRYPT, &req).await?;
        if !(200..300).contains(&status) {
            return Err(KmsError::Backend { status, body });
        }
        trace!(body = %body, "encrypt response");

        let resp: wire::EncryptResponse =
            serde_json::from_str(&body).map_err(|e| KmsError::Decode(e.to_string()))?;
        debug!(key_id = %resp.key_id, ciphertext_len = resp.ciphertext_blob.len(), "KMS encrypt ok");
        Ok(resp.ciphertext_blob)
    }
}

// ── Wire types (KMS JSON 1.1 protocol) ────────────────────────────

mod wire {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize)]
    pub struct Empty {}

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct EncryptRequest<'a> {
        pub key_id: &'a str,
        pub plaintext: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct EncryptResponse {
        pub ciphertext_blob: String,
        #[serde(default)]
        pub key_id: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ListKeysResponse {
        #[serde(default)]
        pub keys: Vec<KeyListEntry>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct KeyListEntry {
        pub key_id: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ListAliasesResponse {
        #[serde(default)]
        pub aliases: Vec<AliasListEntry>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct AliasListEntry {
        pub alias_name: String,
        #[serde(default)]
        pub target_key_id: String,
    }
}
