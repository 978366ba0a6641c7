//! OIDC provider metadata, fetched from the discovery document on first use
//! and kept for the life of the process.

use std::sync::Arc;

use http::header::ACCEPT;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{BridgeError, describe_json_error, describe_reqwest_error};

/// The subset of the provider's discovery document the bridge needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
}

/// Populate-on-demand cache for [`ProviderMetadata`].
///
/// Concurrent first callers may each fetch the document; whichever finishes
/// last wins, which is harmless since every fetch reads the same document.
/// The lock is only held to read or swap the cached value, never across the fetch.
/// A failed fetch leaves the cache empty so the next caller tries again.
pub struct ProviderMetadataCache {
    http: reqwest::Client,
    discovery_url: Url,
    cached: RwLock<Option<Arc<ProviderMetadata>>>,
}

impl ProviderMetadataCache {
    pub fn new(http: reqwest::Client, discovery_url: Url) -> Self {
        Self {
            http,
            discovery_url,
            cached: RwLock::new(None),
        }
    }

    /// A cache that never needs to fetch, for tests and static provider setups.
    pub fn with_metadata(
        http: reqwest::Client,
        discovery_url: Url,
        metadata: ProviderMetadata,
    ) -> Self {
        Self {
            http,
            discovery_url,
            cached: RwLock::new(Some(Arc::new(metadata))),
        }
    }

    pub async fn get_provider_metadata(&self) -> Result<Arc<ProviderMetadata>, BridgeError> {
        if let Some(metadata) = self.cached.read().await.clone() {
            return Ok(metadata);
        }

        let fetched = Arc::new(self.fetch().await.inspect_err(|err| {
            warn!(discovery_url = %self.discovery_url, error = %err, "OIDC discovery failed");
        })?);
        // A concurrent caller may have filled the slot while we were fetching; keep theirs.
        let metadata = self
            .cached
            .write()
            .await
            .get_or_insert(fetched)
            .clone();

        info!(
            authorization_endpoint = %metadata.authorization_endpoint,
            token_endpoint = %metadata.token_endpoint,
            "Cached OIDC provider metadata"
        );
        Ok(metadata)
    }

    pub async fn is_populated(&self) -> bool {
        self.cached.read().await.is_some()
    }

    async fn fetch(&self) -> Result<ProviderMetadata, BridgeError> {
        debug!(discovery_url = %self.discovery_url, "Fetching OIDC discovery document");

        let response = self
            .http
            .get(self.discovery_url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                BridgeError::Configuration(format!(
                    "Discovery document {}",
                    describe_reqwest_error(err)
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Configuration(format!(
                "Discovery endpoint returned HTTP {status}"
            )));
        }

        let body = response.bytes().await.map_err(|err| {
            BridgeError::Configuration(format!(
                "Discovery document {}",
                describe_reqwest_error(err)
            ))
        })?;

        serde_json::from_slice(&body).map_err(|err| {
            BridgeError::Configuration(format!(
                "Malformed discovery document: {}",
                describe_json_error(&err)
            ))
        })
    }
}
