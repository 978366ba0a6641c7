//! The login pipeline: authorization code in, Filestash session cookie out.
//!
//! Each stage takes ownership of the previous stage's output, so a code,
//! token or credential can't be reused once it has been spent.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::config::BridgeConfig;
use crate::constants::RESPONSE_TYPE_CODE;
use crate::discovery::ProviderMetadataCache;
use crate::error::BridgeError;
use crate::federation::FederationClient;
use crate::session::{SessionBridge, SessionCookie};
use crate::token::{AuthorizationCode, TokenExchanger};

pub struct LoginBridge {
    metadata: Arc<ProviderMetadataCache>,
    token_exchanger: TokenExchanger,
    federation: FederationClient,
    session: SessionBridge,
    client_id: String,
    redirect_uri: String,
    scope: String,
}

impl LoginBridge {
    pub fn new(config: &BridgeConfig, http: reqwest::Client) -> Self {
        let metadata = Arc::new(ProviderMetadataCache::new(
            http.clone(),
            config.discovery_url.clone(),
        ));
        Self::with_metadata_cache(config, http, metadata)
    }

    /// Builds the pipeline around an existing (possibly preloaded) metadata cache.
    pub fn with_metadata_cache(
        config: &BridgeConfig,
        http: reqwest::Client,
        metadata: Arc<ProviderMetadataCache>,
    ) -> Self {
        Self {
            token_exchanger: TokenExchanger::new(
                http.clone(),
                metadata.clone(),
                &config.client_id,
                config.client_secret.clone(),
                &config.redirect_uri,
            ),
            federation: FederationClient::new(http.clone(), config.federation_endpoint.clone()),
            session: SessionBridge::new(
                http,
                config.session_endpoint.clone(),
                config.filestash_api_key.clone(),
                &config.storage_endpoint,
            ),
            metadata,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
        }
    }

    /// Where to send the browser to log in.
    pub async fn authorization_url(&self) -> Result<Url, BridgeError> {
        let metadata = self.metadata.get_provider_metadata().await?;
        let mut url = metadata.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", RESPONSE_TYPE_CODE)
            .append_pair("scope", &self.scope);
        Ok(url)
    }

    /// Runs token exchange, federation and session creation in order, stopping at the first failure.
    pub async fn complete_login(
        &self,
        code: AuthorizationCode,
    ) -> Result<SessionCookie, BridgeError> {
        debug!("Exchanging authorization code for access token");
        let access_token = self.token_exchanger.exchange_code(code).await?;

        debug!("Exchanging access token for storage credentials");
        let credential = self
            .federation
            .assume_role_with_web_identity(access_token)
            .await?;

        debug!("Exchanging storage credentials for Filestash session");
        let cookie = self.session.create_session(credential).await?;

        info!("Login completed, Filestash session created");
        Ok(cookie)
    }
}
