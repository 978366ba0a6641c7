//! OAuth2 authorization-code grant against the provider's token endpoint.

use std::sync::Arc;

use http::header::ACCEPT;
use secret_string::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::GRANT_TYPE_AUTHORIZATION_CODE;
use crate::discovery::ProviderMetadataCache;
use crate::error::{BridgeError, describe_json_error, describe_reqwest_error};

/// One-time code handed to `/callback` by the provider. Consumed by [`TokenExchanger::exchange_code`].
#[derive(Debug)]
pub struct AuthorizationCode(SecretString);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(SecretString::new(code))
    }
}

/// Bearer token proving the user's identity to the storage service.
#[derive(Debug)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token))
    }

    pub(crate) fn value(&self) -> &str {
        self.0.value()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<SecretString>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// RFC 6749 section 5.2 error body, only the code is ever reported.
#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
}

pub struct TokenExchanger {
    http: reqwest::Client,
    metadata: Arc<ProviderMetadataCache>,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl TokenExchanger {
    pub fn new(
        http: reqwest::Client,
        metadata: Arc<ProviderMetadataCache>,
        client_id: &str,
        client_secret: SecretString,
        redirect_uri: &str,
    ) -> Self {
        Self {
            http,
            metadata,
            client_id: client_id.to_string(),
            client_secret,
            redirect_uri: redirect_uri.to_string(),
        }
    }

    /// Trades the code for an access token. The redirect URI sent here must be
    /// byte-for-byte the one the browser was sent to the provider with.
    pub async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessToken, BridgeError> {
        let metadata = self.metadata.get_provider_metadata().await?;
        debug!(token_endpoint = %metadata.token_endpoint, "Exchanging authorization code");

        let form = TokenRequest {
            client_id: &self.client_id,
            client_secret: self.client_secret.value(),
            grant_type: GRANT_TYPE_AUTHORIZATION_CODE,
            code: code.0.value(),
            redirect_uri: &self.redirect_uri,
        };

        let response = self
            .http
            .post(metadata.token_endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                BridgeError::TokenExchange(format!(
                    "Token endpoint {}",
                    describe_reqwest_error(err)
                ))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            BridgeError::TokenExchange(format!("Token endpoint {}", describe_reqwest_error(err)))
        })?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<TokenErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| "no OAuth error code".to_string());
            return Err(BridgeError::TokenExchange(format!(
                "Token endpoint returned HTTP {status} ({reason})"
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body).map_err(|err| {
            BridgeError::TokenExchange(format!(
                "Malformed token response: {}",
                describe_json_error(&err)
            ))
        })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BridgeError::TokenExchange("Token response has no access_token".to_string())
            })?;

        debug!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            "Received access token"
        );
        Ok(AccessToken(access_token))
    }
}
