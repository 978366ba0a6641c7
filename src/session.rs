//! Filestash session creation from temporary storage credentials.

use http::HeaderValue;
use http::header::SET_COOKIE;
use secret_string::SecretString;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::constants::FILESTASH_BACKEND_S3;
use crate::error::{BridgeError, describe_reqwest_error};
use crate::federation::StorageCredential;

/// The `Set-Cookie` values Filestash answered with, forwarded to the browser untouched.
pub struct SessionCookie(Vec<HeaderValue>);

impl SessionCookie {
    pub fn header_values(&self) -> &[HeaderValue] {
        &self.0
    }

    pub fn into_header_values(self) -> Vec<HeaderValue> {
        self.0
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionCookie({} value(s))", self.0.len())
    }
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    #[serde(rename = "type")]
    backend_type: &'static str,
    endpoint: &'a str,
    access_key_id: &'a SecretString,
    secret_access_key: &'a SecretString,
    session_token: &'a SecretString,
}

pub struct SessionBridge {
    http: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    storage_endpoint: String,
}

impl SessionBridge {
    pub fn new(
        http: reqwest::Client,
        endpoint: Url,
        api_key: SecretString,
        storage_endpoint: &str,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            storage_endpoint: storage_endpoint.to_string(),
        }
    }

    pub async fn create_session(
        &self,
        credential: StorageCredential,
    ) -> Result<SessionCookie, BridgeError> {
        debug!(endpoint = %self.endpoint, "Creating Filestash session");

        let payload = SessionRequest {
            backend_type: FILESTASH_BACKEND_S3,
            endpoint: &self.storage_endpoint,
            access_key_id: &credential.access_key_id,
            secret_access_key: &credential.secret_access_key,
            session_token: &credential.session_token,
        };

        // The API key goes in the query string, never the body.
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.value())])
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                BridgeError::SessionCreation(format!(
                    "Session endpoint {}",
                    describe_reqwest_error(err)
                ))
            })?;
        drop(credential);

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::SessionCreation(format!(
                "Session endpoint returned HTTP {status}"
            )));
        }

        let cookies: Vec<HeaderValue> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter(|value| !value.is_empty())
            .map(|value| {
                let mut value = value.clone();
                value.set_sensitive(true);
                value
            })
            .collect();

        if cookies.is_empty() {
            return Err(BridgeError::SessionCreation(
                "Session endpoint did not set a cookie".to_string(),
            ));
        }

        debug!(cookie_count = cookies.len(), "Filestash session created");
        Ok(SessionCookie(cookies))
    }
}
