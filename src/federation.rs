//! STS-compatible `AssumeRoleWithWebIdentity` against the storage service.
//!
//! The response is decoded with `quick_xml::de` into structs that mirror the
//! fixed STS schema:
//!
//! ```xml
//! <AssumeRoleWithWebIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
//!   <AssumeRoleWithWebIdentityResult>
//!     <Credentials>
//!       <AccessKeyId>...</AccessKeyId>
//!       <SecretAccessKey>...</SecretAccessKey>
//!       <SessionToken>...</SessionToken>
//!       <Expiration>2025-01-01T00:00:00Z</Expiration>
//!     </Credentials>
//!   </AssumeRoleWithWebIdentityResult>
//! </AssumeRoleWithWebIdentityResponse>
//! ```

use quick_xml::de::DeError;
use secret_string::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::constants::{STS_ACTION_ASSUME_ROLE_WITH_WEB_IDENTITY, STS_API_VERSION};
use crate::error::{BridgeError, describe_reqwest_error};
use crate::token::AccessToken;

/// Temporary storage credentials, handed straight to the session bridge.
#[derive(Debug)]
pub struct StorageCredential {
    pub access_key_id: SecretString,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    /// When the storage service says the credentials stop working, if it said.
    pub expiration: Option<String>,
}

#[derive(Deserialize)]
struct AssumeRoleWithWebIdentityResponse {
    #[serde(rename = "AssumeRoleWithWebIdentityResult")]
    result: AssumeRoleWithWebIdentityResult,
}

#[derive(Deserialize)]
struct AssumeRoleWithWebIdentityResult {
    #[serde(rename = "Credentials")]
    credentials: CredentialsElement,
}

#[derive(Deserialize)]
struct CredentialsElement {
    #[serde(rename = "AccessKeyId", default)]
    access_key_id: Option<SecretString>,
    #[serde(rename = "SecretAccessKey", default)]
    secret_access_key: Option<SecretString>,
    #[serde(rename = "SessionToken", default)]
    session_token: Option<SecretString>,
    #[serde(rename = "Expiration", default)]
    expiration: Option<String>,
}

#[derive(Deserialize)]
struct StsErrorResponse {
    #[serde(rename = "Error")]
    error: StsError,
}

#[derive(Deserialize)]
struct StsError {
    #[serde(rename = "Code")]
    code: String,
}

pub struct FederationClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl FederationClient {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub async fn assume_role_with_web_identity(
        &self,
        token: AccessToken,
    ) -> Result<StorageCredential, BridgeError> {
        debug!(endpoint = %self.endpoint, "Requesting temporary storage credentials");

        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[
                ("Action", STS_ACTION_ASSUME_ROLE_WITH_WEB_IDENTITY),
                ("WebIdentityToken", token.value()),
                ("Version", STS_API_VERSION),
            ])
            .send()
            .await
            .map_err(|err| {
                BridgeError::Federation(format!("STS endpoint {}", describe_reqwest_error(err)))
            })?;
        drop(token);

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            BridgeError::Federation(format!("STS endpoint {}", describe_reqwest_error(err)))
        })?;

        if !status.is_success() {
            let code = quick_xml::de::from_str::<StsErrorResponse>(&body)
                .map(|e| e.error.code)
                .unwrap_or_else(|_| "no STS error code".to_string());
            return Err(BridgeError::Federation(format!(
                "STS endpoint returned HTTP {status} ({code})"
            )));
        }

        let credential = parse_credentials(&body)?;
        debug!(
            expiration = credential.expiration.as_deref().unwrap_or("unknown"),
            "Received temporary storage credentials"
        );
        Ok(credential)
    }
}

fn parse_credentials(body: &str) -> Result<StorageCredential, BridgeError> {
    let response: AssumeRoleWithWebIdentityResponse =
        quick_xml::de::from_str(body).map_err(|err| {
            BridgeError::Federation(format!(
                "Malformed AssumeRoleWithWebIdentity response: {}",
                describe_de_error(&err)
            ))
        })?;
    let credentials = response.result.credentials;

    Ok(StorageCredential {
        access_key_id: required(credentials.access_key_id, "AccessKeyId")?,
        secret_access_key: required(credentials.secret_access_key, "SecretAccessKey")?,
        session_token: required(credentials.session_token, "SessionToken")?,
        expiration: credentials.expiration,
    })
}

fn required(value: Option<SecretString>, element: &str) -> Result<SecretString, BridgeError> {
    value
        .filter(|v| !v.value().trim().is_empty())
        .ok_or_else(|| BridgeError::Federation(format!("Response has no {element} element")))
}

/// Missing-field messages are safe to show, anything quoting document text is not.
fn describe_de_error(err: &DeError) -> String {
    match err {
        DeError::Custom(msg) if msg.starts_with("missing field") => msg.clone(),
        DeError::Custom(_) => "unexpected document structure".to_string(),
        DeError::InvalidXml(_) => "not a well-formed XML document".to_string(),
        _ => "unexpected document structure".to_string(),
    }
}
