//! Validated runtime configuration.
//!
//! [`Cli`] holds whatever the operator typed; [`BridgeConfig`] is the checked
//! form every component reads from. All URL parsing happens here so a bad
//! value stops the process at startup instead of failing the first login.

use std::num::NonZeroU16;
use std::time::Duration;

use secret_string::SecretString;
use url::Url;

use crate::cli::Cli;
use crate::constants::{FILESTASH_SESSION_PATH, OIDC_SCOPE_OPENID};
use crate::error::BridgeError;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub bind_address: String,
    pub port: NonZeroU16,
    /// Normalised route prefix, either empty or `/segment[/segment...]` without a trailing slash.
    pub prefix: String,
    /// Storage base URL exactly as Filestash should see it, without a trailing slash.
    pub storage_endpoint: String,
    /// Where `AssumeRoleWithWebIdentity` is POSTed, the storage root.
    pub federation_endpoint: Url,
    /// Filestash's session-creation endpoint.
    pub session_endpoint: Url,
    pub filestash_api_key: SecretString,
    pub discovery_url: Url,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub scope: String,
    pub request_timeout: Duration,
}

impl BridgeConfig {
    pub fn login_path(&self) -> String {
        format!("{}/login", self.prefix)
    }

    pub fn callback_path(&self) -> String {
        format!("{}/callback", self.prefix)
    }
}

impl TryFrom<Cli> for BridgeConfig {
    type Error = BridgeError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let prefix = normalize_prefix(&cli.api_prefix);

        let storage_endpoint = parse_base_url("MINIO_URL", &cli.minio_url)?;
        let federation_endpoint = Url::parse(&format!("{storage_endpoint}/")).map_err(|err| {
            BridgeError::Configuration(format!("Invalid storage endpoint: {err}"))
        })?;

        let filestash_url = parse_base_url("FILESTASH_URL", &cli.filestash_url)?;
        let session_endpoint = Url::parse(&format!("{filestash_url}{FILESTASH_SESSION_PATH}"))
            .map_err(|err| {
                BridgeError::Configuration(format!("Invalid Filestash session endpoint: {err}"))
            })?;

        let discovery_url = discovery_url(&cli)?;

        let redirect_uri = match cli.redirect_uri {
            Some(uri) => {
                Url::parse(&uri).map_err(|err| {
                    BridgeError::Configuration(format!("Invalid BRIDGE_REDIRECT_URI '{uri}': {err}"))
                })?;
                uri
            }
            None => format!("{filestash_url}{prefix}/callback"),
        };

        if cli.oidc_client_id.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "OIDC client id must not be empty".to_string(),
            ));
        }
        if cli.filestash_api_key.is_empty() {
            return Err(BridgeError::Configuration(
                "FILESTASH_API_KEY must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bind_address: cli.host,
            port: cli.port,
            prefix,
            storage_endpoint,
            federation_endpoint,
            session_endpoint,
            filestash_api_key: SecretString::new(cli.filestash_api_key),
            discovery_url,
            client_id: cli.oidc_client_id,
            client_secret: SecretString::new(cli.oidc_client_secret),
            redirect_uri,
            scope: normalize_scope(&cli.oidc_scope),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
        })
    }
}

/// Either the explicit discovery URL, or the Keycloak realm's well-known document.
fn discovery_url(cli: &Cli) -> Result<Url, BridgeError> {
    let raw = match (&cli.oidc_config_url, &cli.keycloak_url, &cli.keycloak_realm) {
        (Some(url), _, _) => url.clone(),
        (None, Some(keycloak_url), Some(realm)) => format!(
            "{}/realms/{}/.well-known/openid-configuration",
            keycloak_url.trim_end_matches('/'),
            realm
        ),
        _ => {
            return Err(BridgeError::Configuration(
                "Set OIDC_CONFIG_URL, or both KEYCLOAK_URL and KEYCLOAK_REALM".to_string(),
            ));
        }
    };
    Url::parse(&raw).map_err(|err| {
        BridgeError::Configuration(format!("Invalid OIDC discovery URL '{raw}': {err}"))
    })
}

fn parse_base_url(name: &str, value: &str) -> Result<String, BridgeError> {
    let url = Url::parse(value)
        .map_err(|err| BridgeError::Configuration(format!("Invalid {name} '{value}': {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(BridgeError::Configuration(format!(
            "{name} must be an http(s) URL, got '{value}'"
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub(crate) fn normalize_scope(scope: &str) -> String {
    let mut scopes: Vec<&str> = Vec::new();
    for scope in std::iter::once(OIDC_SCOPE_OPENID).chain(scope.split_whitespace()) {
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    scopes.join(" ")
}
