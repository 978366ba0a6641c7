use std::num::NonZeroU16;

use clap::Parser;

use crate::constants::{DEFAULT_API_PREFIX, OIDC_SCOPE_OPENID};

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    #[clap(short, long, default_value = "8080", env = "BRIDGE_PORT")]
    pub port: NonZeroU16,

    #[clap(long, default_value = "127.0.0.1", env = "BRIDGE_HOST")]
    pub host: String,

    /// Prefix for the login and callback routes
    #[clap(long, default_value = DEFAULT_API_PREFIX, env = "API_PREFIX")]
    pub api_prefix: String,

    /// Base URL of the S3-compatible storage service, also handed to Filestash as the endpoint
    #[clap(long, env = "MINIO_URL")]
    pub minio_url: String,

    #[clap(long, env = "FILESTASH_URL")]
    pub filestash_url: String,

    #[clap(long, env = "FILESTASH_API_KEY", hide_env_values = true)]
    pub filestash_api_key: String,

    /// Full URL of the provider's discovery document
    #[clap(long, env = "OIDC_CONFIG_URL")]
    pub oidc_config_url: Option<String>,

    /// Keycloak base URL, used with --keycloak-realm when --oidc-config-url isn't given
    #[clap(long, env = "KEYCLOAK_URL", requires = "keycloak_realm")]
    pub keycloak_url: Option<String>,

    #[clap(long, env = "KEYCLOAK_REALM", requires = "keycloak_url")]
    pub keycloak_realm: Option<String>,

    #[clap(long, env = "MINIO_KEYCLOAK_CLIENT_ID")]
    pub oidc_client_id: String,

    #[clap(long, env = "MINIO_KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    pub oidc_client_secret: String,

    /// Space-separated scopes, `openid` is always added
    #[clap(long, default_value = OIDC_SCOPE_OPENID, env = "OIDC_SCOPE")]
    pub oidc_scope: String,

    /// Overrides the default `{FILESTASH_URL}{API_PREFIX}/callback`
    #[clap(long, env = "BRIDGE_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Timeout applied to every outbound call, in seconds
    #[clap(
        long,
        default_value = "10",
        env = "BRIDGE_REQUEST_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_secs: u64,
}
