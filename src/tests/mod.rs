pub(crate) mod bridge_tests;

use std::num::NonZeroU16;
use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::bridge::LoginBridge;
use crate::cli::Cli;
use crate::config::BridgeConfig;
use crate::server::Server;
use crate::web::handlers::BridgeHandler;

pub(crate) const DISCOVERY_PATH: &str = "/realms/test/.well-known/openid-configuration";
pub(crate) const AUTH_PATH: &str = "/realms/test/protocol/openid-connect/auth";
pub(crate) const TOKEN_PATH: &str = "/realms/test/protocol/openid-connect/token";
pub(crate) const FEDERATION_PATH: &str = "/minio/";
pub(crate) const SESSION_PATH: &str = "/filestash/api/session";
pub(crate) const TEST_API_KEY: &str = "test-api-key";

/// Every collaborator lives on the one mock server, under its own path.
pub(crate) fn test_cli(upstream: &str) -> Cli {
    Cli {
        port: NonZeroU16::new(8080).expect("non-zero port"),
        host: "127.0.0.1".to_string(),
        api_prefix: "/api/minio".to_string(),
        minio_url: format!("{upstream}/minio"),
        filestash_url: format!("{upstream}/filestash"),
        filestash_api_key: TEST_API_KEY.to_string(),
        oidc_config_url: Some(format!("{upstream}{DISCOVERY_PATH}")),
        keycloak_url: None,
        keycloak_realm: None,
        oidc_client_id: "minio".to_string(),
        oidc_client_secret: "client-secret".to_string(),
        oidc_scope: "openid".to_string(),
        redirect_uri: None,
        request_timeout_secs: 5,
    }
}

pub(crate) fn test_config(server: &MockServer) -> BridgeConfig {
    BridgeConfig::try_from(test_cli(&server.uri())).expect("Failed to build test config")
}

pub(crate) fn test_bridge(server: &MockServer) -> LoginBridge {
    let config = test_config(server);
    let http = Server::http_client(&config).expect("Failed to build HTTP client");
    LoginBridge::new(&config, http)
}

pub(crate) fn test_handler(server: &MockServer) -> BridgeHandler {
    handler_for(test_cli(&server.uri()))
}

/// Builds a handler from a tweaked CLI, for tests that need non-default settings.
pub(crate) fn handler_for(cli: Cli) -> BridgeHandler {
    let config = BridgeConfig::try_from(cli).expect("Failed to build test config");
    let http = Server::http_client(&config).expect("Failed to build HTTP client");
    BridgeHandler::new(Arc::new(LoginBridge::new(&config, http)), &config.prefix)
}

pub(crate) async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": format!("{}/realms/test", server.uri()),
            "authorization_endpoint": format!("{}{AUTH_PATH}", server.uri()),
            "token_endpoint": format!("{}{TOKEN_PATH}", server.uri()),
            "jwks_uri": format!("{}/realms/test/protocol/openid-connect/certs", server.uri()),
            "response_types_supported": ["code"],
        })))
        .mount(server)
        .await;
}

pub(crate) async fn mount_token(server: &MockServer, code: &str, body: Value, expect: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("code={code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expect)
        .mount(server)
        .await;
}

pub(crate) async fn mount_federation(server: &MockServer, token: &str, body: String, expect: u64) {
    Mock::given(method("POST"))
        .and(path(FEDERATION_PATH))
        .and(query_param("Action", "AssumeRoleWithWebIdentity"))
        .and(query_param("WebIdentityToken", token))
        .and(query_param("Version", "2011-06-15"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expect)
        .mount(server)
        .await;
}

pub(crate) async fn mount_session(server: &MockServer, response: ResponseTemplate, expect: u64) {
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(query_param("key", TEST_API_KEY))
        .respond_with(response)
        .expect(expect)
        .mount(server)
        .await;
}

/// An STS response with whichever credential elements are given.
pub(crate) fn sts_document(elements: &[(&str, &str)]) -> String {
    let credentials: String = elements
        .iter()
        .map(|(name, value)| format!("<{name}>{value}</{name}>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<AssumeRoleWithWebIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
<AssumeRoleWithWebIdentityResult>
<Credentials>{credentials}<Expiration>2025-01-01T12:00:00Z</Expiration></Credentials>
</AssumeRoleWithWebIdentityResult>
<ResponseMetadata><RequestId>17F3C1A9C8E0B2D4</RequestId></ResponseMetadata>
</AssumeRoleWithWebIdentityResponse>"#
    )
}

pub(crate) fn full_sts_document() -> String {
    sts_document(&[
        ("AccessKeyId", "AK1"),
        ("SecretAccessKey", "SK1"),
        ("SessionToken", "ST1"),
    ])
}
