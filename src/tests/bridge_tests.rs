use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::error::BridgeError;
use crate::logging::setup_test_logging;
use crate::token::AuthorizationCode;

#[tokio::test]
async fn test_complete_login() {
    setup_test_logging();
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_token(&server, "abc123", json!({"access_token": "tok-1"}), 1).await;
    mount_federation(&server, "tok-1", full_sts_document(), 1).await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(body_json(json!({
            "type": "s3",
            "endpoint": format!("{}/minio", server.uri()),
            "access_key_id": "AK1",
            "secret_access_key": "SK1",
            "session_token": "ST1"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "filestash=xyz; Path=/")
                .set_body_json(json!({"status": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cookie = test_bridge(&server)
        .complete_login(AuthorizationCode::new("abc123"))
        .await
        .expect("login should complete");

    assert_eq!(cookie.header_values().len(), 1);
    assert_eq!(cookie.header_values()[0], "filestash=xyz; Path=/");
}

#[tokio::test]
async fn test_token_failure_skips_federation() {
    setup_test_logging();
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_token(&server, "abc123", json!({"token_type": "Bearer"}), 1).await;
    mount_federation(&server, "tok-1", full_sts_document(), 0).await;
    mount_session(
        &server,
        ResponseTemplate::new(200).insert_header("set-cookie", "filestash=xyz"),
        0,
    )
    .await;

    let err = test_bridge(&server)
        .complete_login(AuthorizationCode::new("abc123"))
        .await
        .expect_err("no access token");
    assert!(matches!(err, BridgeError::TokenExchange(_)));
}

#[tokio::test]
async fn test_missing_credential_element_skips_session() {
    setup_test_logging();
    for missing in ["AccessKeyId", "SecretAccessKey", "SessionToken"] {
        let server = MockServer::start().await;
        mount_discovery(&server).await;
        mount_token(&server, "abc123", json!({"access_token": "tok-1"}), 1).await;
        let elements: Vec<(&str, &str)> = [
            ("AccessKeyId", "AK1"),
            ("SecretAccessKey", "SK1"),
            ("SessionToken", "ST1"),
        ]
        .into_iter()
        .filter(|(name, _)| *name != missing)
        .collect();
        mount_federation(&server, "tok-1", sts_document(&elements), 1).await;
        mount_session(
            &server,
            ResponseTemplate::new(200).insert_header("set-cookie", "filestash=xyz"),
            0,
        )
        .await;

        let err = test_bridge(&server)
            .complete_login(AuthorizationCode::new("abc123"))
            .await
            .expect_err("incomplete credentials");
        assert!(
            matches!(err, BridgeError::Federation(_)),
            "missing {missing} gave {err:?}"
        );
        assert!(err.to_string().contains(missing));
    }
}

#[tokio::test]
async fn test_session_without_cookie() {
    setup_test_logging();
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_token(&server, "abc123", json!({"access_token": "tok-1"}), 1).await;
    mount_federation(&server, "tok-1", full_sts_document(), 1).await;
    mount_session(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})),
        1,
    )
    .await;

    let err = test_bridge(&server)
        .complete_login(AuthorizationCode::new("abc123"))
        .await
        .expect_err("no cookie");
    assert!(matches!(err, BridgeError::SessionCreation(_)));
}

#[tokio::test]
async fn test_discovery_failure_blocks_token_exchange() {
    setup_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_token(&server, "abc123", json!({"access_token": "tok-1"}), 0).await;

    let err = test_bridge(&server)
        .complete_login(AuthorizationCode::new("abc123"))
        .await
        .expect_err("no discovery");
    assert!(matches!(err, BridgeError::Configuration(_)));
}

#[tokio::test]
async fn test_each_login_gets_fresh_values() {
    setup_test_logging();
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_token(&server, "code-1", json!({"access_token": "tok-1"}), 1).await;
    mount_token(&server, "code-2", json!({"access_token": "tok-2"}), 1).await;
    mount_federation(&server, "tok-1", full_sts_document(), 1).await;
    mount_federation(
        &server,
        "tok-2",
        sts_document(&[
            ("AccessKeyId", "AK2"),
            ("SecretAccessKey", "SK2"),
            ("SessionToken", "ST2"),
        ]),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(body_json(json!({
            "type": "s3",
            "endpoint": format!("{}/minio", server.uri()),
            "access_key_id": "AK2",
            "secret_access_key": "SK2",
            "session_token": "ST2"
        })))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "filestash=second"))
        .expect(1)
        .mount(&server)
        .await;
    mount_session(
        &server,
        ResponseTemplate::new(200).insert_header("set-cookie", "filestash=first"),
        1,
    )
    .await;

    let bridge = test_bridge(&server);
    let first = bridge
        .complete_login(AuthorizationCode::new("code-1"))
        .await
        .expect("first login");
    let second = bridge
        .complete_login(AuthorizationCode::new("code-2"))
        .await
        .expect("second login");

    assert_eq!(first.header_values()[0], "filestash=first");
    assert_eq!(second.header_values()[0], "filestash=second");
}

#[tokio::test]
async fn test_authorization_url() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    let url = test_bridge(&server)
        .authorization_url()
        .await
        .expect("authorization url");

    assert_eq!(url.path(), AUTH_PATH);
    let params: std::collections::HashMap<String, String> =
        url.query_pairs().into_owned().collect();
    assert_eq!(params.get("client_id").map(String::as_str), Some("minio"));
    assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
    assert_eq!(params.get("scope").map(String::as_str), Some("openid"));
    assert_eq!(
        params.get("redirect_uri"),
        Some(&format!("{}/filestash/api/minio/callback", server.uri()))
    );
}
