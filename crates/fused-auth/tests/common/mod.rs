/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for fused-auth tests

#![allow(dead_code)]

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use fused_auth::{AuthSession, ClientConfig, FusedClient, Identity, MemoryCredentialStore};
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_APP_ID: &str = "app1";
pub const TEST_ADDRESS: &str = "0x71c7656ec7ab88b098defb751b7401b5f6d8976f";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Compact token with an unchecked signature segment
pub fn make_token(claims: serde_json::Value) -> String {
    let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("{header_b64}.{payload_b64}.c2lnbmF0dXJl")
}

/// Token for `app_id` expiring `exp_offset_secs` from now
pub fn token_for(app_id: &str, exp_offset_secs: i64) -> String {
    make_token(serde_json::json!({
        "address": TEST_ADDRESS,
        "appId": app_id,
        "exp": Utc::now().timestamp() + exp_offset_secs,
    }))
}

pub fn client_for(server: &MockServer) -> FusedClient {
    FusedClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

pub fn session_for(server: &MockServer, store: &MemoryCredentialStore) -> AuthSession {
    AuthSession::new(
        client_for(server),
        Arc::new(store.clone()),
        Identity::email(TEST_EMAIL, TEST_APP_ID),
    )
}

pub async fn mount_register(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path("/fused/register"))
        .and(body_string(format!(
            "email={}&appId={}",
            urlencoding::encode(TEST_EMAIL),
            TEST_APP_ID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": code,
        })))
        .mount(server)
        .await;
}

pub async fn mount_login(server: &MockServer, code: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/fused/login"))
        .and(body_string(format!("code={code}&appId={TEST_APP_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": token,
        })))
        .mount(server)
        .await;
}
