mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use origin_trials_client::token::ORIGIN_TRIALS_SCOPE;
use origin_trials_client::{AccessTokenProvider, MetadataServerTokenProvider, TokenError};
use serde_json::json;

use common::ApiStub;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[tokio::test]
async fn metadata_token_is_requested_with_origin_trials_scope() -> Result<()> {
    let stub = ApiStub::spawn().await?;
    stub.respond(
        Method::GET,
        TOKEN_PATH,
        StatusCode::OK,
        json!({"access_token": "ya29.token", "expires_in": 3599, "token_type": "Bearer"}),
    )
    .await;
    let provider = MetadataServerTokenProvider::new(format!("{}{TOKEN_PATH}", stub.base_url));

    let token = provider.access_token().await?;

    assert_eq!(token, "ya29.token");
    let calls = stub.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].header("metadata-flavor"), Some("Google"));
    assert_eq!(
        calls[0].query.get("scopes").map(String::as_str),
        Some(ORIGIN_TRIALS_SCOPE)
    );
    stub.stop().await;
    Ok(())
}

#[tokio::test]
async fn metadata_server_errors_are_reported() -> Result<()> {
    let stub = ApiStub::spawn().await?;
    stub.respond(
        Method::GET,
        TOKEN_PATH,
        StatusCode::FORBIDDEN,
        json!({"error": "scope not allowed"}),
    )
    .await;
    let provider = MetadataServerTokenProvider::new(format!("{}{TOKEN_PATH}", stub.base_url));

    let error = provider.access_token().await.expect_err("forbidden");

    assert!(matches!(error, TokenError::Http { status: 403, .. }));
    stub.stop().await;
    Ok(())
}
