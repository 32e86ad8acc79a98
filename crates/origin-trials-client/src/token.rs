use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub const ORIGIN_TRIALS_SCOPE: &str = "https://www.googleapis.com/auth/chromeorigintrials";
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token_request_failed:{message}")]
    Request { message: String },
    #[error("token_http_{status}:{body}")]
    Http { status: u16, body: String },
    #[error("token_decode_failed:{message}")]
    Decode { message: String },
    #[error("token_empty")]
    Empty,
}

/// Supplies the OAuth bearer token sent with authenticated API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, TokenError>;
}

/// A token fixed at construction, e.g. one minted out of band by an operator.
#[derive(Debug, Clone)]
pub struct StaticAccessToken(String);

impl StaticAccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessToken {
    async fn access_token(&self) -> Result<String, TokenError> {
        let token = self.0.trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(token.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Requests a service-account token scoped for the Origin Trials API from the
/// compute metadata server. A fresh token is fetched on every call.
#[derive(Debug, Clone)]
pub struct MetadataServerTokenProvider {
    token_url: String,
    http: reqwest::Client,
}

impl Default for MetadataServerTokenProvider {
    fn default() -> Self {
        Self::new(METADATA_TOKEN_URL)
    }
}

impl MetadataServerTokenProvider {
    #[must_use]
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for MetadataServerTokenProvider {
    async fn access_token(&self) -> Result<String, TokenError> {
        let response = self
            .http
            .get(self.token_url.as_str())
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", ORIGIN_TRIALS_SCOPE)])
            .send()
            .await
            .map_err(|error| TokenError::Request {
                message: error.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|error| TokenError::Request {
            message: error.to_string(),
        })?;
        if !status.is_success() {
            return Err(TokenError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        let parsed: MetadataTokenResponse =
            serde_json::from_slice(&bytes).map_err(|error| TokenError::Decode {
                message: error.to_string(),
            })?;
        if parsed.access_token.trim().is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(parsed.access_token)
    }
}
