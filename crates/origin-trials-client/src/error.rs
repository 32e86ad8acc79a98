use reqwest::StatusCode;
use thiserror::Error;

use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum OriginTrialsError {
    #[error("Origin trials API key not found.")]
    ApiKeyMissing,
    #[error("origin_trials_invalid_base_url:{0}")]
    InvalidBaseUrl(String),
    #[error("origin_trials_access_token_failed:{0}")]
    AccessToken(#[from] TokenError),
    #[error("origin_trials_request_failed:{message}")]
    Request { message: String },
    #[error("origin_trials_read_failed:{message}")]
    Read { message: String },
    #[error("origin_trials_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("origin_trials_json_decode_failed:{message}")]
    Decode { message: String },
    #[error("milestone_schedule_invalid:{message}")]
    MilestoneSchedule { message: String },
}

impl OriginTrialsError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> OriginTrialsError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    let body = if body.is_empty() {
        "<empty>".to_string()
    } else {
        body
    };
    OriginTrialsError::Http { status, body }
}
