use std::env;

use thiserror::Error;

pub const DEFAULT_OT_API_URL: &str = "https://chromeorigintrials-pa.googleapis.com";
pub const DEFAULT_MILESTONE_SCHEDULE_URL: &str =
    "https://chromiumdash.appspot.com/fetch_milestone_schedule";
pub const DEFAULT_SITE_URL: &str = "http://localhost:8080/";

pub const ENV_OT_API_URL: &str = "OT_API_URL";
pub const ENV_MILESTONE_SCHEDULE_URL: &str = "OT_MILESTONE_SCHEDULE_URL";
pub const ENV_SITE_URL: &str = "SITE_URL";
pub const ENV_DEV_MODE: &str = "DEV_MODE";

/// Settings the client needs from the hosting application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginTrialsConfig {
    /// Base URL of the Origin Trials API, without a trailing slash.
    pub api_base_url: String,
    /// Milestone schedule endpoint used to resolve trial end times.
    pub milestone_schedule_url: String,
    /// Public URL of the application, always ending with `/`.
    pub site_url: String,
    /// Development mode answers continuity verification locally.
    pub dev_mode: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid OT_API_URL: {0}")]
    InvalidApiUrl(String),
    #[error("invalid OT_MILESTONE_SCHEDULE_URL: {0}")]
    InvalidMilestoneScheduleUrl(String),
    #[error("invalid SITE_URL: {0}")]
    InvalidSiteUrl(String),
    #[error("invalid DEV_MODE: {0}")]
    InvalidDevMode(String),
}

impl OriginTrialsConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            milestone_schedule_url: DEFAULT_MILESTONE_SCHEDULE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            dev_mode: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_base_url = normalize_base_url(&read(ENV_OT_API_URL, DEFAULT_OT_API_URL))
            .map_err(ConfigError::InvalidApiUrl)?;
        let milestone_schedule_url = normalize_base_url(&read(
            ENV_MILESTONE_SCHEDULE_URL,
            DEFAULT_MILESTONE_SCHEDULE_URL,
        ))
        .map_err(ConfigError::InvalidMilestoneScheduleUrl)?;
        let site_url = normalize_site_url(&read(ENV_SITE_URL, DEFAULT_SITE_URL))
            .map_err(ConfigError::InvalidSiteUrl)?;
        let dev_mode = parse_bool(&read(ENV_DEV_MODE, "false")).map_err(ConfigError::InvalidDevMode)?;

        Ok(Self {
            api_base_url,
            milestone_schedule_url,
            site_url,
            dev_mode,
        })
    }

    #[must_use]
    pub fn with_milestone_schedule_url(mut self, url: impl Into<String>) -> Self {
        self.milestone_schedule_url = url.into();
        self
    }

    #[must_use]
    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = url.into();
        self
    }

    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }
}

/// Trims whitespace and trailing slashes and requires an `http(s)://host` prefix.
pub fn normalize_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("url must not be empty".to_string());
    }
    let Some((scheme, remainder)) = trimmed.split_once("://") else {
        return Err(format!("{trimmed}: missing scheme"));
    };
    if scheme != "http" && scheme != "https" {
        return Err(format!("{trimmed}: scheme must be http or https"));
    }
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(format!("{trimmed}: missing host"));
    }
    Ok(trimmed.to_string())
}

fn normalize_site_url(raw: &str) -> Result<String, String> {
    normalize_base_url(raw).map(|base| format!("{base}/"))
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(other.to_string()),
    }
}
