//! Client for the Origin Trials REST API.
//!
//! Lists trials, creates, extends and activates them, resolves milestone end
//! dates, and files or verifies security-review launch issues. Credentials
//! come from a [`SecretsProvider`] and bearer tokens from an
//! [`AccessTokenProvider`], so hosts decide where secrets live.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod payload;
pub mod secrets;
pub mod token;

pub use client::{
    ACCESS_TOKEN_ERROR_TEXT, DEV_MODE_LAUNCH_ISSUE_ID, DEV_MODE_VERIFICATION_STATUS,
    NO_API_KEY_ERROR_TEXT, OriginTrialsClient, parse_milestone_date,
};
pub use config::{ConfigError, OriginTrialsConfig};
pub use error::OriginTrialsError;
pub use models::{
    ContinuityVerification, CreateTrialOutcome, HistogramId, LaunchIssueOutcome, MilestoneSet,
    TrialStage, TrialSummary,
};
pub use secrets::{EnvSecrets, SecretsProvider, StaticSecrets};
pub use token::{
    AccessTokenProvider, MetadataServerTokenProvider, StaticAccessToken, TokenError,
};
