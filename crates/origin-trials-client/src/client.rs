use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{OriginTrialsConfig, normalize_base_url};
use crate::error::{OriginTrialsError, format_http_error};
use crate::models::{
    ApiTrial, ContinuityVerification, CreateTrialOutcome, CreateTrialResponse, EndTime,
    ExtendTrialRequest, LaunchIssueOutcome, LaunchIssueRequest, LaunchIssueResponse,
    MilestoneScheduleResponse, SetupTrialRequest, StartTrialRequest, TrialStage, TrialSummary,
    TrialsListResponse,
};
use crate::payload::{build_create_trial_request, trial_contacts};
use crate::secrets::SecretsProvider;
use crate::token::AccessTokenProvider;

pub const NO_API_KEY_ERROR_TEXT: &str = "No API key found for origin trials API";
pub const ACCESS_TOKEN_ERROR_TEXT: &str = "Error obtaining origin trial access token.";
pub const DEV_MODE_VERIFICATION_STATUS: &str = "VERIFIED";
pub const DEV_MODE_LAUNCH_ISSUE_ID: i64 = 12345;

const MILESTONE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Client for the Origin Trials API.
///
/// Each operation looks up the API key first and returns before touching the
/// network when it is missing. Authenticated calls carry the key as the `key`
/// query parameter and a bearer token from the [`AccessTokenProvider`].
#[derive(Clone)]
pub struct OriginTrialsClient {
    api_base_url: String,
    milestone_schedule_url: String,
    site_url: String,
    dev_mode: bool,
    secrets: Arc<dyn SecretsProvider>,
    tokens: Arc<dyn AccessTokenProvider>,
    http: reqwest::Client,
}

impl OriginTrialsClient {
    pub fn new(
        config: OriginTrialsConfig,
        secrets: Arc<dyn SecretsProvider>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, OriginTrialsError> {
        let api_base_url =
            normalize_base_url(&config.api_base_url).map_err(OriginTrialsError::InvalidBaseUrl)?;
        let milestone_schedule_url = normalize_base_url(&config.milestone_schedule_url)
            .map_err(OriginTrialsError::InvalidBaseUrl)?;
        let site_url = if config.site_url.ends_with('/') {
            config.site_url
        } else {
            format!("{}/", config.site_url)
        };
        Ok(Self {
            api_base_url,
            milestone_schedule_url,
            site_url,
            dev_mode: config.dev_mode,
            secrets,
            tokens,
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    #[must_use]
    pub fn trials_path() -> &'static str {
        "/v1/trials"
    }

    #[must_use]
    pub fn initialize_trial_path() -> &'static str {
        "/v1/trials:initialize"
    }

    #[must_use]
    pub fn trial_action_path(trial_id: &str, action: &str) -> String {
        format!("/v1/trials/{}:{action}", trial_id.trim())
    }

    #[must_use]
    pub fn create_launch_issue_path() -> &'static str {
        "/v1/security-review-issues:create"
    }

    #[must_use]
    pub fn verify_continuity_issue_path(continuity_id: i64) -> String {
        format!("/v1/security-review-issues/{continuity_id}:verify")
    }

    /// Lists public trials. Without an API key this is an empty list.
    pub async fn get_trials_list(&self) -> Result<Vec<TrialSummary>, OriginTrialsError> {
        let Some(key) = self.secrets.ot_api_key() else {
            tracing::warn!("origin trials API key missing; returning no trials");
            return Ok(Vec::new());
        };

        let request = self
            .http
            .get(self.endpoint(Self::trials_path()))
            .query(&[("key", key.as_str())]);
        let response: TrialsListResponse = self.execute_json(request, "list trials").await?;

        Ok(response
            .trials
            .into_iter()
            .filter(|trial| trial.is_public)
            .map(ApiTrial::into_summary)
            .collect())
    }

    /// Epoch seconds of the late stable date of `milestone`.
    pub async fn get_trial_end_time(&self, milestone: u32) -> Result<i64, OriginTrialsError> {
        let request = self
            .http
            .get(self.milestone_schedule_url.as_str())
            .query(&[("mstone", milestone)]);
        let schedule: MilestoneScheduleResponse =
            self.execute_json(request, "fetch milestone schedule").await?;

        let date = schedule
            .mstones
            .into_iter()
            .next()
            .and_then(|entry| entry.late_stable_date)
            .ok_or_else(|| OriginTrialsError::MilestoneSchedule {
                message: format!("no late stable date for milestone {milestone}"),
            })?;
        parse_milestone_date(&date)
    }

    /// Creates a trial for `stage` and registers its contacts.
    ///
    /// Failures are reported as error text in the outcome, never as `Err`.
    /// When creation succeeds but contact registration fails, the outcome
    /// still carries the new trial id.
    pub async fn create_origin_trial(&self, stage: &TrialStage) -> CreateTrialOutcome {
        let Some(key) = self.secrets.ot_api_key() else {
            tracing::warn!(feature_id = stage.feature_id, "origin trials API key missing");
            return CreateTrialOutcome::failed(NO_API_KEY_ERROR_TEXT);
        };

        let access_token = match self.tokens.access_token().await {
            Ok(token) => token,
            Err(error) => {
                tracing::error!(reason = %error, "failed to obtain origin trials access token");
                return CreateTrialOutcome::failed(ACCESS_TOKEN_ERROR_TEXT);
            }
        };

        let Some(end_milestone) = stage.milestones.desktop_last else {
            return CreateTrialOutcome::failed("Origin trial stage has no end milestone.");
        };
        let end_seconds = match self.get_trial_end_time(end_milestone).await {
            Ok(seconds) => seconds,
            Err(error) => {
                return CreateTrialOutcome::failed(format!(
                    "Error obtaining end time for milestone {end_milestone}: {error}"
                ));
            }
        };

        let body = build_create_trial_request(stage, end_milestone, end_seconds, &self.site_url);
        let request = self.authorized_post(Self::initialize_trial_path(), &key, &access_token, &body);
        let created: CreateTrialResponse = match self.execute_json(request, "create trial").await {
            Ok(created) => created,
            Err(error) => {
                return CreateTrialOutcome::failed(format!("Origin trial creation failed: {error}"));
            }
        };
        let Some(trial_id) = created.trial.id_string() else {
            tracing::error!("origin trial creation response has no trial id");
            return CreateTrialOutcome::failed("Origin trial creation response has no trial id.");
        };
        tracing::info!(trial_id = %trial_id, feature_id = stage.feature_id, "origin trial created");

        let setup = SetupTrialRequest {
            trial_id: created.trial.id,
            trial_contacts: trial_contacts(stage),
            data_access_admin_group_name: self.secrets.ot_data_access_admin_group(),
        };
        let request = self.authorized_post(
            &Self::trial_action_path(&trial_id, "setup"),
            &key,
            &access_token,
            &setup,
        );
        match self.execute_unit(request, "set up trial").await {
            Ok(()) => CreateTrialOutcome::Created { trial_id },
            Err(error) => CreateTrialOutcome::SetupFailed {
                error_text: format!("Origin trial setup failed for trial {trial_id}: {error}"),
                trial_id,
            },
        }
    }

    /// Moves the end of a trial to `end_milestone`. Does nothing without an API key.
    pub async fn extend_origin_trial(
        &self,
        trial_id: &str,
        end_milestone: u32,
        intent_url: &str,
    ) -> Result<(), OriginTrialsError> {
        let trial_id = trial_id.trim();
        let Some(key) = self.secrets.ot_api_key() else {
            tracing::warn!(trial_id, "origin trials API key missing; trial not extended");
            return Ok(());
        };
        let access_token = self.tokens.access_token().await?;
        let end_seconds = self.get_trial_end_time(end_milestone).await?;

        let body = ExtendTrialRequest {
            end_milestone: end_milestone.to_string(),
            end_time: EndTime {
                seconds: end_seconds,
            },
            extension_intent_url: intent_url.to_string(),
        };
        let request = self.authorized_post(
            &Self::trial_action_path(trial_id, "extend"),
            &key,
            &access_token,
            &body,
        );
        self.execute_unit(request, "extend trial").await?;
        tracing::info!(trial_id, end_milestone, "origin trial extended");
        Ok(())
    }

    /// Starts a trial. Does nothing without an API key.
    pub async fn activate_origin_trial(&self, trial_id: &str) -> Result<(), OriginTrialsError> {
        let trial_id = trial_id.trim();
        let Some(key) = self.secrets.ot_api_key() else {
            tracing::warn!(trial_id, "origin trials API key missing; trial not activated");
            return Ok(());
        };
        let access_token = self.tokens.access_token().await?;

        let body = StartTrialRequest {
            trial_id: trial_id.to_string(),
        };
        let request = self.authorized_post(
            &Self::trial_action_path(trial_id, "start"),
            &key,
            &access_token,
            &body,
        );
        self.execute_unit(request, "activate trial").await?;
        tracing::info!(trial_id, "origin trial activated");
        Ok(())
    }

    /// Files a security-review launch issue. A refusal reported in a 200 body
    /// is an `Ok` outcome, not an error.
    pub async fn create_launch_issue(
        &self,
        feature_id: i64,
        gate_id: i64,
        security_continuity_id: Option<i64>,
    ) -> Result<LaunchIssueOutcome, OriginTrialsError> {
        let key = self
            .secrets
            .ot_api_key()
            .ok_or(OriginTrialsError::ApiKeyMissing)?;
        let access_token = self.tokens.access_token().await?;

        let body = LaunchIssueRequest {
            feature_id,
            gate_id,
            continuity_id: security_continuity_id,
        };
        let request =
            self.authorized_post(Self::create_launch_issue_path(), &key, &access_token, &body);
        let response: LaunchIssueResponse =
            self.execute_json(request, "create launch issue").await?;
        let Some(outcome) = response.into_outcome() else {
            tracing::error!(
                feature_id,
                gate_id,
                "launch issue response has no issue id or reason"
            );
            return Err(OriginTrialsError::Decode {
                message: "launch issue response has neither issue_id nor failed_reason".to_string(),
            });
        };
        if let LaunchIssueOutcome::Refused { reason } = &outcome {
            tracing::warn!(feature_id, gate_id, reason = %reason, "launch issue not created");
        }
        Ok(outcome)
    }

    pub async fn verify_continuity_issue(
        &self,
        continuity_id: i64,
    ) -> Result<ContinuityVerification, OriginTrialsError> {
        if self.dev_mode {
            return Ok(ContinuityVerification {
                verification_status: DEV_MODE_VERIFICATION_STATUS.to_string(),
                launch_issue_id: Some(DEV_MODE_LAUNCH_ISSUE_ID),
                verification_failure_reason: None,
            });
        }

        let key = self
            .secrets
            .ot_api_key()
            .ok_or(OriginTrialsError::ApiKeyMissing)?;
        let access_token = self.tokens.access_token().await?;

        let request = self
            .http
            .get(self.endpoint(&Self::verify_continuity_issue_path(continuity_id)))
            .bearer_auth(access_token)
            .query(&[("key", key.as_str())]);
        self.execute_json(request, "verify continuity issue").await
    }

    fn authorized_post<B>(
        &self,
        path: &str,
        key: &str,
        access_token: &str,
        body: &B,
    ) -> reqwest::RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        self.http
            .post(self.endpoint(path))
            .bearer_auth(access_token)
            .query(&[("key", key)])
            .json(body)
    }

    async fn execute_json<T>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<T, OriginTrialsError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let bytes = self.execute(request, operation).await?;
        serde_json::from_slice::<T>(&bytes).map_err(|error| {
            tracing::error!(operation, reason = %error, "origin trials response could not be decoded");
            OriginTrialsError::Decode {
                message: error.to_string(),
            }
        })
    }

    async fn execute_unit(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<(), OriginTrialsError> {
        self.execute(request, operation).await.map(|_| ())
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Vec<u8>, OriginTrialsError> {
        let response = request
            .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
            .send()
            .await
            .map_err(|error| {
                tracing::error!(operation, reason = %error, "origin trials request failed");
                OriginTrialsError::Request {
                    message: error.to_string(),
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|error| {
            tracing::error!(operation, reason = %error, "origin trials response could not be read");
            OriginTrialsError::Read {
                message: error.to_string(),
            }
        })?;

        if !status.is_success() {
            let error = format_http_error(status, &bytes);
            tracing::error!(operation, reason = %error, "origin trials API returned an error status");
            return Err(error);
        }
        Ok(bytes.to_vec())
    }
}

/// Parses a milestone schedule date, read as UTC when it carries no offset.
pub fn parse_milestone_date(raw: &str) -> Result<i64, OriginTrialsError> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, MILESTONE_DATE_FORMAT) {
        return Ok(naive.and_utc().timestamp());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.timestamp())
        .map_err(|error| OriginTrialsError::MilestoneSchedule {
            message: format!("unparseable date {raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::StaticSecrets;
    use crate::token::StaticAccessToken;

    #[test]
    fn path_helpers_are_deterministic() {
        assert_eq!(OriginTrialsClient::trials_path(), "/v1/trials");
        assert_eq!(
            OriginTrialsClient::initialize_trial_path(),
            "/v1/trials:initialize"
        );
        assert_eq!(
            OriginTrialsClient::trial_action_path(" -1234567890 ", "start"),
            "/v1/trials/-1234567890:start"
        );
        assert_eq!(
            OriginTrialsClient::create_launch_issue_path(),
            "/v1/security-review-issues:create"
        );
        assert_eq!(
            OriginTrialsClient::verify_continuity_issue_path(101),
            "/v1/security-review-issues/101:verify"
        );
    }

    #[test]
    fn endpoint_uses_normalized_base_url() {
        let client = OriginTrialsClient::new(
            OriginTrialsConfig::new("https://ot.example.com/"),
            Arc::new(StaticSecrets::default()),
            Arc::new(StaticAccessToken::new("token")),
        )
        .expect("client");
        assert_eq!(
            client.endpoint("/v1/trials"),
            "https://ot.example.com/v1/trials"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = OriginTrialsClient::new(
            OriginTrialsConfig::new("   "),
            Arc::new(StaticSecrets::default()),
            Arc::new(StaticAccessToken::new("token")),
        );
        assert!(matches!(result, Err(OriginTrialsError::InvalidBaseUrl(_))));
    }

    #[test]
    fn milestone_dates_are_read_as_utc() {
        assert_eq!(
            parse_milestone_date("2023-04-30T00:00:00").expect("naive"),
            1_682_812_800
        );
        assert_eq!(
            parse_milestone_date("2023-04-30T00:00:00Z").expect("rfc3339"),
            1_682_812_800
        );
        assert!(matches!(
            parse_milestone_date("April 30"),
            Err(OriginTrialsError::MilestoneSchedule { .. })
        ));
    }
}
