use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSet {
    #[serde(default)]
    pub desktop_first: Option<u32>,
    #[serde(default)]
    pub desktop_last: Option<u32>,
}

/// The origin trial stage of a feature, as recorded by the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialStage {
    pub feature_id: i64,
    pub display_name: Option<String>,
    pub milestones: MilestoneSet,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub feedback_submission_url: Option<String>,
    pub intent_thread_url: Option<String>,
    pub owner_email: Option<String>,
    pub emails: Vec<String>,
    pub has_third_party_support: bool,
    pub use_counter_bucket_number: i64,
    /// Use counter name such as `WebDXFeature::Foo` or `CSSSampleId::Bar`.
    pub webfeature_use_counter: Option<String>,
    pub require_approvals: bool,
    pub approval_buganizer_component: Option<i64>,
    pub approval_criteria_url: Option<String>,
    pub approval_group_email: Option<String>,
    pub approval_buganizer_custom_field_id: Option<i64>,
    pub is_deprecation_trial: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrialsListResponse {
    #[serde(default)]
    pub trials: Vec<ApiTrial>,
}

/// A trial exactly as the API reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiTrial {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub origin_trial_feature_name: Option<String>,
    pub status: Option<String>,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub is_public: bool,
    pub chromestatus_url: Option<String>,
    pub start_milestone: Option<String>,
    pub end_milestone: Option<String>,
    pub original_end_milestone: Option<String>,
    pub end_time: Option<String>,
    pub feedback_url: Option<String>,
    pub documentation_url: Option<String>,
    pub intent_to_experiment_url: Option<String>,
    pub trial_extensions: Option<Vec<Value>>,
    #[serde(rename = "type")]
    pub trial_type: Option<String>,
    pub allow_third_party_origins: Option<bool>,
}

/// A listed trial with snake_case keys. Fields the API left out stay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_trial_feature_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromestatus_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_end_milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_to_experiment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_extensions: Option<Vec<Value>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub trial_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_third_party_origins: Option<bool>,
}

impl ApiTrial {
    pub fn into_summary(self) -> TrialSummary {
        TrialSummary {
            id: self.id,
            display_name: self.display_name,
            description: self.description,
            origin_trial_feature_name: self.origin_trial_feature_name,
            status: self.status,
            enabled: self.enabled,
            chromestatus_url: self.chromestatus_url,
            start_milestone: self.start_milestone,
            end_milestone: self.end_milestone,
            original_end_milestone: self.original_end_milestone,
            end_time: self.end_time,
            feedback_url: self.feedback_url,
            documentation_url: self.documentation_url,
            intent_to_experiment_url: self.intent_to_experiment_url,
            trial_extensions: self.trial_extensions,
            trial_type: self.trial_type,
            allow_third_party_origins: self.allow_third_party_origins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MilestoneScheduleResponse {
    #[serde(default)]
    pub mstones: Vec<MilestoneSchedule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MilestoneSchedule {
    pub late_stable_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndTime {
    pub seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrialType {
    #[serde(rename = "ORIGIN_TRIAL")]
    OriginTrial,
    #[serde(rename = "DEPRECATION")]
    Deprecation,
}

/// Histogram the use counter bucket is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistogramId {
    #[serde(rename = "WEB_FEATURE")]
    WebFeature,
    #[serde(rename = "WEBDX_FEATURE")]
    WebDxFeature,
    #[serde(rename = "CSS_PROPERTY_ID")]
    CssPropertyId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApprovalType {
    #[serde(rename = "NONE")]
    NotRequired,
    #[serde(rename = "CUSTOM")]
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseCounterConfig {
    pub bucket_number: i64,
    pub histogram_id: HistogramId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_milestone: Option<String>,
    pub end_milestone: String,
    pub end_time: EndTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_to_experiment_url: Option<String>,
    pub chromestatus_url: String,
    pub allow_third_party_origins: bool,
    #[serde(rename = "type")]
    pub trial_type: TrialType,
    pub blink_use_counter_config: UseCounterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationConfig {
    pub allow_public_suffix_subdomains: bool,
    pub approval_type: ApprovalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_buganizer_component_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_criteria_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_group_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_buganizer_custom_field_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTrialRequest {
    pub trial: TrialPayload,
    pub registration_config: RegistrationConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTrialResponse {
    pub trial: CreatedTrial,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTrial {
    #[serde(default)]
    pub id: Value,
}

impl CreatedTrial {
    /// The API may report the id as a JSON number or string.
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupTrialRequest {
    /// Sent back exactly as the creation response reported it.
    pub trial_id: Value,
    pub trial_contacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_access_admin_group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendTrialRequest {
    pub end_milestone: String,
    pub end_time: EndTime,
    pub extension_intent_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartTrialRequest {
    pub trial_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchIssueRequest {
    pub feature_id: i64,
    pub gate_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuity_id: Option<i64>,
}

/// Launch issue response body. The API answers 200 either with the new issue
/// id or with the reason it refused to create one.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LaunchIssueResponse {
    #[serde(default, deserialize_with = "deserialize_int64")]
    pub issue_id: Option<i64>,
    #[serde(default)]
    pub failed_reason: Option<String>,
}

impl LaunchIssueResponse {
    /// A non-empty `failed_reason` wins over any `issue_id` in the same body.
    pub fn into_outcome(self) -> Option<LaunchIssueOutcome> {
        let reason = self
            .failed_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        match (reason, self.issue_id) {
            (Some(reason), _) => Some(LaunchIssueOutcome::Refused { reason }),
            (None, Some(issue_id)) => Some(LaunchIssueOutcome::Created { issue_id }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchIssueOutcome {
    Created { issue_id: i64 },
    Refused { reason: String },
}

impl LaunchIssueOutcome {
    #[must_use]
    pub fn issue_id(&self) -> Option<i64> {
        match self {
            Self::Created { issue_id } => Some(*issue_id),
            Self::Refused { .. } => None,
        }
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Created { .. } => None,
            Self::Refused { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityVerification {
    pub verification_status: String,
    #[serde(
        default,
        deserialize_with = "deserialize_int64",
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_issue_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_failure_reason: Option<String>,
}

/// int64 fields arrive as JSON strings from the API but as numbers from
/// older deployments; accept both.
fn deserialize_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Option::<Int64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Int64::Number(value)) => Ok(Some(value)),
        Some(Int64::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|error| de::Error::custom(format!("invalid int64 {text:?}: {error}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateTrialOutcome {
    Created { trial_id: String },
    /// The trial exists but contacts and admin group were not registered.
    SetupFailed { trial_id: String, error_text: String },
    Failed { error_text: String },
}

impl CreateTrialOutcome {
    #[must_use]
    pub fn trial_id(&self) -> Option<&str> {
        match self {
            Self::Created { trial_id } | Self::SetupFailed { trial_id, .. } => Some(trial_id),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        match self {
            Self::Created { .. } => None,
            Self::SetupFailed { error_text, .. } | Self::Failed { error_text } => Some(error_text),
        }
    }

    pub(crate) fn failed(error_text: impl Into<String>) -> Self {
        Self::Failed {
            error_text: error_text.into(),
        }
    }
}
