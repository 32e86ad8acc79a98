//! Request bodies derived from a [`TrialStage`].

use crate::models::{
    ApprovalType, CreateTrialRequest, EndTime, HistogramId, RegistrationConfig, TrialPayload,
    TrialStage, TrialType, UseCounterConfig,
};

pub const WEBDX_FEATURE_PREFIX: &str = "WebDXFeature::";
pub const CSS_SAMPLE_ID_PREFIX: &str = "CSSSampleId::";
pub const TRIAL_CONTACT_DOMAIN: &str = "@google.com";

#[must_use]
pub fn histogram_id_for(use_counter: Option<&str>) -> HistogramId {
    match use_counter {
        Some(name) if name.starts_with(WEBDX_FEATURE_PREFIX) => HistogramId::WebDxFeature,
        Some(name) if name.starts_with(CSS_SAMPLE_ID_PREFIX) => HistogramId::CssPropertyId,
        _ => HistogramId::WebFeature,
    }
}

/// Owner plus contact emails, deduplicated in first-seen order and limited to
/// addresses in [`TRIAL_CONTACT_DOMAIN`].
#[must_use]
pub fn trial_contacts(stage: &TrialStage) -> Vec<String> {
    let mut contacts: Vec<String> = Vec::new();
    for email in stage.owner_email.iter().chain(stage.emails.iter()) {
        let email = email.trim();
        if !email.ends_with(TRIAL_CONTACT_DOMAIN) {
            continue;
        }
        if contacts.iter().any(|existing| existing == email) {
            continue;
        }
        contacts.push(email.to_string());
    }
    contacts
}

#[must_use]
pub fn chromestatus_url(site_url: &str, feature_id: i64) -> String {
    format!("{site_url}feature/{feature_id}")
}

#[must_use]
pub fn build_create_trial_request(
    stage: &TrialStage,
    end_milestone: u32,
    end_seconds: i64,
    site_url: &str,
) -> CreateTrialRequest {
    let trial_type = if stage.is_deprecation_trial {
        TrialType::Deprecation
    } else {
        TrialType::OriginTrial
    };

    let trial = TrialPayload {
        display_name: stage.display_name.clone(),
        start_milestone: stage.milestones.desktop_first.map(|m| m.to_string()),
        end_milestone: end_milestone.to_string(),
        end_time: EndTime {
            seconds: end_seconds,
        },
        description: stage.description.clone(),
        documentation_url: stage.documentation_url.clone(),
        feedback_url: stage.feedback_submission_url.clone(),
        intent_to_experiment_url: stage.intent_thread_url.clone(),
        chromestatus_url: chromestatus_url(site_url, stage.feature_id),
        allow_third_party_origins: stage.has_third_party_support,
        trial_type,
        blink_use_counter_config: UseCounterConfig {
            bucket_number: stage.use_counter_bucket_number,
            histogram_id: histogram_id_for(stage.webfeature_use_counter.as_deref()),
        },
    };

    let registration_config = if stage.require_approvals {
        RegistrationConfig {
            allow_public_suffix_subdomains: true,
            approval_type: ApprovalType::Custom,
            approval_buganizer_component_id: stage.approval_buganizer_component,
            approval_criteria_url: stage.approval_criteria_url.clone(),
            approval_group_email: stage.approval_group_email.clone(),
            approval_buganizer_custom_field_id: stage.approval_buganizer_custom_field_id,
        }
    } else {
        RegistrationConfig {
            allow_public_suffix_subdomains: true,
            approval_type: ApprovalType::NotRequired,
            approval_buganizer_component_id: None,
            approval_criteria_url: None,
            approval_group_email: None,
            approval_buganizer_custom_field_id: None,
        }
    };

    CreateTrialRequest {
        trial,
        registration_config,
    }
}
