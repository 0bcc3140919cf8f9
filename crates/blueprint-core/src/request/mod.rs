//! Input assembly: shape saved onboarding answers into a [`PlanRequest`].
//!
//! Assembly is a pure read-and-shape step. A missing onboarding record means
//! "nothing to generate" and yields `None`; blank answers are replaced by
//! neutral defaults so downstream prompts never see empty fields.

pub mod source;

use serde::{Deserialize, Serialize};

use blueprint_db::models::OnboardingResponse;

pub use source::{OnboardingSource, PgOnboardingSource, assemble_request};

/// Fallback business name when neither onboarding nor profile has one.
pub const DEFAULT_BUSINESS_NAME: &str = "My Business";
/// Fallback industry; matches no industry template.
pub const DEFAULT_INDUSTRY: &str = "General";
pub const DEFAULT_APP_PURPOSE: &str = "business management";
pub const DEFAULT_TARGET_AUDIENCE: &str = "general customers";

/// Normalized input to one generation attempt.
///
/// Serialized camelCase: this is the `businessData` object of the remote
/// endpoint contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub business_name: String,
    pub app_purpose: String,
    pub industry: String,
    pub target_audience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_preference: Option<String>,
}

/// Raw onboarding answers as saved by the onboarding flow. Every field may be
/// missing or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingData {
    pub business_name: Option<String>,
    pub app_purpose: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub communication_preference: Option<String>,
}

impl From<&OnboardingResponse> for OnboardingData {
    fn from(row: &OnboardingResponse) -> Self {
        Self {
            business_name: Some(row.business_name.clone()),
            app_purpose: Some(row.app_purpose.clone()),
            industry: Some(row.industry.clone()),
            target_audience: Some(row.target_audience.clone()),
            budget: row.budget.clone(),
            timeline: row.timeline.clone(),
            communication_preference: row.communication_preference.clone(),
        }
    }
}

impl From<&PlanRequest> for OnboardingData {
    fn from(req: &PlanRequest) -> Self {
        Self {
            business_name: Some(req.business_name.clone()),
            app_purpose: Some(req.app_purpose.clone()),
            industry: Some(req.industry.clone()),
            target_audience: Some(req.target_audience.clone()),
            budget: req.budget.clone(),
            timeline: req.timeline.clone(),
            communication_preference: req.communication_preference.clone(),
        }
    }
}

/// The client profile kept alongside onboarding answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientProfile {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub contact_email: Option<String>,
}

/// Build a request from saved onboarding answers.
///
/// Returns `None` when there is no onboarding record. The client profile
/// only fills gaps (company name, industry).
pub fn build_request(
    onboarding: Option<&OnboardingData>,
    profile: Option<&ClientProfile>,
) -> Option<PlanRequest> {
    let data = onboarding?;
    let profile_name = profile.and_then(|p| normalize(p.company_name.as_deref()));
    let profile_industry = profile.and_then(|p| normalize(p.industry.as_deref()));

    Some(PlanRequest {
        business_name: normalize(data.business_name.as_deref())
            .or(profile_name)
            .unwrap_or_else(|| DEFAULT_BUSINESS_NAME.to_owned()),
        app_purpose: normalize(data.app_purpose.as_deref())
            .unwrap_or_else(|| DEFAULT_APP_PURPOSE.to_owned()),
        industry: normalize(data.industry.as_deref())
            .or(profile_industry)
            .unwrap_or_else(|| DEFAULT_INDUSTRY.to_owned()),
        target_audience: normalize(data.target_audience.as_deref())
            .unwrap_or_else(|| DEFAULT_TARGET_AUDIENCE.to_owned()),
        budget: normalize(data.budget.as_deref()),
        timeline: normalize(data.timeline.as_deref()),
        communication_preference: normalize(data.communication_preference.as_deref()),
    })
}

/// Trim and collapse internal whitespace; blank becomes `None`.
fn normalize(value: Option<&str>) -> Option<String> {
    let joined = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> OnboardingData {
        OnboardingData {
            business_name: Some("  Acme   Bistro ".to_string()),
            app_purpose: Some("table booking".to_string()),
            industry: Some("Restaurant".to_string()),
            target_audience: Some("diners".to_string()),
            budget: Some("  ".to_string()),
            timeline: Some("3 months".to_string()),
            communication_preference: None,
        }
    }

    #[test]
    fn no_onboarding_means_nothing_to_generate() {
        let profile = ClientProfile {
            company_name: Some("Acme".to_string()),
            ..Default::default()
        };
        assert!(build_request(None, Some(&profile)).is_none());
    }

    #[test]
    fn normalizes_whitespace_and_blank_optionals() {
        let req = build_request(Some(&acme()), None).unwrap();
        assert_eq!(req.business_name, "Acme Bistro");
        assert_eq!(req.budget, None);
        assert_eq!(req.timeline.as_deref(), Some("3 months"));
    }

    #[test]
    fn profile_fills_missing_name_and_industry() {
        let data = OnboardingData {
            business_name: Some(String::new()),
            industry: None,
            ..acme()
        };
        let profile = ClientProfile {
            company_name: Some("Acme Corp".to_string()),
            industry: Some("Retail".to_string()),
            contact_email: None,
        };
        let req = build_request(Some(&data), Some(&profile)).unwrap();
        assert_eq!(req.business_name, "Acme Corp");
        assert_eq!(req.industry, "Retail");
    }

    #[test]
    fn onboarding_wins_over_profile() {
        let profile = ClientProfile {
            company_name: Some("Other".to_string()),
            industry: Some("Retail".to_string()),
            contact_email: None,
        };
        let req = build_request(Some(&acme()), Some(&profile)).unwrap();
        assert_eq!(req.business_name, "Acme Bistro");
        assert_eq!(req.industry, "Restaurant");
    }

    #[test]
    fn empty_record_gets_defaults() {
        let req = build_request(Some(&OnboardingData::default()), None).unwrap();
        assert_eq!(req.business_name, DEFAULT_BUSINESS_NAME);
        assert_eq!(req.industry, DEFAULT_INDUSTRY);
        assert_eq!(req.app_purpose, DEFAULT_APP_PURPOSE);
        assert_eq!(req.target_audience, DEFAULT_TARGET_AUDIENCE);
    }

    #[test]
    fn request_serializes_as_business_data() {
        let req = build_request(Some(&acme()), None).unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["businessName"], "Acme Bistro");
        assert_eq!(json["targetAudience"], "diners");
        assert!(json.get("budget").is_none());
    }

    #[test]
    fn onboarding_json_accepts_partial_objects() {
        let data: OnboardingData =
            serde_json::from_str(r#"{"businessName":"Acme","industry":"Restaurant"}"#).unwrap();
        assert_eq!(data.business_name.as_deref(), Some("Acme"));
        assert!(data.app_purpose.is_none());
    }
}
