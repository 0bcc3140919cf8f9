use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Review status of a stored plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Approved,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
        })
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            other => Err(PlanStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid plan status: {0:?}")]
pub struct PlanStatusParseError(pub String);

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A row of `app_plans`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppPlan {
    pub id: Uuid,
    pub app_name: String,
    pub company_name: String,
    pub description: String,
    pub features: Vec<String>,
    pub research_results: serde_json::Value,
    /// The full structured plan document.
    pub plan: serde_json::Value,
    pub username: String,
    pub status: PlanStatus,
    pub version: i32,
    pub parent_id: Option<Uuid>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// A row of `onboarding_responses`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnboardingResponse {
    pub id: Uuid,
    pub business_name: String,
    pub app_purpose: String,
    pub industry: String,
    pub target_audience: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub communication_preference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row of `token_usage`: one counter per calendar day (UTC).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenUsage {
    pub usage_date: NaiveDate,
    pub tokens_used: i64,
    pub request_count: i32,
    pub updated_at: DateTime<Utc>,
}
