//! Database query functions for the `onboarding_responses` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::OnboardingResponse;

/// Answers to store for one completed onboarding flow.
#[derive(Debug, Clone, Default)]
pub struct NewOnboarding<'a> {
    pub business_name: &'a str,
    pub app_purpose: &'a str,
    pub industry: &'a str,
    pub target_audience: &'a str,
    pub budget: Option<&'a str>,
    pub timeline: Option<&'a str>,
    pub communication_preference: Option<&'a str>,
}

/// Insert a new onboarding response.
pub async fn insert_onboarding(
    pool: &PgPool,
    new: &NewOnboarding<'_>,
) -> Result<OnboardingResponse> {
    let row = sqlx::query_as::<_, OnboardingResponse>(
        "INSERT INTO onboarding_responses \
             (business_name, app_purpose, industry, target_audience, budget, timeline, \
              communication_preference) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(new.business_name)
    .bind(new.app_purpose)
    .bind(new.industry)
    .bind(new.target_audience)
    .bind(new.budget)
    .bind(new.timeline)
    .bind(new.communication_preference)
    .fetch_one(pool)
    .await
    .context("failed to insert onboarding response")?;

    Ok(row)
}

/// The most recent onboarding response, if any.
pub async fn latest_onboarding(pool: &PgPool) -> Result<Option<OnboardingResponse>> {
    let row = sqlx::query_as::<_, OnboardingResponse>(
        "SELECT * FROM onboarding_responses ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest onboarding response")?;

    Ok(row)
}
