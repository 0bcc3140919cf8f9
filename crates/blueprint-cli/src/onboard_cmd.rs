//! `blueprint onboard`: record the business questionnaire answers.

use anyhow::Result;
use sqlx::PgPool;

use blueprint_core::cache::PlanCache;
use blueprint_core::request::{ClientProfile, OnboardingData};
use blueprint_core::templates::{available_industries, find_template};
use blueprint_db::queries::onboarding::{self, NewOnboarding};

pub struct OnboardArgs {
    pub business_name: String,
    pub app_purpose: String,
    pub industry: String,
    pub target_audience: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub communication: Option<String>,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
}

impl OnboardArgs {
    /// The client profile to keep next to the answers. The company name
    /// defaults to the business name.
    pub fn client_profile(&self) -> ClientProfile {
        let company = self
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.business_name.trim());
        ClientProfile {
            company_name: Some(company.to_string()),
            industry: Some(self.industry.trim().to_string()),
            contact_email: self
                .contact_email
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Insert the answers into the database and mirror them into the cache.
pub async fn run_onboard(pool: &PgPool, cache: Option<&PlanCache>, args: &OnboardArgs) -> Result<()> {
    let row = onboarding::insert_onboarding(
        pool,
        &NewOnboarding {
            business_name: args.business_name.trim(),
            app_purpose: args.app_purpose.trim(),
            industry: args.industry.trim(),
            target_audience: args.target_audience.trim(),
            budget: args.budget.as_deref(),
            timeline: args.timeline.as_deref(),
            communication_preference: args.communication.as_deref(),
        },
    )
    .await?;

    if let Some(cache) = cache {
        cache.save_onboarding(&OnboardingData::from(&row));
        cache.save_profile(&args.client_profile());
    }

    println!("Onboarding saved.");
    println!();
    println!("  ID:        {}", row.id);
    println!("  Business:  {}", row.business_name);
    println!("  Industry:  {}", row.industry);
    println!("  Purpose:   {}", row.app_purpose);
    println!("  Audience:  {}", row.target_audience);
    if let Some(note) = template_note(&row.industry) {
        println!();
        println!("{note}");
    }
    println!();
    println!("Next: run `blueprint generate` to build an app plan.");

    Ok(())
}

/// A hint for industries without a dedicated offline template.
pub fn template_note(industry: &str) -> Option<String> {
    if find_template(industry).is_some() {
        return None;
    }
    Some(format!(
        "Note: no dedicated template for {:?}; offline plans use the general template.\n      Templates exist for: {}.",
        industry.trim(),
        available_industries().join(", ")
    ))
}
