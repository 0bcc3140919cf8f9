//! Postgres-backed plan store over the `app_plans` table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use blueprint_db::models::AppPlan;
use blueprint_db::queries::plans::{self as plan_db, NewAppPlan};

use crate::plan::GeneratedPlan;

use super::{PlanStore, StoredPlan, plan_username};

#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Rebuild the plan from its row. Row columns win over the stored document
/// for lifecycle fields, since approval updates the columns.
fn stored_from_row(row: AppPlan) -> Result<StoredPlan> {
    let mut plan: GeneratedPlan = serde_json::from_value(row.plan)
        .with_context(|| format!("plan {} has an unreadable plan document", row.id))?;
    plan.status = row.status;
    plan.version = row.version;
    plan.parent_id = row.parent_id;
    Ok(StoredPlan {
        plan,
        username: row.username,
        created_at: row.created_at,
        approved_at: row.approved_at,
    })
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn save(&self, plan: &GeneratedPlan) -> Result<StoredPlan> {
        let features = plan.feature_names();
        let research = serde_json::to_value(&plan.research_results)
            .context("failed to serialize research results")?;
        let document = serde_json::to_value(plan).context("failed to serialize plan")?;
        let username = plan_username(&plan.business_name, plan.generated_at);

        let row = plan_db::upsert_plan(
            &self.pool,
            &NewAppPlan {
                id: plan.id,
                app_name: &plan.app_name,
                company_name: &plan.business_name,
                description: &plan.description,
                features: &features,
                research_results: &research,
                plan: &document,
                username: &username,
                status: plan.status,
                version: plan.version,
                parent_id: plan.parent_id,
                model_used: &plan.model_used,
            },
        )
        .await?;

        stored_from_row(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredPlan>> {
        plan_db::get_plan(&self.pool, id)
            .await?
            .map(stored_from_row)
            .transpose()
    }

    async fn latest(&self) -> Result<Option<StoredPlan>> {
        plan_db::latest_plan(&self.pool)
            .await?
            .map(stored_from_row)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<StoredPlan>> {
        plan_db::list_plans(&self.pool)
            .await?
            .into_iter()
            .map(stored_from_row)
            .collect()
    }

    async fn refinements(&self, parent_id: Uuid) -> Result<Vec<StoredPlan>> {
        plan_db::list_refinements(&self.pool, parent_id)
            .await?
            .into_iter()
            .map(stored_from_row)
            .collect()
    }

    async fn approve(&self, id: Uuid) -> Result<StoredPlan> {
        let row = plan_db::approve_plan(&self.pool, id).await?;
        stored_from_row(row)
    }
}
