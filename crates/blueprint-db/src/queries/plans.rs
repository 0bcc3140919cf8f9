//! Database query functions for the `app_plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AppPlan, PlanStatus};

/// Column values for writing a plan row.
#[derive(Debug, Clone)]
pub struct NewAppPlan<'a> {
    pub id: Uuid,
    pub app_name: &'a str,
    pub company_name: &'a str,
    pub description: &'a str,
    pub features: &'a [String],
    pub research_results: &'a serde_json::Value,
    pub plan: &'a serde_json::Value,
    pub username: &'a str,
    pub status: PlanStatus,
    pub version: i32,
    pub parent_id: Option<Uuid>,
    pub model_used: &'a str,
}

/// Insert or overwrite a plan row keyed by id.
///
/// Concurrent writers to the same id are not coordinated: the last write
/// wins. `created_at` and `username` keep their original values on update.
pub async fn upsert_plan(pool: &PgPool, new: &NewAppPlan<'_>) -> Result<AppPlan> {
    let plan = sqlx::query_as::<_, AppPlan>(
        "INSERT INTO app_plans \
             (id, app_name, company_name, description, features, research_results, plan, \
              username, status, version, parent_id, model_used) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (id) DO UPDATE SET \
             app_name = EXCLUDED.app_name, \
             company_name = EXCLUDED.company_name, \
             description = EXCLUDED.description, \
             features = EXCLUDED.features, \
             research_results = EXCLUDED.research_results, \
             plan = EXCLUDED.plan, \
             status = EXCLUDED.status, \
             version = EXCLUDED.version, \
             parent_id = EXCLUDED.parent_id, \
             model_used = EXCLUDED.model_used \
         RETURNING *",
    )
    .bind(new.id)
    .bind(new.app_name)
    .bind(new.company_name)
    .bind(new.description)
    .bind(new.features)
    .bind(new.research_results)
    .bind(new.plan)
    .bind(new.username)
    .bind(new.status)
    .bind(new.version)
    .bind(new.parent_id)
    .bind(new.model_used)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert plan {}", new.id))?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<AppPlan>> {
    let plan = sqlx::query_as::<_, AppPlan>("SELECT * FROM app_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// The most recently created plan, if any.
pub async fn latest_plan(pool: &PgPool) -> Result<Option<AppPlan>> {
    let plan = sqlx::query_as::<_, AppPlan>(
        "SELECT * FROM app_plans ORDER BY created_at DESC, version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest plan")?;

    Ok(plan)
}

/// List all plans, newest first.
pub async fn list_plans(pool: &PgPool) -> Result<Vec<AppPlan>> {
    let plans =
        sqlx::query_as::<_, AppPlan>("SELECT * FROM app_plans ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
            .context("failed to list plans")?;

    Ok(plans)
}

/// List every version refined from `parent_id`, oldest first.
pub async fn list_refinements(pool: &PgPool, parent_id: Uuid) -> Result<Vec<AppPlan>> {
    let plans = sqlx::query_as::<_, AppPlan>(
        "SELECT * FROM app_plans WHERE parent_id = $1 ORDER BY version ASC, created_at ASC",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await
    .context("failed to list plan refinements")?;

    Ok(plans)
}

/// Transition a plan from `draft` to `approved`, setting `approved_at`.
///
/// The `status` field inside the `plan` document is updated too so both
/// views agree. Fails if the plan does not exist or is already approved.
pub async fn approve_plan(pool: &PgPool, id: Uuid) -> Result<AppPlan> {
    let plan = sqlx::query_as::<_, AppPlan>(
        "UPDATE app_plans \
         SET status = 'approved', \
             approved_at = now(), \
             plan = jsonb_set(plan, '{status}', '\"approved\"'::jsonb) \
         WHERE id = $1 AND status = 'draft' \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to approve plan")?;

    match plan {
        Some(p) => Ok(p),
        None => match get_plan(pool, id).await? {
            None => anyhow::bail!("plan {id} not found"),
            Some(p) => anyhow::bail!(
                "plan {id} cannot be approved: current status is {:?} (must be draft)",
                p.status.to_string()
            ),
        },
    }
}
