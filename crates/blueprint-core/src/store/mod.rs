//! Plan persistence.
//!
//! The database row is the system of record. Saving is an upsert keyed by
//! plan id (last write wins); plans are never deleted here.

pub mod memory;
pub mod pg;
pub mod username;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::plan::GeneratedPlan;

pub use memory::MemoryPlanStore;
pub use pg::PgPlanStore;
pub use username::plan_username;

/// A plan as persisted, with the bookkeeping the store adds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlan {
    pub plan: GeneratedPlan,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert or overwrite the plan with `plan.id`.
    async fn save(&self, plan: &GeneratedPlan) -> Result<StoredPlan>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredPlan>>;

    /// The most recently created plan.
    async fn latest(&self) -> Result<Option<StoredPlan>>;

    /// Every plan, newest first.
    async fn list(&self) -> Result<Vec<StoredPlan>>;

    /// Plans refined directly from `parent_id`, oldest version first.
    async fn refinements(&self, parent_id: Uuid) -> Result<Vec<StoredPlan>>;

    /// Move a draft plan to approved. Fails for unknown or approved plans.
    async fn approve(&self, id: Uuid) -> Result<StoredPlan>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};

/// What [`persist_with_fallback`] ended up storing.
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    pub stored: StoredPlan,
    /// True when the full plan failed and the simplified one was saved.
    pub simplified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to save plan {plan_id}: {primary:#}; retry with simplified plan also failed: {retry:#}")]
    Failed {
        plan_id: Uuid,
        primary: anyhow::Error,
        retry: anyhow::Error,
    },
}

/// Save `plan`, retrying once with [`GeneratedPlan::simplified`] on failure.
pub async fn persist_with_fallback(
    store: &dyn PlanStore,
    plan: &GeneratedPlan,
) -> Result<PersistOutcome, PersistError> {
    let primary = match store.save(plan).await {
        Ok(stored) => {
            return Ok(PersistOutcome {
                stored,
                simplified: false,
            });
        }
        Err(e) => e,
    };

    warn!(plan_id = %plan.id, error = %format!("{primary:#}"), "saving plan failed; retrying with simplified plan");

    match store.save(&plan.simplified()).await {
        Ok(stored) => {
            info!(plan_id = %plan.id, "simplified plan saved");
            Ok(PersistOutcome {
                stored,
                simplified: true,
            })
        }
        Err(retry) => Err(PersistError::Failed {
            plan_id: plan.id,
            primary,
            retry,
        }),
    }
}
