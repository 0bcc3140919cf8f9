//! In-process plan store.

use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::plan::{GeneratedPlan, PlanStatus};

use super::{PlanStore, StoredPlan, plan_username};

/// Keeps plans in insertion order behind a mutex. Same semantics as the
/// Postgres store: upsert by id, username and creation time fixed on first
/// save.
#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: Mutex<Vec<StoredPlan>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredPlan>>> {
        self.plans
            .lock()
            .map_err(|_| anyhow!("plan store lock poisoned"))
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn save(&self, plan: &GeneratedPlan) -> Result<StoredPlan> {
        let mut plans = self.lock()?;
        if let Some(existing) = plans.iter_mut().find(|p| p.plan.id == plan.id) {
            existing.plan = plan.clone();
            return Ok(existing.clone());
        }
        let stored = StoredPlan {
            plan: plan.clone(),
            username: plan_username(&plan.business_name, plan.generated_at),
            created_at: Utc::now(),
            approved_at: None,
        };
        plans.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredPlan>> {
        Ok(self.lock()?.iter().find(|p| p.plan.id == id).cloned())
    }

    async fn latest(&self) -> Result<Option<StoredPlan>> {
        Ok(self
            .lock()?
            .iter()
            .max_by_key(|p| (p.created_at, p.plan.version))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<StoredPlan>> {
        let mut plans = self.lock()?.clone();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn refinements(&self, parent_id: Uuid) -> Result<Vec<StoredPlan>> {
        let mut children: Vec<StoredPlan> = self
            .lock()?
            .iter()
            .filter(|p| p.plan.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|p| (p.plan.version, p.created_at));
        Ok(children)
    }

    async fn approve(&self, id: Uuid) -> Result<StoredPlan> {
        let mut plans = self.lock()?;
        let Some(stored) = plans.iter_mut().find(|p| p.plan.id == id) else {
            bail!("plan {id} not found");
        };
        if stored.plan.status != PlanStatus::Draft {
            bail!(
                "plan {id} cannot be approved: current status is {:?} (must be draft)",
                stored.plan.status.to_string()
            );
        }
        stored.plan.approve();
        stored.approved_at = Some(Utc::now());
        Ok(stored.clone())
    }
}
