//! The plan service: one explicitly constructed object that runs the whole
//! pipeline and owns the store and cache handles.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::cache::PlanCache;
use crate::orchestrator::{Orchestrator, RawGeneration};
use crate::plan::{GeneratedPlan, PlanRefinement, RefineError};
use crate::prompt::{GenerateOptions, OptionsError};
use crate::request::PlanRequest;
use crate::store::{PersistError, PlanStore, StoredPlan, persist_with_fallback};
use crate::structurer::Structurer;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("plan {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A freshly generated plan and the raw text it came from.
#[derive(Debug, Clone)]
pub struct Generation {
    pub plan: GeneratedPlan,
    pub raw: RawGeneration,
}

/// A generation that has been persisted.
#[derive(Debug, Clone)]
pub struct StoredGeneration {
    pub raw: RawGeneration,
    pub stored: StoredPlan,
    /// True when only the simplified plan could be saved.
    pub simplified: bool,
}

pub struct PlanService {
    orchestrator: Orchestrator,
    structurer: Structurer,
    store: Arc<dyn PlanStore>,
    cache: Option<PlanCache>,
}

impl PlanService {
    pub fn new(orchestrator: Orchestrator, structurer: Structurer, store: Arc<dyn PlanStore>) -> Self {
        Self {
            orchestrator,
            structurer,
            store,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: PlanCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&PlanCache> {
        self.cache.as_ref()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Orchestrate, structure, and stamp a plan without persisting it.
    pub async fn generate_plan(
        &self,
        request: &PlanRequest,
        options: &GenerateOptions,
    ) -> Result<Generation, ServiceError> {
        let raw = self.orchestrator.generate(request, options).await?;

        let mut draft = self.structurer.structure(&raw.features.text, request);
        if let Some(research) = &raw.research {
            draft
                .research_results
                .merge(self.structurer.structure_research(&research.text, request));
        }
        let source = draft.source;
        let plan = GeneratedPlan::from_draft(draft, request, &raw.model_used());

        info!(
            plan_id = %plan.id,
            business = %plan.business_name,
            features = plan.features.len(),
            ?source,
            fallback = raw.features.is_fallback(),
            "plan generated"
        );
        Ok(Generation { plan, raw })
    }

    /// Generate, persist (with the simplified retry), and refresh the cache.
    pub async fn generate_and_store(
        &self,
        request: &PlanRequest,
        options: &GenerateOptions,
    ) -> Result<StoredGeneration, ServiceError> {
        let Generation { plan, raw } = self.generate_plan(request, options).await?;
        let outcome = persist_with_fallback(self.store.as_ref(), &plan).await?;
        if let Some(cache) = &self.cache {
            cache.record_plan(&outcome.stored.plan);
        }
        Ok(StoredGeneration {
            raw,
            stored: outcome.stored,
            simplified: outcome.simplified,
        })
    }

    /// Store a refined copy of plan `id` as the next version.
    pub async fn refine_plan(
        &self,
        id: Uuid,
        refinement: &PlanRefinement,
    ) -> Result<StoredPlan, ServiceError> {
        let parent = self.store.get(id).await?.ok_or(ServiceError::NotFound(id))?;
        let child = parent
            .plan
            .refine(refinement, self.structurer.cost_model())?;
        let outcome = persist_with_fallback(self.store.as_ref(), &child).await?;
        if let Some(cache) = &self.cache {
            cache.record_plan(&outcome.stored.plan);
        }
        info!(parent_id = %id, plan_id = %child.id, version = child.version, "plan refined");
        Ok(outcome.stored)
    }

    pub async fn approve_plan(&self, id: Uuid) -> Result<StoredPlan, ServiceError> {
        if self.store.get(id).await?.is_none() {
            return Err(ServiceError::NotFound(id));
        }
        let stored = self.store.approve(id).await?;
        // The cached copy still says draft; the next read refetches.
        if let Some(cache) = &self.cache {
            cache.invalidate_latest();
        }
        info!(plan_id = %id, "plan approved");
        Ok(stored)
    }

    /// Latest plan, served from the cache when fresh.
    pub async fn latest_plan(&self) -> Result<Option<GeneratedPlan>, ServiceError> {
        match &self.cache {
            Some(cache) => Ok(cache.latest_or_fetch(self.store.as_ref()).await?),
            None => Ok(self.store.latest().await?.map(|s| s.plan)),
        }
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<StoredPlan, ServiceError> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    pub async fn list_plans(&self) -> Result<Vec<StoredPlan>, ServiceError> {
        Ok(self.store.list().await?)
    }

    /// Versions refined from plan `id`. Unknown ids are `NotFound`.
    pub async fn refinements(&self, id: Uuid) -> Result<Vec<StoredPlan>, ServiceError> {
        self.get_plan(id).await?;
        Ok(self.store.refinements(id).await?)
    }
}
