//! Builds the plan service from resolved configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use blueprint_core::budget::{PgUsageLedger, TokenBudget};
use blueprint_core::cache::PlanCache;
use blueprint_core::endpoint::{
    AnthropicEndpoint, EndpointCall, EndpointError, EndpointReply, GenerationEndpoint,
    HttpEndpoint,
};
use blueprint_core::orchestrator::Orchestrator;
use blueprint_core::plan::CostModel;
use blueprint_core::plan::cost::DEFAULT_CURRENCY;
use blueprint_core::service::PlanService;
use blueprint_core::store::PgPlanStore;
use blueprint_core::structurer::Structurer;

use crate::config::{BlueprintConfig, CacheConfig, EndpointKind, GenerationConfig};

/// Endpoint used when no remote service is configured: every call fails,
/// so the orchestrator always takes the template path.
pub struct OfflineEndpoint;

#[async_trait]
impl GenerationEndpoint for OfflineEndpoint {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError> {
        Err(EndpointError::Connect(
            "no generation endpoint configured".to_string(),
        ))
    }
}

pub fn build_endpoint(config: &GenerationConfig) -> Result<Arc<dyn GenerationEndpoint>> {
    let endpoint: Arc<dyn GenerationEndpoint> = match config.endpoint {
        EndpointKind::Edge => {
            let url = config
                .url
                .clone()
                .context("edge endpoint requires a URL")?;
            Arc::new(
                HttpEndpoint::new(url, config.api_key.clone(), config.timeout)
                    .context("failed to build edge endpoint client")?,
            )
        }
        EndpointKind::Anthropic => {
            let key = config
                .api_key
                .clone()
                .context("anthropic endpoint requires an API key")?;
            let mut endpoint = AnthropicEndpoint::new(key, config.timeout)
                .context("failed to build anthropic client")?;
            if let Some(model) = &config.model {
                endpoint = endpoint.with_model(model.clone());
            }
            if let Some(url) = &config.url {
                endpoint = endpoint.with_base_url(url.clone());
            }
            Arc::new(endpoint)
        }
        EndpointKind::Local => Arc::new(OfflineEndpoint),
    };
    info!(endpoint = endpoint.name(), "generation endpoint ready");
    Ok(endpoint)
}

pub fn build_cache(config: &CacheConfig) -> Option<PlanCache> {
    config
        .dir
        .as_ref()
        .map(|dir| PlanCache::new(dir.clone(), config.ttl))
}

/// Wire a Postgres-backed service from `config`.
pub fn build_service(config: &BlueprintConfig, pool: PgPool) -> Result<PlanService> {
    let endpoint = build_endpoint(&config.generation)?;
    let orchestrator = Orchestrator::new(
        endpoint,
        Arc::new(PgUsageLedger::new(pool.clone())),
        TokenBudget::new(config.generation.daily_token_limit),
    );
    let structurer = Structurer::new(CostModel::new(
        config.generation.hourly_rate,
        DEFAULT_CURRENCY,
    ));
    let service = PlanService::new(orchestrator, structurer, Arc::new(PgPlanStore::new(pool)));
    Ok(match build_cache(&config.cache) {
        Some(cache) => service.with_cache(cache),
        None => service,
    })
}
