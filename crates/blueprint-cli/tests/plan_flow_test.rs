//! Integration tests for the onboard -> generate -> refine -> approve flow
//! the `blueprint` commands drive, against a real PostgreSQL instance. Each
//! test creates an isolated temporary database and drops it on completion.

use std::sync::Arc;

use async_trait::async_trait;

use blueprint_core::budget::{PgUsageLedger, TokenBudget, UsageLedger};
use blueprint_core::cache::{DEFAULT_TTL, PlanCache};
use blueprint_core::endpoint::{
    EndpointCall, EndpointError, EndpointReply, GenerationEndpoint, PromptKind, Usage,
};
use blueprint_core::orchestrator::Orchestrator;
use blueprint_core::plan::{PlanRefinement, PlanStatus};
use blueprint_core::prompt::GenerateOptions;
use blueprint_core::request::{OnboardingSource, PgOnboardingSource, assemble_request};
use blueprint_core::service::{PlanService, ServiceError};
use blueprint_core::store::PgPlanStore;
use blueprint_core::structurer::Structurer;
use blueprint_db::queries::onboarding::{NewOnboarding, insert_onboarding};
use blueprint_db::queries::{plans as plan_db, token_usage};
use blueprint_test_utils::{create_test_db, drop_test_db};

/// Answers both branches with fixed text and reports token usage.
struct Scripted;

#[async_trait]
impl GenerationEndpoint for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, call: &EndpointCall<'_>) -> Result<EndpointReply, EndpointError> {
        let text = match call.kind {
            PromptKind::Features => serde_json::json!({
                "features": [
                    {"name": "Class Booking", "description": "Members reserve spots in classes", "complexity": "moderate"},
                    {"name": "Trainer Profiles", "description": "Bios and schedules for each trainer", "complexity": "simple"},
                    {"name": "Membership Billing", "description": "Recurring payments for plans", "complexity": "complex"}
                ]
            })
            .to_string(),
            PromptKind::Research => {
                "Industry Analysis\nBoutique studios compete on community.\n\n\
                 Market Trends\nHybrid online classes keep growing."
                    .to_string()
            }
        };
        Ok(EndpointReply {
            text,
            model: Some("scripted-1".to_string()),
            usage: Some(Usage {
                input_tokens: 100,
                output_tokens: 50,
            }),
        })
    }
}

fn service(pool: &sqlx::PgPool, endpoint: Arc<dyn GenerationEndpoint>) -> PlanService {
    let orchestrator = Orchestrator::new(
        endpoint,
        Arc::new(PgUsageLedger::new(pool.clone())),
        TokenBudget::default(),
    );
    PlanService::new(
        orchestrator,
        Structurer::default(),
        Arc::new(PgPlanStore::new(pool.clone())),
    )
}

async fn onboard(pool: &sqlx::PgPool) {
    insert_onboarding(
        pool,
        &NewOnboarding {
            business_name: "Gym Co",
            app_purpose: "class booking",
            industry: "Fitness",
            target_audience: "members",
            timeline: Some("3 months"),
            ..Default::default()
        },
    )
    .await
    .expect("insert_onboarding should succeed");
}

#[tokio::test]
async fn generate_refine_approve() {
    let (pool, db_name) = create_test_db().await;
    onboard(&pool).await;

    let source = PgOnboardingSource::new(pool.clone());
    let request = assemble_request(&[&source as &dyn OnboardingSource])
        .await
        .expect("onboarding row should produce a request");
    assert_eq!(request.business_name, "Gym Co");

    let svc = service(&pool, Arc::new(Scripted));
    let stored = svc
        .generate_and_store(&request, &GenerateOptions::default())
        .await
        .expect("generation should succeed");
    let plan = &stored.stored.plan;
    assert_eq!(plan.model_used, "scripted-1");
    assert_eq!(plan.feature_names(), vec!["Class Booking", "Trainer Profiles", "Membership Billing"]);
    assert_eq!(plan.research_results.industry_analysis.len(), 1);
    assert_eq!(plan.research_results.market_trends.len(), 1);

    // Both branches recorded their usage.
    let today = chrono::Utc::now().date_naive();
    let usage = token_usage::get_usage(&pool, today).await.unwrap().unwrap();
    assert_eq!(usage.tokens_used, 300);
    assert_eq!(usage.request_count, 2);

    let child = svc
        .refine_plan(
            plan.id,
            &PlanRefinement {
                add_features: vec!["Progress Tracking".to_string()],
                remove_features: vec!["Trainer Profiles".to_string()],
            },
        )
        .await
        .expect("refine should succeed");
    assert_eq!(child.plan.version, 2);
    assert_eq!(child.plan.parent_id, Some(plan.id));
    assert!(child.plan.cost_breakdown.is_balanced());

    let approved = svc.approve_plan(child.plan.id).await.unwrap();
    assert_eq!(approved.plan.status, PlanStatus::Approved);

    // The row and the stored document agree.
    let row = plan_db::get_plan(&pool, child.plan.id).await.unwrap().unwrap();
    assert_eq!(row.status, PlanStatus::Approved);
    assert_eq!(row.plan["status"], "approved");
    assert_eq!(row.features, child.plan.feature_names());

    assert_eq!(svc.list_plans().await.unwrap().len(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn exhausted_budget_generates_from_template() {
    let (pool, db_name) = create_test_db().await;
    onboard(&pool).await;

    let ledger = PgUsageLedger::new(pool.clone());
    ledger
        .record(chrono::Utc::now().date_naive(), 10_000)
        .await
        .unwrap();

    let orchestrator = Orchestrator::new(
        Arc::new(Scripted),
        Arc::new(ledger),
        TokenBudget::new(10_000),
    );
    let svc = PlanService::new(
        orchestrator,
        Structurer::default(),
        Arc::new(PgPlanStore::new(pool.clone())),
    );

    let source = PgOnboardingSource::new(pool.clone());
    let request = assemble_request(&[&source as &dyn OnboardingSource])
        .await
        .unwrap();
    let stored = svc
        .generate_and_store(&request, &GenerateOptions::default())
        .await
        .unwrap();

    assert!(stored.raw.features.is_fallback());
    assert_eq!(stored.stored.plan.model_used, "local-template");
    assert!(!stored.stored.plan.features.is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn cached_latest_is_refreshed_after_approval() {
    let (pool, db_name) = create_test_db().await;
    onboard(&pool).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = PlanCache::new(dir.path(), DEFAULT_TTL);
    let svc = service(&pool, Arc::new(Scripted)).with_cache(cache.clone());

    let source = PgOnboardingSource::new(pool.clone());
    let request = assemble_request(&[&source as &dyn OnboardingSource])
        .await
        .unwrap();
    let stored = svc
        .generate_and_store(&request, &GenerateOptions::default())
        .await
        .unwrap();
    let id = stored.stored.plan.id;

    svc.approve_plan(id).await.unwrap();
    assert!(cache.latest_plan(chrono::Utc::now()).is_none());

    let latest = svc.latest_plan().await.unwrap().unwrap();
    assert_eq!(latest.id, id);
    assert_eq!(latest.status, PlanStatus::Approved);

    assert!(matches!(
        svc.approve_plan(uuid::Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    ));

    pool.close().await;
    drop_test_db(&db_name).await;
}
