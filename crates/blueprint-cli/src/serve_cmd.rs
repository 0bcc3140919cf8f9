use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use blueprint_core::plan::GeneratedPlan;
use blueprint_core::prompt::GenerateOptions;
use blueprint_core::request::{OnboardingData, build_request};
use blueprint_core::service::{PlanService, ServiceError};

type AppState = Arc<PlanService>;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Options(_) | ServiceError::Refine(_) => Self::bad_request(err.to_string()),
            ServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ServiceError::Persist(_) | ServiceError::Store(_) => {
                tracing::error!(error = %format!("{err:#}"), "request failed");
                Self::internal(format!("{err:#}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /functions/v1/generate-app-plan`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub business_data: OnboardingData,
    #[serde(default)]
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub raw_response: String,
    pub generated_plan: GeneratedPlan,
    pub model: String,
    /// True when only the simplified plan could be stored.
    pub simplified: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: AppState) -> Router {
    Router::new()
        .route("/functions/v1/generate-app-plan", post(generate_app_plan))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/latest", get(latest_plan))
        .route("/api/plans/{id}", get(get_plan))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Serve until `shutdown` is cancelled.
pub async fn run_serve(
    service: AppState,
    bind: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("blueprint serve listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    tracing::info!("blueprint serve shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_app_plan(
    State(service): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<axum::response::Response, AppError> {
    let request = build_request(Some(&body.business_data), None)
        .ok_or_else(|| AppError::bad_request("businessData is required"))?;

    let stored = service.generate_and_store(&request, &body.options).await?;

    Ok(Json(GenerateResponse {
        success: true,
        raw_response: stored.raw.features.text,
        model: stored.stored.plan.model_used.clone(),
        generated_plan: stored.stored.plan,
        simplified: stored.simplified,
    })
    .into_response())
}

async fn list_plans(State(service): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plans = service.list_plans().await?;
    Ok(Json(plans).into_response())
}

async fn latest_plan(State(service): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plan = service
        .latest_plan()
        .await?
        .ok_or_else(|| AppError::not_found("no plans yet"))?;
    Ok(Json(plan).into_response())
}

async fn get_plan(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let stored = service.get_plan(id).await?;
    Ok(Json(stored).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
