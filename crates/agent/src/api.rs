//! HTTP API: workload registration, analyses, fleet views, health
//! probes, and Prometheus metrics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use carbon_agent_lib::{
    error::AgentError,
    health::{ComponentStatus, HealthRegistry},
    CarbonAgent, MetricsStore, WorkloadContext,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<CarbonAgent>,
    pub store: Arc<dyn MetricsStore>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(
        agent: Arc<CarbonAgent>,
        store: Arc<dyn MetricsStore>,
        health_registry: HealthRegistry,
    ) -> Self {
        Self {
            agent,
            store,
            health_registry,
        }
    }
}

/// JSON error body returned for all API failures
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Map core errors onto HTTP statuses
fn error_response(err: AgentError) -> Response {
    let status = match &err {
        AgentError::WorkloadNotFound { .. } => StatusCode::NOT_FOUND,
        AgentError::InvalidWorkload { .. } => StatusCode::BAD_REQUEST,
        AgentError::AlreadyTracking { .. } | AgentError::NotTracking { .. } => StatusCode::CONFLICT,
        AgentError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        error: err.to_string(),
        code: err.code().to_string(),
    };
    (status, Json(body)).into_response()
}

/// Health check - 200 while operational, 503 once a component has failed
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check - 200 once initialized and no component has failed
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct RegisterResponse {
    workload_id: String,
}

/// Register (or replace) a workload context
async fn register_workload(
    State(state): State<Arc<AppState>>,
    Json(context): Json<WorkloadContext>,
) -> Response {
    let workload_id = context.workload_id.clone();
    match state.agent.register_workload(context).await {
        Ok(()) => (StatusCode::CREATED, Json(RegisterResponse { workload_id })).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkloadList {
    workloads: Vec<String>,
    total: usize,
}

/// List registered workload ids
async fn list_workloads(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut workloads = state.agent.list_workloads().await;
    workloads.sort();
    let total = workloads.len();
    Json(WorkloadList { workloads, total })
}

/// Analyze a single workload
async fn workload_analysis(
    State(state): State<Arc<AppState>>,
    Path(workload_id): Path<String>,
) -> Response {
    match state.agent.analyze(&workload_id).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(err) => error_response(err),
    }
}

/// Body for recording an externally measured execution
#[derive(Debug, Serialize, Deserialize)]
struct RecordExecutionRequest {
    emissions_kg: f64,
    duration_seconds: f64,
    energy_kwh: f64,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

/// Append one execution record for a registered workload
async fn record_execution(
    State(state): State<Arc<AppState>>,
    Path(workload_id): Path<String>,
    Json(request): Json<RecordExecutionRequest>,
) -> Response {
    // Recording against an unregistered workload is a caller mistake
    if let Err(err) = state.agent.workload(&workload_id).await {
        return error_response(err);
    }

    match state
        .store
        .record(
            &workload_id,
            request.emissions_kg,
            request.duration_seconds,
            request.energy_kwh,
            request.metadata,
        )
        .await
    {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response(err),
    }
}

/// Fleet-wide analyses, failures embedded per workload
async fn all_analyses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.agent.all_analyses().await)
}

/// Actionable opportunities across the fleet
async fn opportunities(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.agent.optimization_opportunities().await)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route(
            "/api/v1/workloads",
            get(list_workloads).post(register_workload),
        )
        .route("/api/v1/workloads/:id/analysis", get(workload_analysis))
        .route(
            "/api/v1/workloads/:id/executions",
            axum::routing::post(record_execution),
        )
        .route("/api/v1/analyses", get(all_analyses))
        .route("/api/v1/opportunities", get(opportunities))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
