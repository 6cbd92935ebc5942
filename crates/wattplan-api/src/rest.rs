//! REST API handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;
use wattplan_core::{ClusterSpec, PlannerError, UtilizationPolicy};
use wattplan_planner::{AllocationResult, Planner};

/// Application state shared across handlers
pub struct AppState {
    pub policy: UtilizationPolicy,
}

/// Create the API router
pub fn create_router(policy: UtilizationPolicy) -> Router {
    let state = Arc::new(AppState { policy });

    Router::new()
        .route("/api/v1/plan", post(plan))
        .route("/api/v1/baseline", post(baseline))
        .route("/api/v1/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request to plan an allocation
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// Cluster to plan on
    pub cluster: ClusterSpec,
    /// Required aggregate service rate
    pub rate: f64,
}

/// Response for a planned allocation
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub rate: f64,
    pub baseline_power: f64,
    pub allocation: AllocationResult,
}

/// Request for the full-speed baseline
#[derive(Debug, Deserialize)]
pub struct BaselineRequest {
    pub cluster: ClusterSpec,
}

fn error_response(err: PlannerError) -> (StatusCode, String) {
    let status = match err {
        PlannerError::InfeasibleRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PlannerError::InvalidCluster(_)
        | PlannerError::InvalidRequest(_)
        | PlannerError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Plan a minimum-power allocation
async fn plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    info!(
        groups = req.cluster.groups.len(),
        servers = req.cluster.server_count(),
        rate = req.rate,
        "Planning allocation"
    );

    let planner = Planner::new(req.cluster, state.policy).map_err(error_response)?;
    let rate = req.rate;

    // Each request owns its planner; the search itself is CPU-bound.
    let (baseline, result) = tokio::task::spawn_blocking(move || {
        let baseline = planner.baseline();
        (baseline, planner.plan(rate))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let allocation = result.map_err(|e| {
        warn!(rate, error = %e, "Planning failed");
        error_response(e)
    })?;

    Ok(Json(PlanResponse {
        plan_id: Uuid::new_v4(),
        created_at: Utc::now(),
        rate,
        baseline_power: baseline.total_power,
        allocation,
    }))
}

/// Full-speed allocation for a cluster
async fn baseline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BaselineRequest>,
) -> Result<Json<AllocationResult>, (StatusCode, String)> {
    let planner = Planner::new(req.cluster, state.policy).map_err(error_response)?;
    Ok(Json(planner.baseline()))
}

/// Service status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub util_min: f64,
    pub util_max: f64,
}

/// Get service status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        util_min: state.policy.util_min,
        util_max: state.policy.util_max,
    })
}
