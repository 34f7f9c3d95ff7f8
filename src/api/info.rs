use crate::server::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers
    pub status: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PoolInfo {
    pub capacity: usize,
    pub created: usize,
    pub idle: usize,
    pub in_use: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
    pub fonts: Vec<String>,
    pub default_font: String,
    pub max_concurrency: usize,
    pub in_flight: usize,
    pub pool: PoolInfo,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Service"
)]
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: VERSION.to_string(),
    })
}

/// Service information
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service description and live pool state", body = ServiceInfo)),
    tag = "Service"
)]
pub async fn handle_root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let status = state.renderer.status();
    Json(ServiceInfo {
        name: "tategaki".to_string(),
        version: VERSION.to_string(),
        endpoints: [
            "POST /render",
            "POST /render/batch",
            "GET /debug/markup",
            "GET /health",
            "GET /swagger-ui",
        ]
        .into_iter()
        .map(str::to_string)
        .collect(),
        fonts: status.fonts,
        default_font: status.default_font,
        max_concurrency: status.max_concurrency,
        in_flight: status.in_flight,
        pool: PoolInfo {
            capacity: status.pool.capacity,
            created: status.pool.created,
            idle: status.pool.idle,
            in_use: status.pool.in_use,
        },
    })
}
