//! 基础系统端点：健康检查与指标快照

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{app_state::AppState, error::AppError};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<HealthResponse>))
)]
pub async fn api_health(
) -> Result<Json<crate::api::response::ApiResponse<HealthResponse>>, AppError> {
    crate::metrics::count_ok("GET /api/health");
    use crate::api::response::success_response;
    success_response(HealthResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Healthz {
    pub status: String,
    pub active_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_refreshed_at: Option<String>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<Healthz>))
)]
pub async fn healthz(
    State(st): State<Arc<AppState>>,
) -> Result<Json<crate::api::response::ApiResponse<Healthz>>, AppError> {
    let active_sessions = st.sessions.len().await;
    let catalog_refreshed_at = st
        .catalog
        .last_refreshed()
        .await
        .map(|dt| crate::utils::format_timestamp(&dt));
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );
    use crate::api::response::success_response;
    success_response(Healthz {
        status: "ok".into(),
        active_sessions,
        catalog_refreshed_at,
        version,
    })
}

/// GET /api/metrics - 文本指标快照
pub async fn metrics_text() -> String {
    crate::metrics::render()
}
