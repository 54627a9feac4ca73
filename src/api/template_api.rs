//! 模板 API
//! 按标准/模式下发测试控制台的种子JSON

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::standard::{ConfigMode, TokenStandard},
    error::AppError,
    service::template_service,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TemplateQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateIndexEntry {
    pub standard: String,
    pub modes: Vec<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_templates))
        .route("/:standard", get(get_template))
}

/// GET /api/v1/templates
pub async fn list_templates(
    State(_state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TemplateIndexEntry>>>, AppError> {
    let entries = TokenStandard::ALL
        .iter()
        .map(|standard| TemplateIndexEntry {
            standard: standard.as_str().to_string(),
            modes: vec!["min".to_string(), "max".to_string()],
        })
        .collect();
    success_response(entries)
}

/// GET /api/v1/templates/:standard?mode=max
#[utoipa::path(
    get,
    path = "/api/v1/templates/{standard}",
    params(
        ("standard" = String, Path, description = "代币标准"),
        ("mode" = Option<String>, Query, description = "min或max，缺省min")
    ),
    responses(
        (status = 200, description = "Template JSON", body = Object)
    ),
    tag = "Templates"
)]
pub async fn get_template(
    State(_state): State<Arc<AppState>>,
    Path(standard): Path<String>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let standard = TokenStandard::parse_lenient(&standard).ok_or_else(|| {
        AppError::standard_not_supported(format!("Unsupported token standard: {}", standard))
    })?;
    let mode = match query.mode.as_deref() {
        None => ConfigMode::Min,
        Some(raw) => ConfigMode::parse_lenient(raw).ok_or_else(|| {
            AppError::invalid_config_mode(format!("Unsupported config mode: {}", raw))
        })?,
    };

    let template = template_service::template(standard, mode)
        .map_err(|e| AppError::internal(format!("{:#}", e)))?;
    success_response(template)
}
