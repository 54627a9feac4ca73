//! 示例目录 API
//! 示例配置文件的清单、过滤、内容加载与手动刷新

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    service::catalog_service::{CatalogFilter, ExampleFileItem, LoadedExample},
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request/Response Models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListResp {
    pub items: Vec<ExampleFileItem>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refreshed: Option<String>,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct FileContentQuery {
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResp {
    pub files: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", get(list_files))
        .route("/file-content", get(file_content))
        .route("/asset-types", get(asset_types))
        .route("/categories", get(categories))
        .route("/refresh", post(refresh_catalog))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// GET /api/v1/catalog/files
///
/// 过滤后的示例文件清单（搜索词、资产类型、分类、标准的合取）
#[utoipa::path(
    get,
    path = "/api/v1/catalog/files",
    params(
        ("search" = Option<String>, Query, description = "模糊搜索词"),
        ("assetType" = Option<String>, Query, description = "资产类型（展示名或slug）"),
        ("category" = Option<String>, Query, description = "分类"),
        ("standard" = Option<String>, Query, description = "代币标准")
    ),
    responses(
        (status = 200, description = "Filtered file list", body = crate::api::response::ApiResponse<FileListResp>)
    ),
    tag = "Catalog"
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<ApiResponse<FileListResp>>, AppError> {
    // 首次访问时做一次同步加载，之后由后台任务保持新鲜度
    if state.catalog.last_refreshed().await.is_none() {
        state.catalog.refresh().await.map_err(|e| {
            crate::metrics::count_err("GET /api/v1/catalog/files");
            AppError::catalog_unavailable(format!("{:#}", e))
        })?;
    }

    let items = state.catalog.filtered(&filter).await;
    let last_refreshed = state
        .catalog
        .last_refreshed()
        .await
        .map(|dt| crate::utils::format_timestamp(&dt));

    crate::metrics::count_ok("GET /api/v1/catalog/files");
    success_response(FileListResp {
        total: items.len(),
        items,
        last_refreshed,
    })
}

/// GET /api/v1/catalog/file-content?path=...
///
/// 加载选中文件内容并嗅探标准/模式。失败不影响已缓存的清单。
pub async fn file_content(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileContentQuery>,
) -> Result<Json<ApiResponse<LoadedExample>>, AppError> {
    let loaded = state.catalog.load(&query.path).await.map_err(|e| {
        tracing::warn!("Example file load failed: path={} err={:#}", query.path, e);
        let message = format!("{:#}", e);
        if message.contains("not found") {
            AppError::example_not_found(message)
        } else {
            AppError::catalog_unavailable(message)
        }
    })?;
    success_response(loaded)
}

/// GET /api/v1/catalog/asset-types
pub async fn asset_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    success_response(state.catalog.asset_types().await)
}

/// GET /api/v1/catalog/categories
pub async fn categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    success_response(state.catalog.categories().await)
}

/// POST /api/v1/catalog/refresh
///
/// 手动触发一次清单刷新
pub async fn refresh_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshResp>>, AppError> {
    let files = state
        .catalog
        .refresh()
        .await
        .map_err(|e| AppError::catalog_unavailable(format!("{:#}", e)))?;
    success_response(RefreshResp { files })
}
