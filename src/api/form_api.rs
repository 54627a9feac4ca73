//! 表单会话 API
//! 配置表单的创建、字段更新、子实体CRUD与校验快照

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::{
        modules::{ModuleKind, ModuleSet},
        standard::{ConfigMode, TokenStandard},
        validation::{TabStatus, ValidationIssue},
    },
    error::AppError,
    service::{
        form_session::{FormSession, SubEntityKind},
        validation_service,
    },
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request/Response Models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormReq {
    #[schema(value_type = String, example = "ERC-3525")]
    pub standard: TokenStandard,
    #[serde(default)]
    #[schema(value_type = String, example = "max")]
    pub config_mode: ConfigMode,
    /// 可选的初始配置（合并配置对象可以原样回灌）
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub initial_config: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFieldsReq {
    /// 字段级补丁，null值表示清空该字段
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddEntityReq {
    /// 新记录的初始字段覆盖
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub initial: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEntityReq {
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetModuleReq {
    pub enabled: bool,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub config: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetExpandedReq {
    /// None表示收起
    pub index: Option<usize>,
}

/// 表单完整快照：配置 + 子实体 + 校验结果
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshotResp {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub standard: TokenStandard,
    #[schema(value_type = String)]
    pub config_mode: ConfigMode,
    #[schema(value_type = Object)]
    pub config: Value,
    #[schema(value_type = Object)]
    pub standard_arrays: Value,
    pub modules: ModuleSet,
    pub validation: Vec<ValidationIssue>,
    pub tab_statuses: BTreeMap<String, TabStatus>,
    pub completion_percent: u8,
    pub expanded: BTreeMap<String, usize>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResp {
    pub issues: Vec<ValidationIssue>,
    pub tab_statuses: BTreeMap<String, TabStatus>,
    pub completion_percent: u8,
}

fn snapshot(session: &FormSession) -> Result<FormSnapshotResp, AppError> {
    let issues = validation_service::validate(session);
    let tab_statuses = validation_service::statuses(session, &issues);
    let completion_percent = validation_service::completion_percent(session);

    Ok(FormSnapshotResp {
        id: session.id,
        standard: session.standard,
        config_mode: session.mode,
        config: session
            .config
            .to_value()
            .map_err(|e| AppError::internal(format!("{:#}", e)))?,
        standard_arrays: session
            .standard_arrays()
            .map_err(|e| AppError::internal(format!("{:#}", e)))?,
        modules: session.modules.clone(),
        validation: issues,
        tab_statuses,
        completion_percent,
        expanded: session.expanded.clone(),
        revision: session.revision,
        created_at: session.created_at,
        updated_at: session.updated_at,
    })
}

fn parse_entity(segment: &str) -> Result<SubEntityKind, AppError> {
    SubEntityKind::from_path(segment).ok_or_else(|| {
        AppError::entity_not_supported(format!("Unknown sub-entity kind: {}", segment))
    })
}

fn parse_module(segment: &str) -> Result<ModuleKind, AppError> {
    ModuleKind::parse(segment)
        .ok_or_else(|| AppError::module_not_supported(format!("Unknown module: {}", segment)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_form))
        .route("/:id", get(get_form).delete(delete_form))
        .route("/:id/fields", put(update_fields))
        .route("/:id/config", get(merged_config))
        .route("/:id/validation", get(get_validation))
        .route("/:id/modules/:module", put(set_module))
        .route("/:id/:entity", post(add_entity))
        .route("/:id/:entity/expanded", put(set_expanded))
        .route(
            "/:id/:entity/:index",
            put(update_entity).delete(remove_entity),
        )
        .route("/:id/:entity/:index/duplicate", post(duplicate_entity))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/v1/forms
///
/// 新建表单会话（默认种子 + 可选初始配置）
#[utoipa::path(
    post,
    path = "/api/v1/forms",
    request_body = CreateFormReq,
    responses(
        (status = 200, description = "Form session created", body = crate::api::response::ApiResponse<FormSnapshotResp>)
    ),
    tag = "Forms"
)]
pub async fn create_form(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFormReq>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let session = state
        .sessions
        .create(req.standard, req.config_mode, req.initial_config)
        .await?;
    tracing::info!(
        "Form session created: id={} standard={} mode={}",
        session.id,
        session.standard,
        session.mode
    );
    crate::metrics::count_ok("POST /api/v1/forms");
    success_response(snapshot(&session)?)
}

/// GET /api/v1/forms/:id
#[utoipa::path(
    get,
    path = "/api/v1/forms/{id}",
    params(("id" = Uuid, Path, description = "Form session id")),
    responses(
        (status = 200, description = "Form snapshot", body = crate::api::response::ApiResponse<FormSnapshotResp>)
    ),
    tag = "Forms"
)]
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let session = state.sessions.get(id).await?;
    success_response(snapshot(&session)?)
}

/// DELETE /api/v1/forms/:id
pub async fn delete_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.sessions.delete(id).await?;
    success_response(serde_json::json!({ "deleted": true }))
}

/// PUT /api/v1/forms/:id/fields
///
/// 字段级更新，合并对象整体重建
pub async fn update_fields(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFieldsReq>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let session = state.sessions.update_fields(id, req.fields).await?;
    success_response(snapshot(&session)?)
}

/// GET /api/v1/forms/:id/config
///
/// 合并配置对象（config + standardArrays + modules）
pub async fn merged_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let session = state.sessions.get(id).await?;
    let merged = session
        .merged_config()
        .map_err(|e| AppError::internal(format!("{:#}", e)))?;
    success_response(merged)
}

/// GET /api/v1/forms/:id/validation
pub async fn get_validation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ValidationResp>>, AppError> {
    let session = state.sessions.get(id).await?;
    let issues = validation_service::validate(&session);
    let tab_statuses = validation_service::statuses(&session, &issues);
    success_response(ValidationResp {
        issues,
        tab_statuses,
        completion_percent: validation_service::completion_percent(&session),
    })
}

/// PUT /api/v1/forms/:id/modules/:module
pub async fn set_module(
    State(state): State<Arc<AppState>>,
    Path((id, module)): Path<(Uuid, String)>,
    Json(req): Json<SetModuleReq>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_module(&module)?;
    let session = state
        .sessions
        .set_module(id, kind, req.enabled, req.config)
        .await?;
    success_response(snapshot(&session)?)
}

/// POST /api/v1/forms/:id/:entity
pub async fn add_entity(
    State(state): State<Arc<AppState>>,
    Path((id, entity)): Path<(Uuid, String)>,
    body: Option<Json<AddEntityReq>>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_entity(&entity)?;
    let initial = body.and_then(|Json(req)| req.initial);
    let session = state.sessions.add_entity(id, kind, initial).await?;
    success_response(snapshot(&session)?)
}

/// PUT /api/v1/forms/:id/:entity/:index
pub async fn update_entity(
    State(state): State<Arc<AppState>>,
    Path((id, entity, index)): Path<(Uuid, String, usize)>,
    Json(req): Json<UpdateEntityReq>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_entity(&entity)?;
    let session = state
        .sessions
        .update_entity(id, kind, index, req.fields)
        .await?;
    success_response(snapshot(&session)?)
}

/// DELETE /api/v1/forms/:id/:entity/:index
pub async fn remove_entity(
    State(state): State<Arc<AppState>>,
    Path((id, entity, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_entity(&entity)?;
    let session = state.sessions.remove_entity(id, kind, index).await?;
    success_response(snapshot(&session)?)
}

/// POST /api/v1/forms/:id/:entity/:index/duplicate
pub async fn duplicate_entity(
    State(state): State<Arc<AppState>>,
    Path((id, entity, index)): Path<(Uuid, String, usize)>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_entity(&entity)?;
    let session = state.sessions.duplicate_entity(id, kind, index).await?;
    success_response(snapshot(&session)?)
}

/// PUT /api/v1/forms/:id/:entity/expanded
pub async fn set_expanded(
    State(state): State<Arc<AppState>>,
    Path((id, entity)): Path<(Uuid, String)>,
    Json(req): Json<SetExpandedReq>,
) -> Result<Json<ApiResponse<FormSnapshotResp>>, AppError> {
    let kind = parse_entity(&entity)?;
    let session = state.sessions.set_expanded(id, kind, req.index).await?;
    success_response(snapshot(&session)?)
}
