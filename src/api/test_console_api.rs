//! 测试控制台 API
//! 自由编辑的JSON经过规范化后直连上游代币服务的CRUD操作。
//! 每个操作都是单次网络调用，失败原样上抛，无重试、无回滚。

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    error::AppError,
    service::normalizer::{self, NormalizeError, ParsedPayload, PayloadFormat},
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request/Response Models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteReq {
    /// create / read / update / delete / list / validate
    pub operation: String,
    pub project_id: String,
    #[serde(default)]
    pub token_id: Option<String>,
    /// 编辑器里的原始JSON文本（create/update/validate需要）
    #[serde(default)]
    pub raw_json: Option<String>,
    /// validate操作的宽松模式
    #[serde(default)]
    pub relaxed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResp {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[schema(value_type = Object)]
    pub result: Value,
}

fn normalize_error(err: NormalizeError) -> AppError {
    match &err {
        NormalizeError::Parse(_) | NormalizeError::NotAnObject => {
            AppError::parse_error(err.to_string())
        }
        NormalizeError::MissingFields(_) => AppError::validation_failed(err.to_string()),
        NormalizeError::UnsupportedStandard(_) => AppError::standard_not_supported(err.to_string()),
    }
}

fn format_name(format: PayloadFormat) -> &'static str {
    match format {
        PayloadFormat::Enhanced => "enhanced",
        PayloadFormat::Legacy => "legacy",
    }
}

fn require_raw_json(req: &ExecuteReq) -> Result<&str, AppError> {
    req.raw_json
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| {
            AppError::invalid_parameter(format!(
                "Operation {} requires rawJson",
                req.operation
            ))
        })
}

fn require_token_id(req: &ExecuteReq) -> Result<&str, AppError> {
    req.token_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            AppError::invalid_parameter(format!(
                "Operation {} requires tokenId",
                req.operation
            ))
        })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/execute", post(execute))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /api/v1/test-console/execute
///
/// 按操作分支执行CRUD。create/update先走解析+规范化。
#[utoipa::path(
    post,
    path = "/api/v1/test-console/execute",
    request_body = ExecuteReq,
    responses(
        (status = 200, description = "Operation result", body = crate::api::response::ApiResponse<ExecuteResp>)
    ),
    tag = "TestConsole"
)]
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteReq>,
) -> Result<Json<ApiResponse<ExecuteResp>>, AppError> {
    let operation = req.operation.trim().to_lowercase();
    tracing::info!(
        "Test console execute: operation={} project={}",
        operation,
        req.project_id
    );

    let response = match operation.as_str() {
        "create" => {
            let parsed = parse_payload(&req)?;
            let enhanced = normalizer::has_enhanced_fields(&parsed.data);
            let result = call_upstream(
                state
                    .token_client
                    .create_token(&req.project_id, &parsed.data, enhanced),
            )
            .await?;
            parsed_response(&operation, &parsed, result)
        }
        "read" => {
            let token_id = require_token_id(&req)?;
            let result = call_upstream(
                state
                    .token_client
                    .get_complete_token(&req.project_id, token_id),
            )
            .await?;
            plain_response(&operation, result)
        }
        "update" => {
            let token_id = require_token_id(&req)?.to_string();
            let parsed = parse_payload(&req)?;
            let result = call_upstream(state.token_client.update_token(
                &req.project_id,
                &token_id,
                &parsed.data,
            ))
            .await?;
            parsed_response(&operation, &parsed, result)
        }
        "delete" => {
            let token_id = require_token_id(&req)?;
            let result =
                call_upstream(state.token_client.delete_token(&req.project_id, token_id)).await?;
            plain_response(&operation, result)
        }
        "list" => {
            let result =
                call_upstream(state.token_client.get_tokens_by_project(&req.project_id)).await?;
            plain_response(&operation, result)
        }
        "validate" => {
            // 本地校验，不打上游
            let raw = require_raw_json(&req)?;
            let value: Value = serde_json::from_str(raw)
                .map_err(|e| AppError::parse_error(format!("Invalid JSON: {}", e)))?;
            let (valid, errors) = normalizer::validate_token_data(&value, req.relaxed);
            plain_response(&operation, json!({ "valid": valid, "errors": errors }))
        }
        other => {
            return Err(AppError::invalid_parameter(format!(
                "Unknown operation: {}",
                other
            )))
        }
    };

    crate::metrics::count_ok("POST /api/v1/test-console/execute");
    success_response(response)
}

fn parse_payload(req: &ExecuteReq) -> Result<ParsedPayload, AppError> {
    let raw = require_raw_json(req)?;
    normalizer::parse_and_validate(raw).map_err(normalize_error)
}

fn parsed_response(operation: &str, parsed: &ParsedPayload, result: Value) -> ExecuteResp {
    ExecuteResp {
        operation: operation.to_string(),
        standard: Some(parsed.standard.as_str().to_string()),
        config_mode: Some(parsed.config_mode.as_str().to_string()),
        format: Some(format_name(parsed.format).to_string()),
        result,
    }
}

fn plain_response(operation: &str, result: Value) -> ExecuteResp {
    ExecuteResp {
        operation: operation.to_string(),
        standard: None,
        config_mode: None,
        format: None,
        result,
    }
}

/// 上游调用统一计时与错误映射
async fn call_upstream(
    fut: impl std::future::Future<Output = anyhow::Result<Value>>,
) -> Result<Value, AppError> {
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_millis();
    match result {
        Ok(value) => {
            crate::metrics::observe_upstream(true, elapsed);
            Ok(value)
        }
        Err(e) => {
            crate::metrics::observe_upstream(false, elapsed);
            tracing::error!("Token service call failed: {:#}", e);
            Err(AppError::upstream_error(format!("{:#}", e)))
        }
    }
}
