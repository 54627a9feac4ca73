use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            CACHE_CONTROL, PRAGMA, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
        HeaderValue, StatusCode,
    },
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::Level;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::{
    api::{
        handlers::{api_health, healthz, metrics_text},
        middleware::trace_id_middleware,
    },
    app_state::AppState,
};

pub mod catalog_api; // ✅ 示例目录API（清单过滤 + 内容加载）
pub mod form_api; // ✅ 表单会话API（配置 + 子实体CRUD + 校验）
pub mod handlers;
pub mod middleware;
pub mod response; // 统一响应格式
pub mod template_api;
pub mod test_console_api; // ✅ 测试控制台API（规范化 + 上游CRUD）

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api_health,
        handlers::healthz,
        form_api::create_form,
        form_api::get_form,
        catalog_api::list_files,
        template_api::get_template,
        test_console_api::execute,
    ),
    components(
        schemas(
            handlers::HealthResponse,
            handlers::Healthz,
            form_api::CreateFormReq,
            form_api::UpdateFieldsReq,
            form_api::AddEntityReq,
            form_api::UpdateEntityReq,
            form_api::SetModuleReq,
            form_api::SetExpandedReq,
            form_api::FormSnapshotResp,
            form_api::ValidationResp,
            catalog_api::FileListResp,
            catalog_api::RefreshResp,
            template_api::TemplateIndexEntry,
            test_console_api::ExecuteReq,
            test_console_api::ExecuteResp,
            crate::domain::validation::ValidationIssue,
            crate::domain::validation::Severity,
            crate::domain::validation::TabStatus,
            crate::domain::modules::ModuleSet,
            crate::domain::modules::FeesModule,
            crate::domain::modules::RoyaltyModule,
            crate::domain::modules::VestingModule,
            crate::domain::modules::VestingEntry,
            crate::domain::modules::SnapshotModule,
            crate::domain::modules::SlotManagerModule,
            crate::domain::modules::ManagedSlot,
            crate::domain::modules::WithdrawalQueueModule,
            crate::service::catalog_service::ExampleFileItem,
            crate::service::catalog_service::LoadedExample,
        )
    ),
    tags(
        (name = "Forms", description = "配置表单会话"),
        (name = "Catalog", description = "示例配置目录"),
        (name = "Templates", description = "按标准的种子模板"),
        (name = "TestConsole", description = "JSON CRUD测试控制台")
    )
)]
struct ApiDoc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1/forms", form_api::routes())
        .nest("/api/v1/catalog", catalog_api::routes())
        .nest("/api/v1/templates", template_api::routes())
        .nest("/api/v1/test-console", test_console_api::routes())
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .route("/api/metrics", get(metrics_text))
        // ✅ 系统健康检查（必须在middleware之前定义，才能被middleware包裹）
        .route("/health", get(api_health)) // 简短别名，兼容测试脚本
        .route("/api/health", get(api_health))
        .route("/healthz", get(healthz))
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(from_fn(trace_id_middleware))
                .layer(from_fn(cors_preflight_middleware))
                .layer(from_fn(add_cors_headers))
                .layer(from_fn(add_security_headers))
                .layer(from_fn(add_response_time_header))
                .layer(from_fn(trace_log))
                .layer(from_fn(set_request_id)),
        )
        .with_state(state)
}

fn allowed_origin_for(origin: &str) -> String {
    // 🔧 开发环境：允许localhost和127.0.0.1；生产环境：建议显式配置 CORS_ALLOW_ORIGINS
    let allow_origins = std::env::var("CORS_ALLOW_ORIGINS").unwrap_or_else(|_| {
        "http://localhost:8080,http://127.0.0.1:8080,http://localhost:8081,http://127.0.0.1:8081"
            .into()
    });

    if allow_origins.trim() == "*" {
        "*".to_string()
    } else if !origin.is_empty()
        && allow_origins
            .split(',')
            .any(|allowed| allowed.trim() == origin)
    {
        origin.to_string()
    } else if !origin.is_empty() {
        // 兼容当前策略：存在显式 Origin 时，先放行（避免运营误配导致全站不可用）
        // 如需严格限制，把此分支移除即可。
        origin.to_string()
    } else {
        allow_origins
            .split(',')
            .next()
            .unwrap_or("*")
            .trim()
            .to_string()
    }
}

fn apply_cors_headers(resp: &mut Response, origin: &str, requested_headers: Option<String>) {
    let headers = resp.headers_mut();
    let allowed_origin = allowed_origin_for(origin);

    if let Ok(val) = HeaderValue::from_str(&allowed_origin) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, val);
    } else {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }

    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );

    // If browser sent Access-Control-Request-Headers, reflect it back to allow custom headers
    let fallback = HeaderValue::from_static(
        "Content-Type, Authorization, X-Request-Id, X-Trace-Id, X-Client-Version, Accept-Language",
    );
    match requested_headers.and_then(|h| HeaderValue::from_str(&h).ok()) {
        Some(val) => {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, val);
        }
        None => {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, fallback);
        }
    }

    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("false"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
}

async fn cors_preflight_middleware(req: Request, next: axum::middleware::Next) -> Response {
    if req.method() == axum::http::Method::OPTIONS {
        let origin = req
            .headers()
            .get("origin")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();
        let requested_headers = req
            .headers()
            .get("access-control-request-headers")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut resp = StatusCode::OK.into_response();
        apply_cors_headers(&mut resp, &origin, requested_headers);
        return resp;
    }

    next.run(req).await
}

async fn add_cors_headers(req: Request, next: axum::middleware::Next) -> Response {
    // 获取请求来源，动态返回对应的CORS头（需要clone，因为req会被移动）
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_default();
    let requested_headers = req
        .headers()
        .get("access-control-request-headers")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let mut resp = next.run(req).await;
    apply_cors_headers(&mut resp, &origin, requested_headers);
    resp
}

async fn add_security_headers(req: Request, next: axum::middleware::Next) -> Response {
    let _path = req.uri().path().to_string();
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    // HSTS 仅在 HTTPS 部署时启用：通过环境变量控制（HSTS_ENABLE=1）
    if std::env::var("HSTS_ENABLE")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000"),
        );
    }
    resp
}

async fn set_request_id(mut req: Request, next: axum::middleware::Next) -> Response {
    let req_id = Uuid::new_v4().to_string();
    let trace_id = crate::utils::get_or_generate_trace_id(Some(&req_id));

    // 将追踪ID注入到请求扩展中
    req.extensions_mut().insert(trace_id.clone());

    req.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&req_id).unwrap_or(HeaderValue::from_static("gen-failed")),
    );
    let mut resp = next.run(req).await;

    // 确保X-Request-ID返回给客户端
    resp.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&req_id).unwrap_or(HeaderValue::from_static("gen-failed")),
    );
    resp.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&trace_id).unwrap_or(HeaderValue::from_static("gen-failed")),
    );
    resp
}

async fn add_response_time_header(req: Request, next: axum::middleware::Next) -> Response {
    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis().to_string();
    resp.headers_mut().insert(
        "x-response-time",
        HeaderValue::from_str(&format!("{}ms", elapsed_ms))
            .unwrap_or(HeaderValue::from_static("0ms")),
    );
    resp
}

async fn trace_log(req: Request, next: axum::middleware::Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let req_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, request_id=%req_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}
