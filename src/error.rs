use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,
    Timeout,
    Network,
    Internal,

    // 业务错误码
    SessionNotFound,
    StandardNotSupported,
    InvalidConfigMode,
    ValidationFailed,
    ParseError,
    IndexOutOfRange,
    EntityNotSupported,
    ModuleNotSupported,
    ExampleNotFound,
    CatalogUnavailable,
    TemplateNotFound,
    UpstreamError,
    InvalidParameter,
    ServiceUnavailable,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code_str = match self.code {
            // HTTP 基础错误码
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Timeout => "timeout",
            AppErrorCode::Network => "network",
            AppErrorCode::Internal => "internal",

            // 业务错误码
            AppErrorCode::SessionNotFound => "session_not_found",
            AppErrorCode::StandardNotSupported => "standard_not_supported",
            AppErrorCode::InvalidConfigMode => "invalid_config_mode",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::ParseError => "parse_error",
            AppErrorCode::IndexOutOfRange => "index_out_of_range",
            AppErrorCode::EntityNotSupported => "entity_not_supported",
            AppErrorCode::ModuleNotSupported => "module_not_supported",
            AppErrorCode::ExampleNotFound => "example_not_found",
            AppErrorCode::CatalogUnavailable => "catalog_unavailable",
            AppErrorCode::TemplateNotFound => "template_not_found",
            AppErrorCode::UpstreamError => "upstream_error",
            AppErrorCode::InvalidParameter => "invalid_parameter",
            AppErrorCode::ServiceUnavailable => "service_unavailable",
        };
        let body = ErrorBody {
            code: code_str,
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BadRequest,
            message: Self::user_friendly_message(msg.into()),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    /// 将技术错误消息转换为用户友好的消息
    fn user_friendly_message(msg: String) -> String {
        // 检测常见的技术错误并转换为友好提示
        if msg.contains("timeout") || msg.contains("Timeout") {
            return "请求超时，请检查网络连接后重试".to_string();
        }
        if msg.contains("network") || msg.contains("Network") {
            return "网络错误，请检查网络连接后重试".to_string();
        }
        // 如果已经是友好消息，直接返回
        msg
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::NotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Internal,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            trace_id: None,
        }
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// 从请求扩展中获取trace_id并设置
    pub fn with_trace_id_from_request(mut self, req: &axum::extract::Request) -> Self {
        if let Some(trace_id) = req.extensions().get::<String>() {
            self.trace_id = Some(trace_id.clone());
        }
        self
    }

    // 业务错误辅助函数
    pub fn session_not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::SessionNotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
        }
    }

    pub fn standard_not_supported(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::StandardNotSupported,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn invalid_config_mode(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidConfigMode,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ValidationFailed,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ParseError,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn index_out_of_range(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::IndexOutOfRange,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn entity_not_supported(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::EntityNotSupported,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn module_not_supported(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ModuleNotSupported,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn example_not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ExampleNotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
        }
    }

    pub fn catalog_unavailable(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::CatalogUnavailable,
            message: msg.into(),
            status: StatusCode::BAD_GATEWAY,
            trace_id: None,
        }
    }

    pub fn template_not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::TemplateNotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
        }
    }

    pub fn upstream_error(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::UpstreamError,
            message: msg.into(),
            status: StatusCode::BAD_GATEWAY,
            trace_id: None,
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidParameter,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ServiceUnavailable,
            message: msg.into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            trace_id: None,
        }
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_error(format!("JSON serialization error: {}", err))
    }
}

// 从 UUID 错误转换
impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::bad_request(format!("Invalid UUID: {}", err))
    }
}

// 从 reqwest 错误转换
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self {
                code: AppErrorCode::Timeout,
                message: format!("Upstream request timed out: {}", err),
                status: StatusCode::GATEWAY_TIMEOUT,
                trace_id: None,
            };
        }
        Self::upstream_error(format!("Upstream request failed: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}
