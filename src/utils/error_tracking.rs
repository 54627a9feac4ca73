//! 错误追踪工具
//! 统一trace_id的生成与透传

use uuid::Uuid;

/// 有请求ID时沿用，否则生成新的trace_id
pub fn get_or_generate_trace_id(request_id: Option<&str>) -> String {
    match request_id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
