pub mod trace_id;

// 别名
pub use trace_id::{extract_trace_id, trace_id_middleware, TraceIdGenerator};
