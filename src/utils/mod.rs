pub mod error_tracking;
pub mod string_utils;
pub mod time_utils;

// Re-export commonly used functions
pub use error_tracking::get_or_generate_trace_id;
pub use time_utils::*;
