//! MintCore - 代币化资产配置服务后端
//!
//! 面向配置前端的BFF：表单会话、校验、模板、示例目录与测试控制台

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

// 企业级标准：统一模块导出
pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{ConfigMode, TokenStandard, ValidationIssue},
        error::{AppError, AppErrorCode},
        service::form_session::SessionStore,
    };
}
