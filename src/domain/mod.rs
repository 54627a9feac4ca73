//! Domain 模块
//!
//! 包含配置对象模型、子实体与校验结果类型

pub mod erc3525;
pub mod modules;
pub mod standard;
pub mod token_config;
pub mod validation;

// Re-exports
// 重新导出常用类型
pub use erc3525::{next_synthetic_id, Allocation, PaymentSchedule, Slot, SlotConfig, ValueAdjustment};
pub use modules::{ModuleKind, ModuleSet};
pub use standard::{ConfigMode, TokenStandard};
pub use token_config::{Partition, TokenConfigData, TokenType};
pub use validation::{tab_statuses, Severity, TabStatus, ValidationIssue};
