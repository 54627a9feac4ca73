//! 校验结果模型
//!
//! 每次状态变化整体重算的扁平问题列表，按tab分组归并为三态

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// 单条校验问题
/// 不做增量合并，每次校验全量重建
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
    pub tab: String,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>, tab: &str) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
            tab: tab.to_string(),
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>, tab: &str) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
            tab: tab.to_string(),
        }
    }
}

/// Tab三态：有error则error，否则有warning则warning，否则complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Error,
    Warning,
    Complete,
}

/// 按tab归并问题列表
/// 传入的tab全集保证无问题的tab也会出现在结果中
pub fn tab_statuses(tabs: &[&str], issues: &[ValidationIssue]) -> BTreeMap<String, TabStatus> {
    let mut statuses: BTreeMap<String, TabStatus> = tabs
        .iter()
        .map(|t| (t.to_string(), TabStatus::Complete))
        .collect();

    for issue in issues {
        let entry = statuses
            .entry(issue.tab.clone())
            .or_insert(TabStatus::Complete);
        match issue.severity {
            Severity::Error => *entry = TabStatus::Error,
            Severity::Warning => {
                if *entry != TabStatus::Error {
                    *entry = TabStatus::Warning;
                }
            }
        }
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_status_reduction() {
        let issues = vec![
            ValidationIssue::warning("name", "Name looks short", "basic"),
            ValidationIssue::error("slots[0].valueRange", "Min must be below max", "slots"),
            ValidationIssue::warning("slots[1].name", "Slot name is empty", "slots"),
        ];

        let statuses = tab_statuses(&["basic", "slots", "allocations"], &issues);
        assert_eq!(statuses["basic"], TabStatus::Warning);
        assert_eq!(statuses["slots"], TabStatus::Error);
        assert_eq!(statuses["allocations"], TabStatus::Complete);
    }

    #[test]
    fn test_error_wins_over_later_warning() {
        let issues = vec![
            ValidationIssue::error("a", "boom", "slots"),
            ValidationIssue::warning("b", "meh", "slots"),
        ];
        let statuses = tab_statuses(&["slots"], &issues);
        assert_eq!(statuses["slots"], TabStatus::Error);
    }
}
