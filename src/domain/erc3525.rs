//! ERC-3525 子实体模型
//!
//! slot / allocation / payment schedule / value adjustment / slot config
//! 均为有序记录列表，以字符串ID做引用关联。
//! 引用完整性只在校验阶段检查，插入时不强制。

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Slot：价值分组单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Slot {
    pub slot_id: String,
    pub name: String,
    pub description: String,
    pub value_units: String,
    /// 表单输入原样保留为字符串，空串表示未填写
    pub min_value: String,
    pub max_value: String,
    pub transferable: bool,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            slot_id: "1".to_string(),
            name: String::new(),
            description: String::new(),
            value_units: "units".to_string(),
            min_value: String::new(),
            max_value: String::new(),
            transferable: true,
            metadata: Value::Null,
        }
    }
}

impl Slot {
    pub fn with_id(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            ..Self::default()
        }
    }

    /// 复制出的slot获得新ID并在名称后追加 (copy)
    pub fn duplicated(&self, new_id: String) -> Self {
        let mut clone = self.clone();
        clone.slot_id = new_id;
        if !clone.name.is_empty() {
            clone.name = format!("{} (copy)", clone.name);
        }
        clone
    }
}

/// 分配记录：向某个slot内的持有人分配价值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Allocation {
    pub slot_id: String,
    pub token_id_within_slot: String,
    pub recipient: String,
    pub value: String,
}

impl Default for Allocation {
    fn default() -> Self {
        Self {
            slot_id: "1".to_string(),
            token_id_within_slot: "1".to_string(),
            recipient: String::new(),
            value: String::new(),
        }
    }
}

impl Allocation {
    pub fn for_slot(slot_id: impl Into<String>) -> Self {
        Self {
            slot_id: slot_id.into(),
            ..Self::default()
        }
    }
}

fn default_payment_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// 付款计划条目（债务型工具的票息/本金计划）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentSchedule {
    pub slot_id: String,
    pub payment_date: NaiveDate,
    pub payment_amount: String,
    pub payment_type: String,
    pub currency: String,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl Default for PaymentSchedule {
    fn default() -> Self {
        Self {
            slot_id: "1".to_string(),
            payment_date: default_payment_date(),
            payment_amount: String::new(),
            payment_type: "interest".to_string(),
            currency: "USD".to_string(),
            is_completed: false,
            transaction_hash: None,
        }
    }
}

impl PaymentSchedule {
    /// 复制规则：日期顺延30天，完成标记强制清空
    pub fn duplicated(&self) -> Self {
        let mut clone = self.clone();
        clone.payment_date = self.payment_date + Duration::days(30);
        clone.is_completed = false;
        clone.transaction_hash = None;
        clone
    }
}

/// 价值调整记录（重估/增值/减值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueAdjustment {
    pub slot_id: String,
    pub adjustment_date: NaiveDate,
    pub adjustment_type: String,
    pub adjustment_value: String,
    pub adjustment_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_source: Option<String>,
}

impl Default for ValueAdjustment {
    fn default() -> Self {
        Self {
            slot_id: "1".to_string(),
            adjustment_date: default_payment_date(),
            adjustment_type: "revaluation".to_string(),
            adjustment_value: String::new(),
            adjustment_reason: String::new(),
            oracle_source: None,
        }
    }
}

/// 每个slot的特性配置记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotConfig {
    pub slot_id: String,
    pub value_units: String,
    pub slot_transferable: bool,
    pub value_transferable: bool,
    pub max_supply: String,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_id: "1".to_string(),
            value_units: "units".to_string(),
            slot_transferable: true,
            value_transferable: true,
            max_supply: String::new(),
        }
    }
}

/// 生成下一个合成ID：已有ID中可解析的最大值+1，否则退化为 长度+1
pub fn next_synthetic_id(existing: impl Iterator<Item = impl AsRef<str>>) -> String {
    let mut max_id: u64 = 0;
    let mut count: u64 = 0;
    for id in existing {
        count += 1;
        if let Ok(parsed) = id.as_ref().trim().parse::<u64>() {
            max_id = max_id.max(parsed);
        }
    }
    if max_id > 0 {
        (max_id + 1).to_string()
    } else {
        (count + 1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_synthetic_id_from_max() {
        let slots = [Slot::with_id("1"), Slot::with_id("7"), Slot::with_id("3")];
        let id = next_synthetic_id(slots.iter().map(|s| s.slot_id.as_str()));
        assert_eq!(id, "8");
    }

    #[test]
    fn test_next_synthetic_id_fallback_to_length() {
        // ID不可解析时退化为列表长度+1
        let slots = [Slot::with_id("gold"), Slot::with_id("silver")];
        let id = next_synthetic_id(slots.iter().map(|s| s.slot_id.as_str()));
        assert_eq!(id, "3");
    }

    #[test]
    fn test_payment_schedule_duplication_shifts_30_days() {
        let original = PaymentSchedule {
            slot_id: "2".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            payment_amount: "1000".to_string(),
            payment_type: "coupon".to_string(),
            currency: "USDC".to_string(),
            is_completed: true,
            transaction_hash: Some("0xabc".to_string()),
        };

        let copy = original.duplicated();
        assert_eq!(copy.payment_date, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
        assert!(!copy.is_completed);
        assert_eq!(copy.transaction_hash, None);
        assert_eq!(copy.payment_amount, "1000");
        assert_eq!(copy.slot_id, "2");
    }

    #[test]
    fn test_slot_duplication_renames() {
        let slot = Slot {
            slot_id: "1".to_string(),
            name: "Senior Tranche".to_string(),
            ..Slot::default()
        };
        let copy = slot.duplicated("2".to_string());
        assert_eq!(copy.slot_id, "2");
        assert_eq!(copy.name, "Senior Tranche (copy)");
    }

    #[test]
    fn test_camel_case_wire_format() {
        let schedule = PaymentSchedule::default();
        let value = serde_json::to_value(&schedule).unwrap();
        assert!(value.get("paymentDate").is_some());
        assert!(value.get("isCompleted").is_some());
        assert!(value.get("payment_date").is_none());
    }
}
