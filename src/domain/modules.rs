//! 扩展功能模块配置
//!
//! 每个模块只有两个状态：disabled（配置重置为清空形态）与
//! enabled（未填写字段补默认值），由单个开关切换。
//! 模块之间互不校验、互不协调。

use std::fmt;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// 模块标识（路径参数使用camelCase）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Fees,
    Royalty,
    Vesting,
    Snapshot,
    SlotManager,
    WithdrawalQueue,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Fees => "fees",
            ModuleKind::Royalty => "royalty",
            ModuleKind::Vesting => "vesting",
            ModuleKind::Snapshot => "snapshot",
            ModuleKind::SlotManager => "slotManager",
            ModuleKind::WithdrawalQueue => "withdrawalQueue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fees" => Some(ModuleKind::Fees),
            "royalty" => Some(ModuleKind::Royalty),
            "vesting" => Some(ModuleKind::Vesting),
            "snapshot" => Some(ModuleKind::Snapshot),
            "slotManager" | "slot-manager" => Some(ModuleKind::SlotManager),
            "withdrawalQueue" | "withdrawal-queue" => Some(ModuleKind::WithdrawalQueue),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 手续费模块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FeesModule {
    pub enabled: bool,
    pub transfer_fee_percentage: String,
    pub fee_recipient: String,
    pub exempt_addresses: Vec<String>,
}

impl FeesModule {
    fn enable_defaults(&mut self) {
        if self.transfer_fee_percentage.is_empty() {
            self.transfer_fee_percentage = "0.5".to_string();
        }
    }
}

/// 版税模块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RoyaltyModule {
    pub enabled: bool,
    pub royalty_percentage: String,
    pub royalty_receiver: String,
    pub enforce_on_chain: bool,
}

impl RoyaltyModule {
    fn enable_defaults(&mut self) {
        if self.royalty_percentage.is_empty() {
            self.royalty_percentage = "2.5".to_string();
        }
    }
}

/// 归属计划条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VestingEntry {
    pub beneficiary: String,
    pub amount: String,
    pub start_date: String,
}

/// 归属模块（自带条目列表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VestingModule {
    pub enabled: bool,
    pub cliff_days: String,
    pub duration_days: String,
    pub release_frequency: String,
    pub entries: Vec<VestingEntry>,
}

impl VestingModule {
    fn enable_defaults(&mut self) {
        if self.cliff_days.is_empty() {
            self.cliff_days = "90".to_string();
        }
        if self.duration_days.is_empty() {
            self.duration_days = "365".to_string();
        }
        if self.release_frequency.is_empty() {
            self.release_frequency = "monthly".to_string();
        }
    }
}

/// 快照模块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotModule {
    pub enabled: bool,
    pub automatic_snapshots: bool,
    pub snapshot_interval_days: String,
}

impl SnapshotModule {
    fn enable_defaults(&mut self) {
        if self.snapshot_interval_days.is_empty() {
            self.snapshot_interval_days = "30".to_string();
        }
    }
}

/// 受管slot条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagedSlot {
    pub slot_id: String,
    pub name: String,
    pub cap: String,
}

/// Slot管理模块（自带条目列表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotManagerModule {
    pub enabled: bool,
    pub allow_runtime_slot_creation: bool,
    pub managed_slots: Vec<ManagedSlot>,
}

impl SlotManagerModule {
    fn enable_defaults(&mut self) {
        // 无数值默认，开启即可编辑子列表
    }
}

/// 提取队列模块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawalQueueModule {
    pub enabled: bool,
    pub max_queue_size: String,
    pub processing_interval_secs: String,
    pub auto_process: bool,
}

impl WithdrawalQueueModule {
    fn enable_defaults(&mut self) {
        if self.max_queue_size.is_empty() {
            self.max_queue_size = "100".to_string();
        }
        if self.processing_interval_secs.is_empty() {
            self.processing_interval_secs = "3600".to_string();
        }
    }
}

/// 会话持有的模块集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleSet {
    pub fees: FeesModule,
    pub royalty: RoyaltyModule,
    pub vesting: VestingModule,
    pub snapshot: SnapshotModule,
    pub slot_manager: SlotManagerModule,
    pub withdrawal_queue: WithdrawalQueueModule,
}

impl ModuleSet {
    /// 开关切换：关闭重置为清空形态，开启补默认值后套用补丁
    pub fn set_module(
        &mut self,
        kind: ModuleKind,
        enabled: bool,
        patch: Option<&Map<String, Value>>,
    ) -> anyhow::Result<()> {
        match kind {
            ModuleKind::Fees => {
                self.fees = toggled(&self.fees, enabled, patch, FeesModule::enable_defaults)?
            }
            ModuleKind::Royalty => {
                self.royalty =
                    toggled(&self.royalty, enabled, patch, RoyaltyModule::enable_defaults)?
            }
            ModuleKind::Vesting => {
                self.vesting =
                    toggled(&self.vesting, enabled, patch, VestingModule::enable_defaults)?
            }
            ModuleKind::Snapshot => {
                self.snapshot = toggled(
                    &self.snapshot,
                    enabled,
                    patch,
                    SnapshotModule::enable_defaults,
                )?
            }
            ModuleKind::SlotManager => {
                self.slot_manager = toggled(
                    &self.slot_manager,
                    enabled,
                    patch,
                    SlotManagerModule::enable_defaults,
                )?
            }
            ModuleKind::WithdrawalQueue => {
                self.withdrawal_queue = toggled(
                    &self.withdrawal_queue,
                    enabled,
                    patch,
                    WithdrawalQueueModule::enable_defaults,
                )?
            }
        }
        Ok(())
    }
}

/// 通用的两态切换：disabled清空 / enabled补默认再打补丁
fn toggled<M>(
    current: &M,
    enabled: bool,
    patch: Option<&Map<String, Value>>,
    fill_defaults: impl FnOnce(&mut M),
) -> anyhow::Result<M>
where
    M: Clone + Default + Serialize + for<'de> Deserialize<'de> + ModuleToggle,
{
    if !enabled {
        // 关闭即重置，之前填写的内容不保留
        return Ok(M::default());
    }

    let mut next = current.clone();
    next.set_enabled(true);
    fill_defaults(&mut next);

    if let Some(patch) = patch {
        let mut value = serde_json::to_value(&next).context("Failed to serialize module")?;
        let obj = value
            .as_object_mut()
            .context("Module did not serialize to an object")?;
        for (key, patch_value) in patch {
            if key == "enabled" {
                continue; // 开关只走enabled参数
            }
            if patch_value.is_null() {
                obj.remove(key);
            } else {
                obj.insert(key.clone(), patch_value.clone());
            }
        }
        next = serde_json::from_value(value).context("Invalid module config")?;
        next.set_enabled(true);
    }

    Ok(next)
}

/// 各模块统一的enabled访问
pub trait ModuleToggle {
    fn set_enabled(&mut self, enabled: bool);
}

macro_rules! impl_module_toggle {
    ($($ty:ty),* $(,)?) => {
        $(impl ModuleToggle for $ty {
            fn set_enabled(&mut self, enabled: bool) {
                self.enabled = enabled;
            }
        })*
    };
}

impl_module_toggle!(
    FeesModule,
    RoyaltyModule,
    VestingModule,
    SnapshotModule,
    SlotManagerModule,
    WithdrawalQueueModule,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_fills_defaults() {
        let mut set = ModuleSet::default();
        set.set_module(ModuleKind::Vesting, true, None).unwrap();

        assert!(set.vesting.enabled);
        assert_eq!(set.vesting.cliff_days, "90");
        assert_eq!(set.vesting.duration_days, "365");
        assert_eq!(set.vesting.release_frequency, "monthly");
    }

    #[test]
    fn test_disable_resets_to_cleared_shape() {
        let mut set = ModuleSet::default();
        let mut patch = Map::new();
        patch.insert("feeRecipient".to_string(), Value::String("0xdead".into()));
        set.set_module(ModuleKind::Fees, true, Some(&patch)).unwrap();
        assert_eq!(set.fees.fee_recipient, "0xdead");

        set.set_module(ModuleKind::Fees, false, None).unwrap();
        assert_eq!(set.fees, FeesModule::default());
        assert!(!set.fees.enabled);
        assert_eq!(set.fees.transfer_fee_percentage, "");
    }

    #[test]
    fn test_patch_does_not_override_toggle() {
        let mut set = ModuleSet::default();
        let mut patch = Map::new();
        patch.insert("enabled".to_string(), Value::Bool(false));
        patch.insert("royaltyReceiver".to_string(), Value::String("0xbeef".into()));
        set.set_module(ModuleKind::Royalty, true, Some(&patch)).unwrap();

        assert!(set.royalty.enabled);
        assert_eq!(set.royalty.royalty_receiver, "0xbeef");
        assert_eq!(set.royalty.royalty_percentage, "2.5");
    }

    #[test]
    fn test_user_value_not_clobbered_by_defaults() {
        let mut set = ModuleSet::default();
        let mut patch = Map::new();
        patch.insert("snapshotIntervalDays".to_string(), Value::String("7".into()));
        set.set_module(ModuleKind::Snapshot, true, Some(&patch)).unwrap();
        assert_eq!(set.snapshot.snapshot_interval_days, "7");

        // 再次开启不会把用户填写的值冲掉
        set.set_module(ModuleKind::Snapshot, true, None).unwrap();
        assert_eq!(set.snapshot.snapshot_interval_days, "7");
    }
}
