//! 表单会话服务
//!
//! 内存中的配置表单状态：每个会话持有一个配置对象、子实体列表与
//! 扩展模块集合。所有变更都整体替换数组并整体重建合并配置，
//! 不做diff，也不做并发编辑保护（单用户假设）。
//! 会话不落库，超时由后台清理任务回收。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    domain::{
        erc3525::next_synthetic_id,
        modules::{ModuleKind, ModuleSet},
        standard::{ConfigMode, TokenStandard},
        token_config::{TokenConfigData, TokenType},
        Allocation, PaymentSchedule, Slot, SlotConfig, ValueAdjustment,
    },
    error::AppError,
};

/// 子实体列表标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubEntityKind {
    Slots,
    Allocations,
    PaymentSchedules,
    ValueAdjustments,
    SlotConfigs,
    TokenTypes,
}

impl SubEntityKind {
    /// 路径段解析（kebab-case）
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "slots" => Some(SubEntityKind::Slots),
            "allocations" => Some(SubEntityKind::Allocations),
            "payment-schedules" => Some(SubEntityKind::PaymentSchedules),
            "value-adjustments" => Some(SubEntityKind::ValueAdjustments),
            "slot-configs" => Some(SubEntityKind::SlotConfigs),
            "token-types" => Some(SubEntityKind::TokenTypes),
            _ => None,
        }
    }

    /// 合并配置里standardArrays使用的键名
    pub fn array_key(&self) -> &'static str {
        match self {
            SubEntityKind::Slots => "slots",
            SubEntityKind::Allocations => "allocations",
            SubEntityKind::PaymentSchedules => "paymentSchedules",
            SubEntityKind::ValueAdjustments => "valueAdjustments",
            SubEntityKind::SlotConfigs => "slotConfigs",
            SubEntityKind::TokenTypes => "tokenTypes",
        }
    }

    /// 该标准是否持有此类子实体
    pub fn supported_by(&self, standard: TokenStandard) -> bool {
        match self {
            SubEntityKind::TokenTypes => standard == TokenStandard::Erc1155,
            _ => standard == TokenStandard::Erc3525,
        }
    }
}

/// 单个表单会话的完整状态
#[derive(Debug, Clone)]
pub struct FormSession {
    pub id: Uuid,
    pub standard: TokenStandard,
    pub mode: ConfigMode,
    pub config: TokenConfigData,
    pub slots: Vec<Slot>,
    pub allocations: Vec<Allocation>,
    pub payment_schedules: Vec<PaymentSchedule>,
    pub value_adjustments: Vec<ValueAdjustment>,
    pub slot_configs: Vec<SlotConfig>,
    pub token_types: Vec<TokenType>,
    pub modules: ModuleSet,
    /// 每个子实体列表当前展开的UI索引
    pub expanded: BTreeMap<String, usize>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSession {
    /// 新建会话：默认种子 + 可选的初始配置覆盖
    fn new(
        standard: TokenStandard,
        mode: ConfigMode,
        initial_config: Option<Value>,
    ) -> anyhow::Result<Self> {
        let mut config = TokenConfigData::seed(standard, mode);
        let mut slots: Vec<Slot> = Vec::new();
        let mut allocations: Vec<Allocation> = Vec::new();
        let mut payment_schedules: Vec<PaymentSchedule> = Vec::new();
        let mut value_adjustments: Vec<ValueAdjustment> = Vec::new();
        let mut slot_configs: Vec<SlotConfig> = Vec::new();
        let mut token_types: Vec<TokenType> = Vec::new();
        let mut modules = ModuleSet::default();

        if let Some(initial) = initial_config {
            let mut init = match initial {
                Value::Object(map) => map,
                other => anyhow::bail!(
                    "initialConfig must be a JSON object, got {}",
                    json_type_name(&other)
                ),
            };

            // 会话参数以显式入参为准，初始配置里的标记只作忽略处理
            init.remove("standard");
            init.remove("configMode");
            init.remove("config_mode");

            if let Some(arrays) = init.remove("standardArrays") {
                if let Value::Object(mut arrays) = arrays {
                    slots = take_array(&mut arrays, "slots")?;
                    allocations = take_array(&mut arrays, "allocations")?;
                    payment_schedules = take_array(&mut arrays, "paymentSchedules")?;
                    value_adjustments = take_array(&mut arrays, "valueAdjustments")?;
                    slot_configs = take_array(&mut arrays, "slotConfigs")?;
                    token_types = take_array(&mut arrays, "tokenTypes")?;
                }
            }

            if let Some(module_value) = init.remove("modules") {
                modules = serde_json::from_value(module_value)
                    .context("Invalid modules block in initialConfig")?;
            }

            config.apply_patch(&init)?;
        }

        // min模式的列表保持至少一条记录
        if mode == ConfigMode::Min {
            if standard == TokenStandard::Erc3525 && slots.is_empty() {
                slots.push(Slot::default());
            }
            if standard == TokenStandard::Erc1155 && token_types.is_empty() {
                token_types.push(TokenType::default());
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            standard,
            mode,
            config,
            slots,
            allocations,
            payment_schedules,
            value_adjustments,
            slot_configs,
            token_types,
            modules,
            expanded: BTreeMap::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    /// standardArrays对象：只包含该标准实际持有的列表
    pub fn standard_arrays(&self) -> anyhow::Result<Value> {
        let mut arrays = Map::new();
        match self.standard {
            TokenStandard::Erc3525 => {
                arrays.insert("slots".into(), serde_json::to_value(&self.slots)?);
                arrays.insert(
                    "allocations".into(),
                    serde_json::to_value(&self.allocations)?,
                );
                arrays.insert(
                    "paymentSchedules".into(),
                    serde_json::to_value(&self.payment_schedules)?,
                );
                arrays.insert(
                    "valueAdjustments".into(),
                    serde_json::to_value(&self.value_adjustments)?,
                );
                arrays.insert(
                    "slotConfigs".into(),
                    serde_json::to_value(&self.slot_configs)?,
                );
            }
            TokenStandard::Erc1155 => {
                arrays.insert(
                    "tokenTypes".into(),
                    serde_json::to_value(&self.token_types)?,
                );
            }
            _ => {}
        }
        Ok(Value::Object(arrays))
    }

    /// 合并配置对象：配置字段 + standardArrays + modules，整体重建
    pub fn merged_config(&self) -> anyhow::Result<Value> {
        let mut merged = match self.config.to_value()? {
            Value::Object(map) => map,
            _ => anyhow::bail!("Token config did not serialize to an object"),
        };
        merged.insert("standard".into(), serde_json::to_value(self.standard)?);
        merged.insert("configMode".into(), serde_json::to_value(self.mode)?);
        merged.insert("standardArrays".into(), self.standard_arrays()?);
        merged.insert("modules".into(), serde_json::to_value(&self.modules)?);
        Ok(Value::Object(merged))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn take_array<T: serde::de::DeserializeOwned>(
    arrays: &mut Map<String, Value>,
    key: &str,
) -> anyhow::Result<Vec<T>> {
    match arrays.remove(key) {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("Invalid standardArrays.{} in initialConfig", key)),
        None => Ok(Vec::new()),
    }
}

/// 对单条记录套字段补丁（整体序列化再还原）
fn patched<T>(item: &T, patch: &Map<String, Value>) -> anyhow::Result<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut value = serde_json::to_value(item).context("Failed to serialize record")?;
    let obj = value
        .as_object_mut()
        .context("Record did not serialize to an object")?;
    for (key, patch_value) in patch {
        if patch_value.is_null() {
            obj.remove(key);
        } else {
            obj.insert(key.clone(), patch_value.clone());
        }
    }
    serde_json::from_value(value).context("Invalid record fields")
}

/// 会话存储
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, FormSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub async fn create(
        &self,
        standard: TokenStandard,
        mode: ConfigMode,
        initial_config: Option<Value>,
    ) -> Result<FormSession, AppError> {
        let session = FormSession::new(standard, mode, initial_config)
            .map_err(|e| AppError::bad_request(format!("{:#}", e)))?;
        let mut store = self.inner.write().await;
        store.insert(session.id, session.clone());
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<FormSession, AppError> {
        let store = self.inner.read().await;
        store
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::session_not_found(format!("Form session {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut store = self.inner.write().await;
        store
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::session_not_found(format!("Form session {} not found", id)))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// 会话内变更的通用入口：写锁内执行闭包，成功则bump revision
    async fn with_session_mut<F>(&self, id: Uuid, mutate: F) -> Result<FormSession, AppError>
    where
        F: FnOnce(&mut FormSession) -> Result<(), AppError>,
    {
        let mut store = self.inner.write().await;
        let session = store
            .get_mut(&id)
            .ok_or_else(|| AppError::session_not_found(format!("Form session {} not found", id)))?;
        mutate(session)?;
        session.touch();
        Ok(session.clone())
    }

    /// 字段级更新：套补丁后整体重建配置对象
    pub async fn update_fields(
        &self,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            session
                .config
                .apply_patch(&patch)
                .map_err(|e| AppError::bad_request(format!("{:#}", e)))
        })
        .await
    }

    /// 扩展模块开关 + 补丁
    pub async fn set_module(
        &self,
        id: Uuid,
        kind: ModuleKind,
        enabled: bool,
        patch: Option<Map<String, Value>>,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            session
                .modules
                .set_module(kind, enabled, patch.as_ref())
                .map_err(|e| AppError::bad_request(format!("{:#}", e)))
        })
        .await
    }

    /// 追加一条子实体记录（合成ID自动生成）
    pub async fn add_entity(
        &self,
        id: Uuid,
        kind: SubEntityKind,
        initial: Option<Map<String, Value>>,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            check_entity_supported(session, kind)?;
            let initial = initial.as_ref();
            match kind {
                SubEntityKind::Slots => {
                    let next_id = next_synthetic_id(session.slots.iter().map(|s| &s.slot_id));
                    let mut slot = Slot::with_id(next_id);
                    if let Some(init) = initial {
                        slot = patched(&slot, init).map_err(bad_fields)?;
                    }
                    session.slots.push(slot);
                }
                SubEntityKind::Allocations => {
                    let mut allocation = match session.slots.first() {
                        Some(slot) => Allocation::for_slot(slot.slot_id.clone()),
                        None => Allocation::default(),
                    };
                    if let Some(init) = initial {
                        allocation = patched(&allocation, init).map_err(bad_fields)?;
                    }
                    session.allocations.push(allocation);
                }
                SubEntityKind::PaymentSchedules => {
                    let mut schedule = PaymentSchedule::default();
                    if let Some(slot) = session.slots.first() {
                        schedule.slot_id = slot.slot_id.clone();
                    }
                    if let Some(init) = initial {
                        schedule = patched(&schedule, init).map_err(bad_fields)?;
                    }
                    session.payment_schedules.push(schedule);
                }
                SubEntityKind::ValueAdjustments => {
                    let mut adjustment = ValueAdjustment::default();
                    if let Some(slot) = session.slots.first() {
                        adjustment.slot_id = slot.slot_id.clone();
                    }
                    if let Some(init) = initial {
                        adjustment = patched(&adjustment, init).map_err(bad_fields)?;
                    }
                    session.value_adjustments.push(adjustment);
                }
                SubEntityKind::SlotConfigs => {
                    let next_id =
                        next_synthetic_id(session.slot_configs.iter().map(|s| &s.slot_id));
                    let mut slot_config = SlotConfig {
                        slot_id: next_id,
                        ..SlotConfig::default()
                    };
                    if let Some(init) = initial {
                        slot_config = patched(&slot_config, init).map_err(bad_fields)?;
                    }
                    session.slot_configs.push(slot_config);
                }
                SubEntityKind::TokenTypes => {
                    let next_id = next_synthetic_id(session.token_types.iter().map(|t| &t.id));
                    let mut token_type = TokenType::with_id(next_id);
                    if let Some(init) = initial {
                        token_type = patched(&token_type, init).map_err(bad_fields)?;
                    }
                    session.token_types.push(token_type);
                }
            }
            Ok(())
        })
        .await
    }

    /// 更新单条记录的若干字段，其余字段保留
    pub async fn update_entity(
        &self,
        id: Uuid,
        kind: SubEntityKind,
        index: usize,
        patch: Map<String, Value>,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            check_entity_supported(session, kind)?;
            match kind {
                SubEntityKind::Slots => update_at(&mut session.slots, index, &patch),
                SubEntityKind::Allocations => update_at(&mut session.allocations, index, &patch),
                SubEntityKind::PaymentSchedules => {
                    update_at(&mut session.payment_schedules, index, &patch)
                }
                SubEntityKind::ValueAdjustments => {
                    update_at(&mut session.value_adjustments, index, &patch)
                }
                SubEntityKind::SlotConfigs => update_at(&mut session.slot_configs, index, &patch),
                SubEntityKind::TokenTypes => update_at(&mut session.token_types, index, &patch),
            }
        })
        .await
    }

    /// 删除一条记录。
    /// min模式的slots（ERC-3525）和tokenTypes（ERC-1155）保持至少一条：
    /// 对单元素列表的删除是no-op，不报错。
    pub async fn remove_entity(
        &self,
        id: Uuid,
        kind: SubEntityKind,
        index: usize,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            check_entity_supported(session, kind)?;

            let min_one = session.mode == ConfigMode::Min
                && matches!(kind, SubEntityKind::Slots | SubEntityKind::TokenTypes);

            let removed = match kind {
                SubEntityKind::Slots => remove_at(&mut session.slots, index, min_one)?,
                SubEntityKind::Allocations => remove_at(&mut session.allocations, index, false)?,
                SubEntityKind::PaymentSchedules => {
                    remove_at(&mut session.payment_schedules, index, false)?
                }
                SubEntityKind::ValueAdjustments => {
                    remove_at(&mut session.value_adjustments, index, false)?
                }
                SubEntityKind::SlotConfigs => remove_at(&mut session.slot_configs, index, false)?,
                SubEntityKind::TokenTypes => remove_at(&mut session.token_types, index, min_one)?,
            };

            if removed {
                let new_len = entity_len(session, kind);
                shift_expanded(&mut session.expanded, kind, index, new_len);
            }
            Ok(())
        })
        .await
    }

    /// 复制一条记录并紧随原记录插入
    pub async fn duplicate_entity(
        &self,
        id: Uuid,
        kind: SubEntityKind,
        index: usize,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            check_entity_supported(session, kind)?;
            match kind {
                SubEntityKind::Slots => {
                    let original = get_at(&session.slots, index)?.clone();
                    let next_id = next_synthetic_id(session.slots.iter().map(|s| &s.slot_id));
                    session.slots.insert(index + 1, original.duplicated(next_id));
                }
                SubEntityKind::Allocations => {
                    let mut clone = get_at(&session.allocations, index)?.clone();
                    // 区分字段：slot内token序号顺延
                    clone.token_id_within_slot = next_synthetic_id(
                        session.allocations.iter().map(|a| &a.token_id_within_slot),
                    );
                    session.allocations.insert(index + 1, clone);
                }
                SubEntityKind::PaymentSchedules => {
                    let clone = get_at(&session.payment_schedules, index)?.duplicated();
                    session.payment_schedules.insert(index + 1, clone);
                }
                SubEntityKind::ValueAdjustments => {
                    let mut clone = get_at(&session.value_adjustments, index)?.clone();
                    clone.adjustment_date = clone.adjustment_date + chrono::Duration::days(30);
                    session.value_adjustments.insert(index + 1, clone);
                }
                SubEntityKind::SlotConfigs => {
                    let mut clone = get_at(&session.slot_configs, index)?.clone();
                    clone.slot_id =
                        next_synthetic_id(session.slot_configs.iter().map(|s| &s.slot_id));
                    session.slot_configs.insert(index + 1, clone);
                }
                SubEntityKind::TokenTypes => {
                    let original = get_at(&session.token_types, index)?.clone();
                    let next_id = next_synthetic_id(session.token_types.iter().map(|t| &t.id));
                    session
                        .token_types
                        .insert(index + 1, original.duplicated(next_id));
                }
            }
            Ok(())
        })
        .await
    }

    /// 记录某个列表当前展开的UI索引
    pub async fn set_expanded(
        &self,
        id: Uuid,
        kind: SubEntityKind,
        index: Option<usize>,
    ) -> Result<FormSession, AppError> {
        self.with_session_mut(id, |session| {
            check_entity_supported(session, kind)?;
            match index {
                Some(index) => {
                    if index >= entity_len(session, kind) {
                        return Err(AppError::index_out_of_range(format!(
                            "Index {} out of range for {}",
                            index,
                            kind.array_key()
                        )));
                    }
                    session.expanded.insert(kind.array_key().to_string(), index);
                }
                None => {
                    session.expanded.remove(kind.array_key());
                }
            }
            Ok(())
        })
        .await
    }

    /// 清理超时会话，返回清理数量
    pub async fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let mut store = self.inner.write().await;
        let before = store.len();
        store.retain(|_, session| session.updated_at > cutoff);
        before - store.len()
    }

    /// 启动后台TTL清理任务
    pub fn spawn_ttl_sweeper(self: &Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                let swept = store.sweep_expired().await;
                if swept > 0 {
                    tracing::info!("Swept {} expired form sessions", swept);
                }
            }
        })
    }
}

fn bad_fields(err: anyhow::Error) -> AppError {
    AppError::bad_request(format!("{:#}", err))
}

fn check_entity_supported(session: &FormSession, kind: SubEntityKind) -> Result<(), AppError> {
    if !kind.supported_by(session.standard) {
        return Err(AppError::entity_not_supported(format!(
            "{} does not apply to {}",
            kind.array_key(),
            session.standard
        )));
    }
    Ok(())
}

fn entity_len(session: &FormSession, kind: SubEntityKind) -> usize {
    match kind {
        SubEntityKind::Slots => session.slots.len(),
        SubEntityKind::Allocations => session.allocations.len(),
        SubEntityKind::PaymentSchedules => session.payment_schedules.len(),
        SubEntityKind::ValueAdjustments => session.value_adjustments.len(),
        SubEntityKind::SlotConfigs => session.slot_configs.len(),
        SubEntityKind::TokenTypes => session.token_types.len(),
    }
}

fn get_at<T>(list: &[T], index: usize) -> Result<&T, AppError> {
    list.get(index).ok_or_else(|| {
        AppError::index_out_of_range(format!("Index {} out of range (len {})", index, list.len()))
    })
}

fn update_at<T>(list: &mut Vec<T>, index: usize, patch: &Map<String, Value>) -> Result<(), AppError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    if index >= list.len() {
        return Err(AppError::index_out_of_range(format!(
            "Index {} out of range (len {})",
            index,
            list.len()
        )));
    }
    list[index] = patched(&list[index], patch).map_err(bad_fields)?;
    Ok(())
}

/// 返回true表示确实删除了记录
fn remove_at<T>(list: &mut Vec<T>, index: usize, min_one: bool) -> Result<bool, AppError> {
    if index >= list.len() {
        return Err(AppError::index_out_of_range(format!(
            "Index {} out of range (len {})",
            index,
            list.len()
        )));
    }
    if min_one && list.len() == 1 {
        // 保底一条，静默忽略
        return Ok(false);
    }
    list.remove(index);
    Ok(true)
}

/// 删除后修正展开索引，保证仍然指向有效位置
fn shift_expanded(
    expanded: &mut BTreeMap<String, usize>,
    kind: SubEntityKind,
    removed_index: usize,
    new_len: usize,
) {
    let key = kind.array_key();
    if let Some(current) = expanded.get(key).copied() {
        if new_len == 0 {
            expanded.remove(key);
        } else if current > removed_index {
            expanded.insert(key.to_string(), current - 1);
        } else if current == removed_index && current >= new_len {
            expanded.insert(key.to_string(), new_len - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(3600)
    }

    #[tokio::test]
    async fn test_create_seeds_min_mode_with_one_slot() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Min, None)
            .await
            .unwrap();
        assert_eq!(session.slots.len(), 1);
        assert!(session.allocations.is_empty());
    }

    #[tokio::test]
    async fn test_remove_last_slot_is_noop_in_min_mode() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Min, None)
            .await
            .unwrap();

        let after = store
            .remove_entity(session.id, SubEntityKind::Slots, 0)
            .await
            .unwrap();
        assert_eq!(after.slots.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_shrinks_list_in_max_mode() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, None)
            .await
            .unwrap();
        store
            .add_entity(session.id, SubEntityKind::Slots, None)
            .await
            .unwrap();

        let after = store
            .remove_entity(session.id, SubEntityKind::Slots, 0)
            .await
            .unwrap();
        assert!(after.slots.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_payment_schedule_splices_after_original() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, None)
            .await
            .unwrap();

        for _ in 0..2 {
            store
                .add_entity(session.id, SubEntityKind::PaymentSchedules, None)
                .await
                .unwrap();
        }
        let mut patch = Map::new();
        patch.insert("paymentDate".into(), Value::String("2025-03-01".into()));
        patch.insert("isCompleted".into(), Value::Bool(true));
        store
            .update_entity(session.id, SubEntityKind::PaymentSchedules, 0, patch)
            .await
            .unwrap();

        let after = store
            .duplicate_entity(session.id, SubEntityKind::PaymentSchedules, 0)
            .await
            .unwrap();

        assert_eq!(after.payment_schedules.len(), 3);
        let copy = &after.payment_schedules[1];
        assert_eq!(
            copy.payment_date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );
        assert!(!copy.is_completed);
    }

    #[tokio::test]
    async fn test_expanded_index_shifts_on_remove() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, None)
            .await
            .unwrap();
        for _ in 0..3 {
            store
                .add_entity(session.id, SubEntityKind::Slots, None)
                .await
                .unwrap();
        }
        store
            .set_expanded(session.id, SubEntityKind::Slots, Some(2))
            .await
            .unwrap();

        let after = store
            .remove_entity(session.id, SubEntityKind::Slots, 0)
            .await
            .unwrap();
        assert_eq!(after.expanded.get("slots"), Some(&1));
    }

    #[tokio::test]
    async fn test_token_types_rejected_for_erc20() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc20, ConfigMode::Min, None)
            .await
            .unwrap();
        let err = store
            .add_entity(session.id, SubEntityKind::TokenTypes, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.code,
            crate::error::AppErrorCode::EntityNotSupported
        ));
    }

    #[tokio::test]
    async fn test_merged_config_round_trip() {
        let store = store();
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, None)
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("name".into(), Value::String("Carbon Note".into()));
        patch.insert("symbol".into(), Value::String("CNOTE".into()));
        store.update_fields(session.id, patch).await.unwrap();
        store
            .add_entity(session.id, SubEntityKind::Slots, None)
            .await
            .unwrap();
        store
            .add_entity(session.id, SubEntityKind::Allocations, None)
            .await
            .unwrap();

        let merged = store.get(session.id).await.unwrap().merged_config().unwrap();

        let replay = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, Some(merged.clone()))
            .await
            .unwrap();

        assert_eq!(replay.config, store.get(session.id).await.unwrap().config);
        assert_eq!(replay.slots, store.get(session.id).await.unwrap().slots);
        assert_eq!(replay.merged_config().unwrap(), merged);
    }

    #[tokio::test]
    async fn test_sweep_expired_sessions() {
        let store = SessionStore::new(0);
        store
            .create(TokenStandard::Erc20, ConfigMode::Min, None)
            .await
            .unwrap();
        // ttl为0时所有会话立即过期
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let swept = store.sweep_expired().await;
        assert_eq!(swept, 1);
        assert_eq!(store.len().await, 0);
    }
}
