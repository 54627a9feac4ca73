//! 表单会话生命周期集成测试
//! 覆盖字段更新、子实体CRUD、复制规则与合并配置往返

mod common;

use chrono::NaiveDate;
use mintcore::domain::{ConfigMode, TokenStandard};
use mintcore::service::form_session::SubEntityKind;
use serde_json::{json, Map, Value};

fn patch(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn duplicate_payment_schedule_inserts_shifted_copy() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();

    store
        .add_entity(
            session.id,
            SubEntityKind::PaymentSchedules,
            Some(patch(&[
                ("paymentDate", json!("2025-01-15")),
                ("paymentAmount", json!("5000")),
                ("isCompleted", json!(true)),
            ])),
        )
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::PaymentSchedules,
            Some(patch(&[("paymentDate", json!("2025-07-15"))])),
        )
        .await
        .unwrap();

    let after = store
        .duplicate_entity(session.id, SubEntityKind::PaymentSchedules, 0)
        .await
        .unwrap();

    assert_eq!(after.payment_schedules.len(), 3);
    // 插入在原记录之后，而不是列表末尾
    let copy = &after.payment_schedules[1];
    assert_eq!(
        copy.payment_date,
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
    );
    assert_eq!(copy.payment_amount, "5000");
    // 完成标记无条件清空
    assert!(!copy.is_completed);
    // 原记录与后续记录不受影响
    assert!(after.payment_schedules[0].is_completed);
    assert_eq!(
        after.payment_schedules[2].payment_date,
        NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
    );
}

#[tokio::test]
async fn min_mode_lists_keep_at_least_one_entry() {
    let store = common::test_session_store();

    // ERC-3525 min：slots保底一条
    let erc3525 = store
        .create(TokenStandard::Erc3525, ConfigMode::Min, None)
        .await
        .unwrap();
    assert_eq!(erc3525.slots.len(), 1);
    let after = store
        .remove_entity(erc3525.id, SubEntityKind::Slots, 0)
        .await
        .unwrap();
    assert_eq!(after.slots.len(), 1);

    // ERC-1155 min：tokenTypes保底一条
    let erc1155 = store
        .create(TokenStandard::Erc1155, ConfigMode::Min, None)
        .await
        .unwrap();
    assert_eq!(erc1155.token_types.len(), 1);
    let after = store
        .remove_entity(erc1155.id, SubEntityKind::TokenTypes, 0)
        .await
        .unwrap();
    assert_eq!(after.token_types.len(), 1);

    // max模式没有保底约束
    let max = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    store
        .add_entity(max.id, SubEntityKind::Slots, None)
        .await
        .unwrap();
    let after = store
        .remove_entity(max.id, SubEntityKind::Slots, 0)
        .await
        .unwrap();
    assert!(after.slots.is_empty());
}

#[tokio::test]
async fn slot_ids_grow_from_max_parsed_id() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();

    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[("slotId", json!("7"))])),
        )
        .await
        .unwrap();
    let after = store
        .add_entity(session.id, SubEntityKind::Slots, None)
        .await
        .unwrap();

    assert_eq!(after.slots[1].slot_id, "8");
}

#[tokio::test]
async fn update_entity_replaces_one_field_only() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[
                ("name", json!("Senior Tranche")),
                ("minValue", json!("10")),
                ("maxValue", json!("100")),
            ])),
        )
        .await
        .unwrap();

    let after = store
        .update_entity(
            session.id,
            SubEntityKind::Slots,
            0,
            patch(&[("maxValue", json!("250"))]),
        )
        .await
        .unwrap();

    assert_eq!(after.slots[0].max_value, "250");
    assert_eq!(after.slots[0].name, "Senior Tranche");
    assert_eq!(after.slots[0].min_value, "10");
}

#[tokio::test]
async fn merged_config_round_trips_through_initial_config() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();

    store
        .update_fields(
            session.id,
            patch(&[
                ("name", json!("Carbon Forward Note")),
                ("symbol", json!("CFN")),
                ("financialInstrumentType", json!("bond")),
                ("principalAmount", json!("1000000")),
            ]),
        )
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[
                ("name", json!("2027 Vintage")),
                ("minValue", json!("1")),
                ("maxValue", json!("5000")),
            ])),
        )
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::Allocations,
            Some(patch(&[
                ("recipient", json!("0x1111")),
                ("value", json!("2500")),
            ])),
        )
        .await
        .unwrap();
    store
        .add_entity(session.id, SubEntityKind::PaymentSchedules, None)
        .await
        .unwrap();

    let original = store.get(session.id).await.unwrap();
    let merged = original.merged_config().unwrap();

    // 合并配置作为initialConfig重新挂载
    let replay = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, Some(merged.clone()))
        .await
        .unwrap();

    assert_eq!(replay.config, original.config);
    assert_eq!(replay.slots, original.slots);
    assert_eq!(replay.allocations, original.allocations);
    assert_eq!(replay.payment_schedules, original.payment_schedules);
    assert_eq!(replay.modules, original.modules);
    // 再次导出得到等价JSON（顺序保持）
    assert_eq!(replay.merged_config().unwrap(), merged);
}

#[tokio::test]
async fn module_toggle_resets_on_disable() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc20, ConfigMode::Max, None)
        .await
        .unwrap();

    let after = store
        .set_module(
            session.id,
            mintcore::domain::ModuleKind::Vesting,
            true,
            Some(patch(&[("cliffDays", json!("30"))])),
        )
        .await
        .unwrap();
    assert!(after.modules.vesting.enabled);
    assert_eq!(after.modules.vesting.cliff_days, "30");
    // 未填写的字段补默认
    assert_eq!(after.modules.vesting.duration_days, "365");

    let after = store
        .set_module(session.id, mintcore::domain::ModuleKind::Vesting, false, None)
        .await
        .unwrap();
    assert!(!after.modules.vesting.enabled);
    assert_eq!(after.modules.vesting.cliff_days, "");
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc721, ConfigMode::Min, None)
        .await
        .unwrap();
    store.delete(session.id).await.unwrap();
    assert!(store.get(session.id).await.is_err());
}
