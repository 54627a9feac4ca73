//! ERC-3525 校验规则集成测试
//! slot区间、引用完整性与tab状态归并

mod common;

use mintcore::domain::{Severity, TabStatus, TokenStandard, ConfigMode};
use mintcore::service::form_session::SubEntityKind;
use mintcore::service::validation_service;
use serde_json::{json, Map, Value};

fn patch(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn inverted_slot_range_produces_exactly_one_slot_error() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    store
        .update_fields(
            session.id,
            patch(&[("name", json!("Test")), ("symbol", json!("TST"))]),
        )
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[
                ("name", json!("Bad Range")),
                ("minValue", json!("500")),
                ("maxValue", json!("100")),
            ])),
        )
        .await
        .unwrap();

    let session = store.get(session.id).await.unwrap();
    let issues = validation_service::validate(&session);

    let range_issues: Vec<_> = issues
        .iter()
        .filter(|issue| issue.field == "slots[0].valueRange")
        .collect();
    assert_eq!(range_issues.len(), 1);
    assert_eq!(range_issues[0].severity, Severity::Error);
    assert_eq!(range_issues[0].tab, "slots");
}

#[tokio::test]
async fn dangling_references_report_errors_until_slot_exists() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    store
        .update_fields(
            session.id,
            patch(&[("name", json!("Test")), ("symbol", json!("TST"))]),
        )
        .await
        .unwrap();

    // allocation / payment schedule / value adjustment 都指向不存在的slot 42
    for kind in [
        SubEntityKind::Allocations,
        SubEntityKind::PaymentSchedules,
        SubEntityKind::ValueAdjustments,
    ] {
        store
            .add_entity(
                session.id,
                kind,
                Some(patch(&[("slotId", json!("42"))])),
            )
            .await
            .unwrap();
    }

    let before = store.get(session.id).await.unwrap();
    let issues = validation_service::validate(&before);
    assert!(issues.iter().any(|i| i.field == "allocations[0].slotId"));
    assert!(issues.iter().any(|i| i.field == "paymentSchedules[0].slotId"));
    assert!(issues.iter().any(|i| i.field == "valueAdjustments[0].slotId"));

    // 补上slot 42后重算，所有引用错误同时消失
    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[("slotId", json!("42")), ("name", json!("Slot 42"))])),
        )
        .await
        .unwrap();

    let after = store.get(session.id).await.unwrap();
    let issues = validation_service::validate(&after);
    assert!(!issues.iter().any(|i| i.field.ends_with(".slotId")));
}

#[tokio::test]
async fn tab_statuses_reduce_to_three_states() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    // name缺失 -> basic error；slot名称为空 -> slots warning
    store
        .update_fields(session.id, patch(&[("symbol", json!("TST"))]))
        .await
        .unwrap();
    store
        .add_entity(
            session.id,
            SubEntityKind::Slots,
            Some(patch(&[("minValue", json!("1")), ("maxValue", json!("10"))])),
        )
        .await
        .unwrap();

    let session = store.get(session.id).await.unwrap();
    let issues = validation_service::validate(&session);
    let statuses = validation_service::statuses(&session, &issues);

    assert_eq!(statuses["basic"], TabStatus::Error);
    assert_eq!(statuses["slots"], TabStatus::Warning);
    assert_eq!(statuses["allocations"], TabStatus::Complete);
    assert_eq!(statuses["paymentSchedules"], TabStatus::Complete);
}

#[tokio::test]
async fn duplicate_slot_ids_are_rejected() {
    let store = common::test_session_store();
    let session = store
        .create(TokenStandard::Erc3525, ConfigMode::Max, None)
        .await
        .unwrap();
    for _ in 0..2 {
        store
            .add_entity(
                session.id,
                SubEntityKind::Slots,
                Some(patch(&[("slotId", json!("1")), ("name", json!("Dup"))])),
            )
            .await
            .unwrap();
    }

    let session = store.get(session.id).await.unwrap();
    let issues = validation_service::validate(&session);
    assert!(issues
        .iter()
        .any(|i| i.field == "slots[1].slotId" && i.severity == Severity::Error));
}
