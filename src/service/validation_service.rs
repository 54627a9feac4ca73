//! 配置校验服务
//!
//! 每次状态变化整体重算：自上而下跑完全部检查，不短路、不排序，
//! 每条失败追加一个ValidationIssue。引用完整性（allocation指向的
//! slot必须存在）只在这里检查，插入时不拦截。

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::{
    domain::{
        standard::TokenStandard,
        token_config::{
            Erc1155Config, Erc1400Config, Erc20Config, Erc3525Config, Erc4626Config, Erc721Config,
            TokenConfigData,
        },
        validation::{tab_statuses, TabStatus, ValidationIssue},
    },
    service::form_session::FormSession,
};

/// 各标准的tab全集（无问题的tab也会给出complete状态）
pub fn tabs_for(standard: TokenStandard) -> &'static [&'static str] {
    match standard {
        TokenStandard::Erc3525 => &[
            "basic",
            "slots",
            "allocations",
            "paymentSchedules",
            "valueAdjustments",
            "advanced",
        ],
        TokenStandard::Erc1155 => &["basic", "tokenTypes", "advanced"],
        TokenStandard::Erc1400 => &["basic", "partitions", "compliance", "advanced"],
        _ => &["basic", "advanced"],
    }
}

/// 全量校验入口
pub fn validate(session: &FormSession) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    validate_common(session, &mut issues);

    match &session.config {
        TokenConfigData::Erc20(config) => validate_erc20(config, &mut issues),
        TokenConfigData::Erc721(config) => validate_erc721(config, &mut issues),
        TokenConfigData::Erc1155(config) => validate_erc1155(session, config, &mut issues),
        TokenConfigData::Erc1400(config) => validate_erc1400(config, &mut issues),
        TokenConfigData::Erc3525(config) => validate_erc3525(session, config, &mut issues),
        TokenConfigData::Erc4626(config) => validate_erc4626(config, &mut issues),
    }

    validate_modules(session, &mut issues);

    issues
}

/// tab三态归并
pub fn statuses(
    session: &FormSession,
    issues: &[ValidationIssue],
) -> std::collections::BTreeMap<String, TabStatus> {
    tab_statuses(tabs_for(session.standard), issues)
}

/// 完成度启发式：40%基础字段 / 30%slots / 20%allocations / 10%高级字段。
/// 纯进度条装饰，无规范含义。
pub fn completion_percent(session: &FormSession) -> u8 {
    let basic_fields: [bool; 3] = [
        !session.config.name().trim().is_empty(),
        !session.config.symbol().trim().is_empty(),
        match &session.config {
            TokenConfigData::Erc3525(c) => {
                !c.decimals.trim().is_empty() || !c.value_decimals.trim().is_empty()
            }
            TokenConfigData::Erc20(c) => !c.decimals.trim().is_empty(),
            TokenConfigData::Erc721(c) => !c.base_uri.trim().is_empty(),
            TokenConfigData::Erc1155(c) => !c.base_uri.trim().is_empty(),
            TokenConfigData::Erc1400(c) => !c.decimals.trim().is_empty(),
            TokenConfigData::Erc4626(c) => !c.asset_address.trim().is_empty(),
        },
    ];
    let basic_ratio =
        basic_fields.iter().filter(|f| **f).count() as f64 / basic_fields.len() as f64;

    match session.standard {
        TokenStandard::Erc3525 => {
            let slot_ratio = if session.slots.is_empty() { 0.0 } else { 1.0 };
            let allocation_ratio = if session.allocations.is_empty() {
                0.0
            } else {
                1.0
            };
            let advanced_done = match &session.config {
                TokenConfigData::Erc3525(c) => !c.financial_instrument_type.trim().is_empty(),
                _ => false,
            };
            let advanced_ratio = if advanced_done { 1.0 } else { 0.0 };

            let percent = basic_ratio * 40.0
                + slot_ratio * 30.0
                + allocation_ratio * 20.0
                + advanced_ratio * 10.0;
            percent.round() as u8
        }
        TokenStandard::Erc1155 => {
            let types_ratio = if session.token_types.is_empty() {
                0.0
            } else {
                1.0
            };
            (basic_ratio * 60.0 + types_ratio * 40.0).round() as u8
        }
        _ => (basic_ratio * 100.0).round() as u8,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 通用检查
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn validate_common(session: &FormSession, issues: &mut Vec<ValidationIssue>) {
    if session.config.name().trim().is_empty() {
        issues.push(ValidationIssue::error(
            "name",
            "Token name is required",
            "basic",
        ));
    }
    if session.config.symbol().trim().is_empty() {
        issues.push(ValidationIssue::error(
            "symbol",
            "Token symbol is required",
            "basic",
        ));
    } else if session.config.symbol().trim().len() > 11 {
        issues.push(ValidationIssue::warning(
            "symbol",
            "Symbols longer than 11 characters may be truncated by wallets",
            "basic",
        ));
    }
}

/// 解析0-18的小数位输入，空串跳过
fn check_decimals(field: &str, raw: &str, tab: &str, issues: &mut Vec<ValidationIssue>) {
    if raw.trim().is_empty() {
        return;
    }
    match raw.trim().parse::<u32>() {
        Ok(value) if value <= 18 => {}
        Ok(_) => issues.push(ValidationIssue::error(
            field,
            "Decimals must be between 0 and 18",
            tab,
        )),
        Err(_) => issues.push(ValidationIssue::error(
            field,
            "Decimals must be a whole number",
            tab,
        )),
    }
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.trim().parse::<Decimal>().ok()
}

/// 非空但不可解析为非负数时报错
fn check_amount(field: &str, raw: &str, tab: &str, issues: &mut Vec<ValidationIssue>) {
    if raw.trim().is_empty() {
        return;
    }
    match parse_amount(raw) {
        Some(value) if value >= Decimal::ZERO => {}
        Some(_) => issues.push(ValidationIssue::error(
            field,
            "Value must not be negative",
            tab,
        )),
        None => issues.push(ValidationIssue::error(
            field,
            "Value must be a number",
            tab,
        )),
    }
}

fn check_percentage(field: &str, raw: &str, tab: &str, issues: &mut Vec<ValidationIssue>) {
    if raw.trim().is_empty() {
        return;
    }
    match parse_amount(raw) {
        Some(value) if value >= Decimal::ZERO && value <= Decimal::from(100) => {}
        Some(_) => issues.push(ValidationIssue::error(
            field,
            "Percentage must be between 0 and 100",
            tab,
        )),
        None => issues.push(ValidationIssue::error(
            field,
            "Percentage must be a number",
            tab,
        )),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 按标准的检查
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn validate_erc20(config: &Erc20Config, issues: &mut Vec<ValidationIssue>) {
    check_decimals("decimals", &config.decimals, "basic", issues);
    check_amount("initialSupply", &config.initial_supply, "basic", issues);
    check_amount("cap", &config.cap, "basic", issues);

    if let (Some(supply), Some(cap)) = (
        parse_amount(&config.initial_supply),
        parse_amount(&config.cap),
    ) {
        if cap < supply {
            issues.push(ValidationIssue::error(
                "cap",
                "Supply cap must not be below the initial supply",
                "basic",
            ));
        }
    }

    if config.fee_on_transfer.enabled {
        check_percentage(
            "feeOnTransfer.feePercentage",
            &config.fee_on_transfer.fee_percentage,
            "advanced",
            issues,
        );
        if config.fee_on_transfer.fee_recipient.trim().is_empty() {
            issues.push(ValidationIssue::error(
                "feeOnTransfer.feeRecipient",
                "Fee recipient is required when transfer fees are enabled",
                "advanced",
            ));
        }
    }

    if config.governance_features.enabled {
        check_percentage(
            "governanceFeatures.quorumPercentage",
            &config.governance_features.quorum_percentage,
            "advanced",
            issues,
        );
    }
}

fn validate_erc721(config: &Erc721Config, issues: &mut Vec<ValidationIssue>) {
    check_amount("maxSupply", &config.max_supply, "basic", issues);

    if config.base_uri.trim().is_empty() && config.metadata_storage == "ipfs" {
        issues.push(ValidationIssue::warning(
            "baseUri",
            "A base URI is recommended when metadata is stored on IPFS",
            "basic",
        ));
    }

    if config.has_royalty {
        check_percentage(
            "royaltyPercentage",
            &config.royalty_percentage,
            "advanced",
            issues,
        );
        if config.royalty_receiver.trim().is_empty() {
            issues.push(ValidationIssue::error(
                "royaltyReceiver",
                "Royalty receiver is required when royalties are enabled",
                "advanced",
            ));
        }
    }

    if config.is_revealable && config.pre_reveal_uri.trim().is_empty() {
        issues.push(ValidationIssue::warning(
            "preRevealUri",
            "A placeholder URI is recommended for delayed reveal collections",
            "advanced",
        ));
    }
}

fn validate_erc1155(
    session: &FormSession,
    config: &Erc1155Config,
    issues: &mut Vec<ValidationIssue>,
) {
    if session.token_types.is_empty() {
        issues.push(ValidationIssue::error(
            "tokenTypes",
            "At least one token type is required",
            "tokenTypes",
        ));
    }

    let mut seen_ids = HashSet::new();
    for (index, token_type) in session.token_types.iter().enumerate() {
        if token_type.name.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("tokenTypes[{}].name", index),
                "Token type name is empty",
                "tokenTypes",
            ));
        }
        check_amount(
            &format!("tokenTypes[{}].supply", index),
            &token_type.supply,
            "tokenTypes",
            issues,
        );
        check_amount(
            &format!("tokenTypes[{}].maxSupply", index),
            &token_type.max_supply,
            "tokenTypes",
            issues,
        );
        if !seen_ids.insert(token_type.id.trim().to_string()) {
            issues.push(ValidationIssue::error(
                format!("tokenTypes[{}].id", index),
                format!("Duplicate token type id {}", token_type.id),
                "tokenTypes",
            ));
        }
    }

    if config.dynamic_uris && !config.updatable_uris {
        issues.push(ValidationIssue::warning(
            "dynamicUris",
            "Dynamic URIs usually require updatable URIs to be enabled",
            "advanced",
        ));
    }
}

fn validate_erc1400(config: &Erc1400Config, issues: &mut Vec<ValidationIssue>) {
    check_decimals("decimals", &config.decimals, "basic", issues);
    check_amount("initialSupply", &config.initial_supply, "basic", issues);

    if config.partitions.is_empty() {
        issues.push(ValidationIssue::warning(
            "partitions",
            "No partitions defined, all tokens will live in the default partition",
            "partitions",
        ));
    }
    for (index, partition) in config.partitions.iter().enumerate() {
        if partition.name.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("partitions[{}].name", index),
                "Partition name is empty",
                "partitions",
            ));
        }
        check_amount(
            &format!("partitions[{}].amount", index),
            &partition.amount,
            "partitions",
            issues,
        );
    }

    if config.is_controllable && config.controllers.is_empty() {
        issues.push(ValidationIssue::error(
            "controllers",
            "Controllable tokens need at least one controller address",
            "compliance",
        ));
    }

    // 合规建议类检查保持warning，不阻塞提交
    if config.kyc_required && !config.accredited_investor_only {
        issues.push(ValidationIssue::warning(
            "accreditedInvestorOnly",
            "KYC-required offerings usually restrict to accredited investors",
            "compliance",
        ));
    }
    if config.whitelist_enabled && !config.kyc_required {
        issues.push(ValidationIssue::warning(
            "kycRequired",
            "Whitelisting without KYC provides limited compliance coverage",
            "compliance",
        ));
    }

    check_amount(
        "investorCountLimit",
        &config.investor_count_limit,
        "compliance",
        issues,
    );
    check_amount(
        "holdingPeriodDays",
        &config.holding_period_days,
        "compliance",
        issues,
    );
}

fn validate_erc3525(
    session: &FormSession,
    config: &Erc3525Config,
    issues: &mut Vec<ValidationIssue>,
) {
    check_decimals("decimals", &config.decimals, "basic", issues);
    check_decimals("valueDecimals", &config.value_decimals, "basic", issues);

    // ─── slots ───
    if session.slots.is_empty() {
        issues.push(ValidationIssue::error(
            "slots",
            "At least one slot is required",
            "slots",
        ));
    }

    let mut seen_slot_ids: HashSet<String> = HashSet::new();
    for (index, slot) in session.slots.iter().enumerate() {
        if slot.name.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("slots[{}].name", index),
                "Slot name is empty",
                "slots",
            ));
        }
        if !seen_slot_ids.insert(slot.slot_id.trim().to_string()) {
            issues.push(ValidationIssue::error(
                format!("slots[{}].slotId", index),
                format!("Duplicate slot id {}", slot.slot_id),
                "slots",
            ));
        }

        check_amount(
            &format!("slots[{}].minValue", index),
            &slot.min_value,
            "slots",
            issues,
        );
        check_amount(
            &format!("slots[{}].maxValue", index),
            &slot.max_value,
            "slots",
            issues,
        );

        // 两个边界都填写且可解析时检查区间，每个slot至多一条
        if !slot.min_value.trim().is_empty() && !slot.max_value.trim().is_empty() {
            if let (Some(min), Some(max)) =
                (parse_amount(&slot.min_value), parse_amount(&slot.max_value))
            {
                if min >= max {
                    issues.push(ValidationIssue::error(
                        format!("slots[{}].valueRange", index),
                        "Slot minimum value must be below its maximum value",
                        "slots",
                    ));
                }
            }
        }
    }

    let slot_ids: HashSet<&str> = session
        .slots
        .iter()
        .map(|slot| slot.slot_id.as_str())
        .collect();

    // ─── allocations ───
    for (index, allocation) in session.allocations.iter().enumerate() {
        if !slot_ids.contains(allocation.slot_id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("allocations[{}].slotId", index),
                format!("Allocation references unknown slot {}", allocation.slot_id),
                "allocations",
            ));
        }
        if allocation.recipient.trim().is_empty() {
            issues.push(ValidationIssue::error(
                format!("allocations[{}].recipient", index),
                "Allocation recipient is required",
                "allocations",
            ));
        }
        check_amount(
            &format!("allocations[{}].value", index),
            &allocation.value,
            "allocations",
            issues,
        );
    }

    // ─── payment schedules ───
    for (index, schedule) in session.payment_schedules.iter().enumerate() {
        if !slot_ids.contains(schedule.slot_id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("paymentSchedules[{}].slotId", index),
                format!("Payment schedule references unknown slot {}", schedule.slot_id),
                "paymentSchedules",
            ));
        }
        check_amount(
            &format!("paymentSchedules[{}].paymentAmount", index),
            &schedule.payment_amount,
            "paymentSchedules",
            issues,
        );
        if !schedule.is_completed && schedule.payment_date < chrono::Utc::now().date_naive() {
            issues.push(ValidationIssue::warning(
                format!("paymentSchedules[{}].paymentDate", index),
                "Payment date is in the past but the payment is not marked completed",
                "paymentSchedules",
            ));
        }
    }

    // ─── value adjustments ───
    for (index, adjustment) in session.value_adjustments.iter().enumerate() {
        if !slot_ids.contains(adjustment.slot_id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("valueAdjustments[{}].slotId", index),
                format!(
                    "Value adjustment references unknown slot {}",
                    adjustment.slot_id
                ),
                "valueAdjustments",
            ));
        }
        check_amount(
            &format!("valueAdjustments[{}].adjustmentValue", index),
            &adjustment.adjustment_value,
            "valueAdjustments",
            issues,
        );
        if adjustment.adjustment_reason.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                format!("valueAdjustments[{}].adjustmentReason", index),
                "An adjustment reason helps auditors reconcile revaluations",
                "valueAdjustments",
            ));
        }
    }

    // ─── slot configs ───
    for (index, slot_config) in session.slot_configs.iter().enumerate() {
        if !slot_ids.contains(slot_config.slot_id.as_str()) {
            issues.push(ValidationIssue::error(
                format!("slotConfigs[{}].slotId", index),
                format!("Slot config references unknown slot {}", slot_config.slot_id),
                "slots",
            ));
        }
        check_amount(
            &format!("slotConfigs[{}].maxSupply", index),
            &slot_config.max_supply,
            "slots",
            issues,
        );
    }

    // ─── 金融工具条件字段 ───
    match config.financial_instrument_type.trim() {
        "bond" | "note" => {
            if config.principal_amount.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    "principalAmount",
                    "Principal amount is required for debt instruments",
                    "advanced",
                ));
            } else {
                check_amount("principalAmount", &config.principal_amount, "advanced", issues);
            }
            if config.interest_rate.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    "interestRate",
                    "Interest rate is required for debt instruments",
                    "advanced",
                ));
            } else {
                check_percentage("interestRate", &config.interest_rate, "advanced", issues);
            }
            if config.maturity_date.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    "maturityDate",
                    "Maturity date is required for debt instruments",
                    "advanced",
                ));
            }
            if config.coupon_frequency.trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    "couponFrequency",
                    "Coupon frequency is usually set for debt instruments",
                    "advanced",
                ));
            }
        }
        "derivative" => {
            if config.derivative_type.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    "derivativeType",
                    "Derivative type is required for derivative instruments",
                    "advanced",
                ));
            }
            if config.underlying_asset.trim().is_empty() {
                issues.push(ValidationIssue::error(
                    "underlyingAsset",
                    "Underlying asset is required for derivative instruments",
                    "advanced",
                ));
            }
            check_amount("strikePrice", &config.strike_price, "advanced", issues);
            check_amount("leverageRatio", &config.leverage_ratio, "advanced", issues);
        }
        _ => {}
    }

    if config.has_royalty {
        check_percentage(
            "royaltyPercentage",
            &config.royalty_percentage,
            "advanced",
            issues,
        );
        if config.royalty_receiver.trim().is_empty() {
            issues.push(ValidationIssue::error(
                "royaltyReceiver",
                "Royalty receiver is required when royalties are enabled",
                "advanced",
            ));
        }
    }

    if config.mergable && !config.splittable {
        issues.push(ValidationIssue::warning(
            "mergable",
            "Mergable values without splitting usually indicate a one-way design",
            "advanced",
        ));
    }
}

fn validate_erc4626(config: &Erc4626Config, issues: &mut Vec<ValidationIssue>) {
    if config.asset_address.trim().is_empty() {
        issues.push(ValidationIssue::error(
            "assetAddress",
            "Underlying asset address is required",
            "basic",
        ));
    }
    check_decimals("assetDecimals", &config.asset_decimals, "basic", issues);

    check_amount("minDeposit", &config.min_deposit, "advanced", issues);
    check_amount("maxDeposit", &config.max_deposit, "advanced", issues);
    if let (Some(min), Some(max)) = (
        parse_amount(&config.min_deposit),
        parse_amount(&config.max_deposit),
    ) {
        if min > max {
            issues.push(ValidationIssue::error(
                "minDeposit",
                "Minimum deposit must not exceed maximum deposit",
                "advanced",
            ));
        }
    }

    if config.fee_structure.enabled {
        check_percentage(
            "feeStructure.managementFee",
            &config.fee_structure.management_fee,
            "advanced",
            issues,
        );
        check_percentage(
            "feeStructure.performanceFee",
            &config.fee_structure.performance_fee,
            "advanced",
            issues,
        );
        if config.fee_structure.fee_recipient.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                "feeStructure.feeRecipient",
                "Without a fee recipient collected fees stay in the vault",
                "advanced",
            ));
        }
    }

    if config.vault_strategy == "custom" && config.custom_strategy.trim().is_empty() {
        issues.push(ValidationIssue::error(
            "customStrategy",
            "Custom strategy address is required for custom vault strategies",
            "advanced",
        ));
    }
}

/// 模块级检查（只看模块自身，模块之间不协调）
fn validate_modules(session: &FormSession, issues: &mut Vec<ValidationIssue>) {
    let modules = &session.modules;

    if modules.fees.enabled {
        check_percentage(
            "modules.fees.transferFeePercentage",
            &modules.fees.transfer_fee_percentage,
            "advanced",
            issues,
        );
        if modules.fees.fee_recipient.trim().is_empty() {
            issues.push(ValidationIssue::error(
                "modules.fees.feeRecipient",
                "Fee module needs a recipient address",
                "advanced",
            ));
        }
    }

    if modules.royalty.enabled {
        check_percentage(
            "modules.royalty.royaltyPercentage",
            &modules.royalty.royalty_percentage,
            "advanced",
            issues,
        );
    }

    if modules.vesting.enabled && modules.vesting.entries.is_empty() {
        issues.push(ValidationIssue::warning(
            "modules.vesting.entries",
            "Vesting is enabled but no beneficiaries are defined",
            "advanced",
        ));
    }

    if modules.withdrawal_queue.enabled {
        check_amount(
            "modules.withdrawalQueue.maxQueueSize",
            &modules.withdrawal_queue.max_queue_size,
            "advanced",
            issues,
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;
    use crate::domain::{ConfigMode, Severity};
    use crate::service::form_session::{SessionStore, SubEntityKind};

    async fn max_3525_session(store: &SessionStore) -> crate::service::form_session::FormSession {
        let session = store
            .create(TokenStandard::Erc3525, ConfigMode::Max, None)
            .await
            .unwrap();
        let mut patch = Map::new();
        patch.insert("name".into(), Value::String("Carbon Note".into()));
        patch.insert("symbol".into(), Value::String("CNOTE".into()));
        store.update_fields(session.id, patch).await.unwrap();
        store.get(session.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_inverted_slot_range_yields_exactly_one_error() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;

        let mut init = Map::new();
        init.insert("name".into(), Value::String("Tranche A".into()));
        init.insert("minValue".into(), Value::String("100".into()));
        init.insert("maxValue".into(), Value::String("10".into()));
        store
            .add_entity(session.id, SubEntityKind::Slots, Some(init))
            .await
            .unwrap();

        let session = store.get(session.id).await.unwrap();
        let issues = validate(&session);

        let range_errors: Vec<_> = issues
            .iter()
            .filter(|i| i.field.ends_with(".valueRange"))
            .collect();
        assert_eq!(range_errors.len(), 1);
        assert_eq!(range_errors[0].severity, Severity::Error);
        assert_eq!(range_errors[0].tab, "slots");
    }

    #[tokio::test]
    async fn test_equal_bounds_also_fail() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;

        let mut init = Map::new();
        init.insert("minValue".into(), Value::String("50".into()));
        init.insert("maxValue".into(), Value::String("50".into()));
        store
            .add_entity(session.id, SubEntityKind::Slots, Some(init))
            .await
            .unwrap();

        let session = store.get(session.id).await.unwrap();
        let issues = validate(&session);
        assert!(issues.iter().any(|i| i.field.ends_with(".valueRange")));
    }

    #[tokio::test]
    async fn test_empty_bound_skips_range_check() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;

        let mut init = Map::new();
        init.insert("minValue".into(), Value::String("100".into()));
        store
            .add_entity(session.id, SubEntityKind::Slots, Some(init))
            .await
            .unwrap();

        let session = store.get(session.id).await.unwrap();
        let issues = validate(&session);
        assert!(!issues.iter().any(|i| i.field.ends_with(".valueRange")));
    }

    #[tokio::test]
    async fn test_dangling_allocation_clears_after_adding_slot() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;

        let mut init = Map::new();
        init.insert("slotId".into(), Value::String("9".into()));
        init.insert("recipient".into(), Value::String("0xabc".into()));
        init.insert("value".into(), Value::String("10".into()));
        store
            .add_entity(session.id, SubEntityKind::Allocations, Some(init))
            .await
            .unwrap();

        let before = store.get(session.id).await.unwrap();
        let issues = validate(&before);
        assert!(issues
            .iter()
            .any(|i| i.field == "allocations[0].slotId" && i.severity == Severity::Error));

        // 补上slot后整体重算，该问题消失
        let mut slot = Map::new();
        slot.insert("slotId".into(), Value::String("9".into()));
        slot.insert("name".into(), Value::String("Tranche 9".into()));
        store
            .add_entity(session.id, SubEntityKind::Slots, Some(slot))
            .await
            .unwrap();

        let after = store.get(session.id).await.unwrap();
        let issues = validate(&after);
        assert!(!issues.iter().any(|i| i.field == "allocations[0].slotId"));
    }

    #[tokio::test]
    async fn test_debt_instrument_conditional_fields() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;

        let mut patch = Map::new();
        patch.insert(
            "financialInstrumentType".into(),
            Value::String("bond".into()),
        );
        store.update_fields(session.id, patch).await.unwrap();

        let session = store.get(session.id).await.unwrap();
        let issues = validate(&session);
        assert!(issues.iter().any(|i| i.field == "principalAmount"));
        assert!(issues.iter().any(|i| i.field == "interestRate"));
        assert!(issues.iter().any(|i| i.field == "maturityDate"));
    }

    #[tokio::test]
    async fn test_kyc_advisory_stays_warning() {
        let store = SessionStore::new(3600);
        let session = store
            .create(TokenStandard::Erc1400, ConfigMode::Max, None)
            .await
            .unwrap();
        let mut patch = Map::new();
        patch.insert("name".into(), Value::String("Private Equity".into()));
        patch.insert("symbol".into(), Value::String("PEQ".into()));
        patch.insert("kycRequired".into(), Value::Bool(true));
        store.update_fields(session.id, patch).await.unwrap();

        let session = store.get(session.id).await.unwrap();
        let issues = validate(&session);
        let advisory = issues
            .iter()
            .find(|i| i.field == "accreditedInvestorOnly")
            .expect("advisory issue missing");
        assert_eq!(advisory.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_completion_percent_weights() {
        let store = SessionStore::new(3600);
        let session = max_3525_session(&store).await;
        // name/symbol/valueDecimals已填，slots和allocations为空
        let snapshot = store.get(session.id).await.unwrap();
        assert_eq!(completion_percent(&snapshot), 40);

        store
            .add_entity(session.id, SubEntityKind::Slots, None)
            .await
            .unwrap();
        let snapshot = store.get(session.id).await.unwrap();
        assert_eq!(completion_percent(&snapshot), 70);

        store
            .add_entity(session.id, SubEntityKind::Allocations, None)
            .await
            .unwrap();
        let snapshot = store.get(session.id).await.unwrap();
        assert_eq!(completion_percent(&snapshot), 90);
    }
}
