//! 测试控制台的JSON规范化
//!
//! 把自由编辑的JSON整形为上游代币服务可接受的payload：
//! legacy格式的blocks.*蛇形字段映射为顶层驼峰字段（显式映射表，
//! 不再散落在调用点的fallback表达式里），枚举字符串收敛为规范值，
//! 再按标准补齐缺省字段。纯防御性数据整形，无算法结构。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::standard::{ConfigMode, TokenStandard};

/// 解析/校验失败
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid JSON: {0}")]
    Parse(String),
    #[error("Payload must be a JSON object")]
    NotAnObject,
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Unsupported token standard: {0}")]
    UnsupportedStandard(String),
}

/// payload格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// 顶层驼峰字段 + standardArrays
    Enhanced,
    /// blocks.* 蛇形镜像的旧格式
    Legacy,
}

/// 解析结果
#[derive(Debug, Clone)]
pub struct ParsedPayload {
    pub format: PayloadFormat,
    pub standard: TokenStandard,
    pub config_mode: ConfigMode,
    pub data: Value,
}

/// legacy蛇形字段 -> 顶层驼峰字段 的显式映射表
const LEGACY_FIELD_MAP: &[(&str, &str)] = &[
    ("token_type", "tokenType"),
    ("is_mintable", "isMintable"),
    ("is_burnable", "isBurnable"),
    ("is_pausable", "isPausable"),
    ("initial_supply", "initialSupply"),
    ("max_supply", "maxSupply"),
    ("base_uri", "baseUri"),
    ("metadata_storage", "metadataStorage"),
    ("value_decimals", "valueDecimals"),
    ("access_control", "accessControl"),
    ("has_royalty", "hasRoyalty"),
    ("royalty_percentage", "royaltyPercentage"),
    ("royalty_receiver", "royaltyReceiver"),
    ("transfer_restrictions", "transferRestrictions"),
    ("kyc_required", "kycRequired"),
    ("accredited_investor_only", "accreditedInvestorOnly"),
    ("whitelist_enabled", "whitelistEnabled"),
    ("slot_type", "slotType"),
    ("financial_instrument_type", "financialInstrumentType"),
    ("principal_amount", "principalAmount"),
    ("interest_rate", "interestRate"),
    ("maturity_date", "maturityDate"),
    ("asset_address", "assetAddress"),
    ("vault_type", "vaultType"),
    ("vault_strategy", "vaultStrategy"),
];

/// 字符串"true"/"false"/0/1需要收敛为bool的字段
const BOOLEAN_FIELDS: &[&str] = &[
    "isMintable",
    "isBurnable",
    "isPausable",
    "hasRoyalty",
    "kycRequired",
    "accreditedInvestorOnly",
    "whitelistEnabled",
    "transferRestrictions",
    "supplyTracking",
    "updatableUris",
    "mergable",
    "splittable",
    "expirable",
    "autoSettlement",
    "permit",
    "snapshot",
];

static SNAKE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([a-z0-9])").expect("valid regex"));

/// snake_case转camelCase（映射表之外的blocks字段走通用转换）
pub fn snake_to_camel(name: &str) -> String {
    SNAKE_SEGMENT
        .replace_all(name, |caps: &regex::Captures<'_>| caps[1].to_uppercase())
        .to_string()
}

/// 是否携带增强格式字段
pub fn has_enhanced_fields(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.contains_key("standardArrays") || obj.contains_key("modules"))
        .unwrap_or(false)
}

/// 解析并校验自由编辑的JSON文本
pub fn parse_and_validate(raw: &str) -> Result<ParsedPayload, NormalizeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| NormalizeError::Parse(e.to_string()))?;

    let object = match &value {
        Value::Object(map) => map.clone(),
        _ => return Err(NormalizeError::NotAnObject),
    };

    // blocks镜像存在即视为legacy，否则按增强格式处理
    let format = if object.contains_key("blocks") && !object.contains_key("standardArrays") {
        PayloadFormat::Legacy
    } else {
        PayloadFormat::Enhanced
    };

    let mut data = Value::Object(object);
    if format == PayloadFormat::Legacy {
        remap_legacy_blocks(&mut data);
    }

    // 必填字段在remap之后检查，缺失项完整列出
    let missing: Vec<String> = ["name", "symbol", "standard"]
        .iter()
        .filter(|field| {
            data.get(**field)
                .and_then(Value::as_str)
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::MissingFields(missing));
    }

    let raw_standard = data
        .get("standard")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let standard = TokenStandard::parse_lenient(&raw_standard)
        .ok_or(NormalizeError::UnsupportedStandard(raw_standard))?;

    let config_mode = data
        .get("configMode")
        .or_else(|| data.get("config_mode"))
        .and_then(Value::as_str)
        .and_then(ConfigMode::parse_lenient)
        .unwrap_or(ConfigMode::Min);

    normalize(&mut data, standard, config_mode);

    Ok(ParsedPayload {
        format,
        standard,
        config_mode,
        data,
    })
}

/// 宽松校验（relaxed只要求name），返回(valid, errors)
pub fn validate_token_data(data: &Value, relaxed: bool) -> (bool, Vec<String>) {
    let required: &[&str] = if relaxed {
        &["name"]
    } else {
        &["name", "symbol", "standard"]
    };
    let errors: Vec<String> = required
        .iter()
        .filter(|field| {
            data.get(**field)
                .and_then(Value::as_str)
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|field| format!("Missing required field: {}", field))
        .collect();
    (errors.is_empty(), errors)
}

/// blocks.* -> 顶层驼峰字段。顶层已有值优先，blocks镜像保留不动。
fn remap_legacy_blocks(data: &mut Value) {
    let blocks = match data.get("blocks").and_then(Value::as_object) {
        Some(blocks) => blocks.clone(),
        None => return,
    };
    let object = match data.as_object_mut() {
        Some(object) => object,
        None => return,
    };

    for (snake, camel) in LEGACY_FIELD_MAP {
        if object.contains_key(*camel) {
            continue;
        }
        if let Some(value) = blocks.get(*snake) {
            object.insert(camel.to_string(), value.clone());
        }
    }

    // 映射表之外的字段走通用蛇形转驼峰
    for (key, value) in &blocks {
        let camel = snake_to_camel(key);
        if !object.contains_key(&camel) {
            object.insert(camel, value.clone());
        }
    }
}

/// 缺省补齐：已有字段绝不覆盖
fn ensure(object: &mut Map<String, Value>, key: &str, default: Value) {
    if !object.contains_key(key) {
        object.insert(key.to_string(), default);
    }
}

/// 规范化：枚举收敛 + 布尔收敛 + 按标准补缺省
pub fn normalize(data: &mut Value, standard: TokenStandard, config_mode: ConfigMode) {
    let object = match data.as_object_mut() {
        Some(object) => object,
        None => return,
    };

    // 枚举收敛
    object.insert("standard".into(), json!(standard.as_str()));
    object.insert("configMode".into(), json!(config_mode.as_str()));

    // 布尔收敛："true"/"false"/1/0
    for field in BOOLEAN_FIELDS {
        if let Some(value) = object.get(*field) {
            let coerced = match value {
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(true),
                    "false" | "0" | "no" | "" => Some(false),
                    _ => None,
                },
                Value::Number(n) => n.as_i64().map(|n| n != 0),
                _ => None,
            };
            if let Some(coerced) = coerced {
                object.insert(field.to_string(), Value::Bool(coerced));
            }
        }
    }

    ensure(object, "description", json!(""));
    ensure(object, "metadata", json!({}));

    // 按标准的扁平缺省链
    match standard {
        TokenStandard::Erc20 => {
            ensure(object, "decimals", json!("18"));
            ensure(object, "initialSupply", json!(""));
            ensure(object, "isMintable", json!(true));
            ensure(object, "isBurnable", json!(false));
            ensure(object, "isPausable", json!(false));
            ensure(object, "accessControl", json!("ownable"));
            ensure(object, "tokenType", json!("utility"));
        }
        TokenStandard::Erc721 => {
            ensure(object, "baseUri", json!(""));
            ensure(object, "metadataStorage", json!("ipfs"));
            ensure(object, "maxSupply", json!(""));
            ensure(object, "hasRoyalty", json!(false));
            ensure(object, "royaltyPercentage", json!(""));
            ensure(object, "royaltyReceiver", json!(""));
            ensure(object, "accessControl", json!("ownable"));
            ensure(object, "assetType", json!("unique_asset"));
        }
        TokenStandard::Erc1155 => {
            ensure(object, "baseUri", json!(""));
            ensure(object, "metadataStorage", json!("ipfs"));
            ensure(object, "supplyTracking", json!(true));
            ensure(object, "batchMintingEnabled", json!(true));
            ensure(object, "accessControl", json!("ownable"));
        }
        TokenStandard::Erc1400 => {
            ensure(object, "decimals", json!("18"));
            ensure(object, "initialSupply", json!(""));
            ensure(object, "isIssuable", json!(true));
            ensure(object, "isControllable", json!(true));
            ensure(object, "kycRequired", json!(false));
            ensure(object, "whitelistEnabled", json!(false));
            ensure(object, "controllers", json!([]));
            ensure(object, "partitions", json!([]));
        }
        TokenStandard::Erc3525 => {
            match config_mode {
                ConfigMode::Min => ensure(object, "decimals", json!("18")),
                ConfigMode::Max => ensure(object, "valueDecimals", json!("18")),
            }
            ensure(object, "baseUri", json!(""));
            ensure(object, "metadataStorage", json!("ipfs"));
            ensure(object, "slotType", json!("generic"));
            ensure(object, "slotApprovals", json!(true));
            ensure(object, "valueApprovals", json!(true));
            ensure(object, "financialInstrumentType", json!(""));
            ensure(object, "accessControl", json!("ownable"));
        }
        TokenStandard::Erc4626 => {
            ensure(object, "assetAddress", json!(""));
            ensure(object, "assetDecimals", json!("18"));
            ensure(object, "vaultType", json!("yield"));
            ensure(object, "vaultStrategy", json!("compound"));
        }
    }

    // 增强格式的standardArrays骨架
    let wants_arrays = object.contains_key("standardArrays")
        || matches!(standard, TokenStandard::Erc3525 | TokenStandard::Erc1155);
    if wants_arrays {
        let arrays = object
            .entry("standardArrays")
            .or_insert_with(|| json!({}));
        if let Some(arrays) = arrays.as_object_mut() {
            match standard {
                TokenStandard::Erc3525 => {
                    for key in [
                        "slots",
                        "allocations",
                        "paymentSchedules",
                        "valueAdjustments",
                        "slotConfigs",
                    ] {
                        if !arrays.contains_key(key) {
                            arrays.insert(key.to_string(), json!([]));
                        }
                    }
                }
                TokenStandard::Erc1155 => {
                    if !arrays.contains_key("tokenTypes") {
                        arrays.insert("tokenTypes".to_string(), json!([]));
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_fields_listed_exactly() {
        let raw = r#"{"standardArrays": {"slots": []}, "description": "no identity"}"#;
        let err = parse_and_validate(raw).unwrap_err();
        match err {
            NormalizeError::MissingFields(fields) => {
                assert_eq!(fields, vec!["name", "symbol", "standard"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_partially_missing_fields() {
        let raw = r#"{"standardArrays": {}, "name": "X", "standard": "erc20"}"#;
        let err = parse_and_validate(raw).unwrap_err();
        match err {
            NormalizeError::MissingFields(fields) => assert_eq!(fields, vec!["symbol"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = parse_and_validate("{not json").unwrap_err();
        assert!(matches!(err, NormalizeError::Parse(_)));
    }

    #[test]
    fn test_legacy_blocks_remap() {
        let raw = r#"{
            "name": "Legacy Coin",
            "symbol": "LGC",
            "standard": "ERC20",
            "blocks": {
                "is_mintable": "true",
                "initial_supply": "1000000",
                "custom_widget_flag": "steel"
            }
        }"#;
        let parsed = parse_and_validate(raw).unwrap();

        assert_eq!(parsed.format, PayloadFormat::Legacy);
        // 映射表字段 + 布尔收敛
        assert_eq!(parsed.data["isMintable"], json!(true));
        assert_eq!(parsed.data["initialSupply"], "1000000");
        // 映射表外字段走通用转换
        assert_eq!(parsed.data["customWidgetFlag"], "steel");
        // 旧镜像保留
        assert!(parsed.data["blocks"].is_object());
    }

    #[test]
    fn test_top_level_wins_over_blocks() {
        let raw = r#"{
            "name": "X", "symbol": "X", "standard": "erc20",
            "initialSupply": "42",
            "blocks": {"initial_supply": "99"}
        }"#;
        let parsed = parse_and_validate(raw).unwrap();
        assert_eq!(parsed.data["initialSupply"], "42");
    }

    #[test]
    fn test_standard_coerced_to_canonical() {
        let raw = r#"{"name": "X", "symbol": "X", "standard": "erc3525", "configMode": "advanced"}"#;
        let parsed = parse_and_validate(raw).unwrap();
        assert_eq!(parsed.standard, TokenStandard::Erc3525);
        assert_eq!(parsed.config_mode, ConfigMode::Max);
        assert_eq!(parsed.data["standard"], "ERC-3525");
        assert_eq!(parsed.data["configMode"], "max");
        // max模式补valueDecimals而不是decimals
        assert_eq!(parsed.data["valueDecimals"], "18");
        assert!(parsed.data.get("decimals").is_none());
        // 3525的数组骨架补齐
        assert!(parsed.data["standardArrays"]["slots"].is_array());
    }

    #[test]
    fn test_unsupported_standard_rejected() {
        let raw = r#"{"name": "X", "symbol": "X", "standard": "BEP-20"}"#;
        let err = parse_and_validate(raw).unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedStandard(_)));
    }

    #[test]
    fn test_existing_values_never_overwritten() {
        let raw = r#"{"name": "X", "symbol": "X", "standard": "erc20", "decimals": "6"}"#;
        let parsed = parse_and_validate(raw).unwrap();
        assert_eq!(parsed.data["decimals"], "6");
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("is_mintable"), "isMintable");
        assert_eq!(snake_to_camel("value_decimals"), "valueDecimals");
        assert_eq!(snake_to_camel("already"), "already");
        assert_eq!(snake_to_camel("erc_20_like"), "erc20Like");
    }

    #[test]
    fn test_relaxed_validation() {
        let data = json!({"name": "Only Name"});
        let (valid, errors) = validate_token_data(&data, true);
        assert!(valid);
        assert!(errors.is_empty());

        let (valid, errors) = validate_token_data(&data, false);
        assert!(!valid);
        assert_eq!(errors.len(), 2);
    }
}
