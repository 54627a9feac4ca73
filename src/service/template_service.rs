//! 模板生成服务
//!
//! 按标准和模式生成测试控制台可直接编辑的种子JSON。
//! max模板带standardArrays骨架和modules块，min模板只有核心字段。

use anyhow::Context;
use serde_json::{json, Map, Value};

use crate::domain::{
    modules::ModuleSet,
    standard::{ConfigMode, TokenStandard},
    token_config::TokenConfigData,
};

/// 各标准的示例名称/符号
fn sample_identity(standard: TokenStandard) -> (&'static str, &'static str, &'static str) {
    match standard {
        TokenStandard::Erc20 => ("My Utility Token", "MUT", "Fungible utility token"),
        TokenStandard::Erc721 => ("My NFT Collection", "MNFT", "Unique asset collection"),
        TokenStandard::Erc1155 => ("My Multi Token", "MMT", "Semi-fungible multi-token"),
        TokenStandard::Erc1400 => ("My Security Token", "MST", "Regulated security token"),
        TokenStandard::Erc3525 => ("My Semi-Fungible Note", "MSFN", "Slot-based value token"),
        TokenStandard::Erc4626 => ("My Yield Vault", "MYV", "Tokenized yield vault"),
    }
}

/// 生成模板JSON
pub fn template(standard: TokenStandard, mode: ConfigMode) -> anyhow::Result<Value> {
    let config = TokenConfigData::seed(standard, mode);
    let mut object = match config.to_value()? {
        Value::Object(map) => map,
        _ => anyhow::bail!("Template config did not serialize to an object"),
    };

    let (name, symbol, description) = sample_identity(standard);
    object.insert("name".into(), json!(name));
    object.insert("symbol".into(), json!(symbol));
    object.insert("description".into(), json!(description));
    object.insert(
        "standard".into(),
        serde_json::to_value(standard).context("standard serialization")?,
    );
    object.insert(
        "configMode".into(),
        serde_json::to_value(mode).context("configMode serialization")?,
    );

    object.insert("standardArrays".into(), standard_arrays_skeleton(standard, mode));

    if mode == ConfigMode::Max {
        object.insert(
            "modules".into(),
            serde_json::to_value(ModuleSet::default()).context("modules serialization")?,
        );
    }

    Ok(Value::Object(object))
}

/// 所有标准×模式的模板清单
pub fn all_templates() -> anyhow::Result<Vec<(TokenStandard, ConfigMode, Value)>> {
    let mut templates = Vec::new();
    for standard in TokenStandard::ALL {
        for mode in [ConfigMode::Min, ConfigMode::Max] {
            templates.push((standard, mode, template(standard, mode)?));
        }
    }
    Ok(templates)
}

fn standard_arrays_skeleton(standard: TokenStandard, mode: ConfigMode) -> Value {
    match (standard, mode) {
        (TokenStandard::Erc3525, ConfigMode::Max) => json!({
            "slots": [
                {
                    "slotId": "1",
                    "name": "Series A",
                    "description": "",
                    "valueUnits": "units",
                    "minValue": "",
                    "maxValue": "",
                    "transferable": true
                }
            ],
            "allocations": [],
            "paymentSchedules": [],
            "valueAdjustments": [],
            "slotConfigs": []
        }),
        (TokenStandard::Erc3525, ConfigMode::Min) => json!({
            "slots": [
                {
                    "slotId": "1",
                    "name": "Series A",
                    "description": "",
                    "valueUnits": "units",
                    "minValue": "",
                    "maxValue": "",
                    "transferable": true
                }
            ]
        }),
        (TokenStandard::Erc1155, _) => json!({
            "tokenTypes": [
                {
                    "id": "1",
                    "name": "Standard Edition",
                    "supply": "1000",
                    "fungible": true,
                    "maxSupply": "",
                    "metadataUri": ""
                }
            ]
        }),
        _ => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_standard_and_mode_has_a_template() {
        let templates = all_templates().unwrap();
        assert_eq!(templates.len(), 12);
        for (standard, mode, value) in templates {
            assert_eq!(
                value["standard"],
                serde_json::to_value(standard).unwrap(),
                "standard marker missing for {} {}",
                standard,
                mode
            );
            assert!(value.get("name").is_some());
            assert!(value.get("symbol").is_some());
        }
    }

    #[test]
    fn test_max_template_carries_arrays_and_modules() {
        let value = template(TokenStandard::Erc3525, ConfigMode::Max).unwrap();
        assert!(value["standardArrays"]["slots"].is_array());
        assert!(value["standardArrays"]["paymentSchedules"].is_array());
        assert!(value["modules"]["fees"].is_object());
    }

    #[test]
    fn test_min_template_has_no_modules_block() {
        let value = template(TokenStandard::Erc20, ConfigMode::Min).unwrap();
        assert!(value.get("modules").is_none());
        assert_eq!(value["decimals"], "18");
    }

    #[test]
    fn test_template_seeds_a_valid_session() {
        // 模板内容可以直接作为initialConfig还原会话
        let value = template(TokenStandard::Erc3525, ConfigMode::Max).unwrap();
        let store = crate::service::form_session::SessionStore::new(60);
        let session = tokio_test::block_on(store.create(
            TokenStandard::Erc3525,
            ConfigMode::Max,
            Some(value),
        ))
        .unwrap();
        assert_eq!(session.slots.len(), 1);
        assert_eq!(session.config.name(), "My Semi-Fungible Note");
    }
}
