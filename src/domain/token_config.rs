//! 各标准的配置对象模型
//!
//! 原始表单以字段包（bag of fields）方式维护配置，这里用按标准区分的
//! 结构体（discriminated union）落地，字段在表单边界校验。
//! 数值输入字段保留字符串形态，空串表示未填写，校验阶段再解析。
//! 未知字段通过 flatten 保留，保证合并配置可以原样往返。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use super::standard::{ConfigMode, TokenStandard};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-20
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 转账手续费配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeOnTransfer {
    pub enabled: bool,
    pub fee_percentage: String,
    pub fee_recipient: String,
}

/// 弹性供应配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rebasing {
    pub enabled: bool,
    pub mode: String,
    pub target_supply: String,
}

/// 治理功能配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovernanceFeatures {
    pub enabled: bool,
    pub voting_period_days: String,
    pub quorum_percentage: String,
}

/// 防巨鲸配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AntiWhale {
    pub enabled: bool,
    pub max_wallet_amount: String,
    pub cooldown_minutes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc20Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub decimals: String,
    pub initial_supply: String,
    pub cap: String,
    pub token_type: String,
    pub is_mintable: bool,
    pub is_burnable: bool,
    pub is_pausable: bool,
    pub permit: bool,
    pub snapshot: bool,
    pub access_control: String,
    pub allow_management: bool,
    pub fee_on_transfer: FeeOnTransfer,
    pub rebasing: Rebasing,
    pub governance_features: GovernanceFeatures,
    pub anti_whale: AntiWhale,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc20Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            decimals: "18".to_string(),
            initial_supply: String::new(),
            cap: String::new(),
            token_type: "utility".to_string(),
            is_mintable: true,
            is_burnable: false,
            is_pausable: false,
            permit: false,
            snapshot: false,
            access_control: "ownable".to_string(),
            allow_management: false,
            fee_on_transfer: FeeOnTransfer::default(),
            rebasing: Rebasing::default(),
            governance_features: GovernanceFeatures::default(),
            anti_whale: AntiWhale::default(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-721
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc721Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub base_uri: String,
    pub metadata_storage: String,
    pub max_supply: String,
    pub asset_type: String,
    pub minting_method: String,
    pub auto_increment_ids: bool,
    pub enumerable: bool,
    pub uri_storage: String,
    pub is_burnable: bool,
    pub is_pausable: bool,
    pub has_royalty: bool,
    pub royalty_percentage: String,
    pub royalty_receiver: String,
    pub updatable_uris: bool,
    pub access_control: String,
    pub is_revealable: bool,
    pub pre_reveal_uri: String,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc721Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            base_uri: String::new(),
            metadata_storage: "ipfs".to_string(),
            max_supply: String::new(),
            asset_type: "unique_asset".to_string(),
            minting_method: "open".to_string(),
            auto_increment_ids: true,
            enumerable: true,
            uri_storage: "tokenId".to_string(),
            is_burnable: false,
            is_pausable: false,
            has_royalty: false,
            royalty_percentage: String::new(),
            royalty_receiver: String::new(),
            updatable_uris: false,
            access_control: "ownable".to_string(),
            is_revealable: false,
            pre_reveal_uri: String::new(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-1155
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 代币类型记录（ERC-1155子实体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenType {
    pub id: String,
    pub name: String,
    pub supply: String,
    pub fungible: bool,
    pub max_supply: String,
    pub metadata_uri: String,
}

impl Default for TokenType {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
            name: String::new(),
            supply: "1".to_string(),
            fungible: true,
            max_supply: String::new(),
            metadata_uri: String::new(),
        }
    }
}

impl TokenType {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn duplicated(&self, new_id: String) -> Self {
        let mut clone = self.clone();
        clone.id = new_id;
        if !clone.name.is_empty() {
            clone.name = format!("{} (copy)", clone.name);
        }
        clone
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc1155Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub base_uri: String,
    pub metadata_storage: String,
    pub supply_tracking: bool,
    pub is_burnable: bool,
    pub is_pausable: bool,
    pub enable_approval_for_all: bool,
    pub access_control: String,
    pub updatable_uris: bool,
    pub dynamic_uris: bool,
    pub batch_minting_enabled: bool,
    pub batch_transfer_limit: String,
    pub container_enabled: bool,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc1155Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            base_uri: String::new(),
            metadata_storage: "ipfs".to_string(),
            supply_tracking: true,
            is_burnable: false,
            is_pausable: false,
            enable_approval_for_all: true,
            access_control: "ownable".to_string(),
            updatable_uris: false,
            dynamic_uris: false,
            batch_minting_enabled: true,
            batch_transfer_limit: String::new(),
            container_enabled: false,
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-1400
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 分区记录（证券型代币的tranche）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Partition {
    pub name: String,
    pub partition_id: String,
    pub amount: String,
    pub transferable: bool,
}

impl Default for Partition {
    fn default() -> Self {
        Self {
            name: String::new(),
            partition_id: "1".to_string(),
            amount: String::new(),
            transferable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc1400Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub decimals: String,
    pub initial_supply: String,
    pub cap: String,
    pub security_type: String,
    pub is_issuable: bool,
    pub is_controllable: bool,
    pub is_documentable: bool,
    pub document_uri: String,
    pub document_hash: String,
    pub controllers: Vec<String>,
    pub partitions: Vec<Partition>,
    pub default_partition: String,
    pub kyc_required: bool,
    pub accredited_investor_only: bool,
    pub whitelist_enabled: bool,
    pub investor_count_limit: String,
    pub holding_period_days: String,
    pub geographic_restrictions: Vec<String>,
    pub auto_compliance: bool,
    pub manual_approvals: bool,
    pub compliance_module: String,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc1400Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            decimals: "18".to_string(),
            initial_supply: String::new(),
            cap: String::new(),
            security_type: "equity".to_string(),
            is_issuable: true,
            is_controllable: true,
            is_documentable: false,
            document_uri: String::new(),
            document_hash: String::new(),
            controllers: Vec::new(),
            partitions: Vec::new(),
            default_partition: String::new(),
            kyc_required: false,
            accredited_investor_only: false,
            whitelist_enabled: false,
            investor_count_limit: String::new(),
            holding_period_days: String::new(),
            geographic_restrictions: Vec::new(),
            auto_compliance: false,
            manual_approvals: false,
            compliance_module: String::new(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-3525
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc3525Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// min模式使用decimals，max模式使用valueDecimals。
    /// 两套默认字段集有重叠但不一致，保持模式各自的种子，不做统一。
    pub decimals: String,
    pub value_decimals: String,
    pub base_uri: String,
    pub metadata_storage: String,
    pub slot_type: String,
    pub is_burnable: bool,
    pub is_pausable: bool,
    pub has_royalty: bool,
    pub royalty_percentage: String,
    pub royalty_receiver: String,
    pub slot_approvals: bool,
    pub value_approvals: bool,
    pub access_control: String,
    pub updatable_uris: bool,
    pub updatable_slots: bool,
    pub updatable_values: bool,
    pub mergable: bool,
    pub splittable: bool,
    pub value_transfers_enabled: bool,
    pub slot_enumeration_enabled: bool,
    pub value_aggregation: bool,
    pub permissioning_enabled: bool,
    pub supply_tracking: bool,
    pub fractional_ownership_enabled: bool,
    pub use_geographic_restrictions: bool,
    pub default_restriction_policy: String,
    /// 空串 / bond / note / share / derivative
    pub financial_instrument_type: String,
    pub principal_amount: String,
    pub interest_rate: String,
    pub maturity_date: String,
    pub coupon_frequency: String,
    pub early_redemption_enabled: bool,
    pub redemption_penalty_rate: String,
    pub derivative_type: String,
    pub underlying_asset: String,
    pub underlying_asset_address: String,
    pub settlement_type: String,
    pub strike_price: String,
    pub expiration_date: String,
    pub leverage_ratio: String,
    pub contract_size: String,
    pub expirable: bool,
    pub auto_settlement: bool,
    pub custom_extensions: String,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc3525Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            decimals: String::new(),
            value_decimals: String::new(),
            base_uri: String::new(),
            metadata_storage: "ipfs".to_string(),
            slot_type: "generic".to_string(),
            is_burnable: false,
            is_pausable: false,
            has_royalty: false,
            royalty_percentage: String::new(),
            royalty_receiver: String::new(),
            slot_approvals: true,
            value_approvals: true,
            access_control: "ownable".to_string(),
            updatable_uris: false,
            updatable_slots: false,
            updatable_values: false,
            mergable: false,
            splittable: false,
            value_transfers_enabled: true,
            slot_enumeration_enabled: true,
            value_aggregation: false,
            permissioning_enabled: false,
            supply_tracking: true,
            fractional_ownership_enabled: false,
            use_geographic_restrictions: false,
            default_restriction_policy: "blocked".to_string(),
            financial_instrument_type: String::new(),
            principal_amount: String::new(),
            interest_rate: String::new(),
            maturity_date: String::new(),
            coupon_frequency: String::new(),
            early_redemption_enabled: false,
            redemption_penalty_rate: String::new(),
            derivative_type: String::new(),
            underlying_asset: String::new(),
            underlying_asset_address: String::new(),
            settlement_type: String::new(),
            strike_price: String::new(),
            expiration_date: String::new(),
            leverage_ratio: String::new(),
            contract_size: String::new(),
            expirable: false,
            auto_settlement: false,
            custom_extensions: String::new(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ERC-4626
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 金库费率结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultFees {
    pub enabled: bool,
    pub management_fee: String,
    pub performance_fee: String,
    pub deposit_fee: String,
    pub withdrawal_fee: String,
    pub fee_recipient: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc4626Config {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub asset_address: String,
    pub asset_name: String,
    pub asset_symbol: String,
    pub asset_decimals: String,
    pub vault_type: String,
    pub vault_strategy: String,
    pub custom_strategy: String,
    pub strategy_controller: String,
    pub flash_loans: bool,
    pub emergency_shutdown: bool,
    pub performance_metrics: bool,
    pub automated_rebalancing: bool,
    pub yield_source: String,
    pub deposit_limit: String,
    pub withdrawal_limit: String,
    pub min_deposit: String,
    pub max_deposit: String,
    pub fee_structure: VaultFees,
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Erc4626Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            description: String::new(),
            asset_address: String::new(),
            asset_name: String::new(),
            asset_symbol: String::new(),
            asset_decimals: "18".to_string(),
            vault_type: "yield".to_string(),
            vault_strategy: "compound".to_string(),
            custom_strategy: String::new(),
            strategy_controller: String::new(),
            flash_loans: false,
            emergency_shutdown: false,
            performance_metrics: false,
            automated_rebalancing: false,
            yield_source: String::new(),
            deposit_limit: String::new(),
            withdrawal_limit: String::new(),
            min_deposit: String::new(),
            max_deposit: String::new(),
            fee_structure: VaultFees::default(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Discriminated union
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 按标准区分的配置对象
#[derive(Debug, Clone, PartialEq)]
pub enum TokenConfigData {
    Erc20(Erc20Config),
    Erc721(Erc721Config),
    Erc1155(Erc1155Config),
    Erc1400(Erc1400Config),
    Erc3525(Erc3525Config),
    Erc4626(Erc4626Config),
}

impl TokenConfigData {
    /// 按标准和模式生成默认种子
    pub fn seed(standard: TokenStandard, mode: ConfigMode) -> Self {
        match standard {
            TokenStandard::Erc20 => TokenConfigData::Erc20(Erc20Config::default()),
            TokenStandard::Erc721 => TokenConfigData::Erc721(Erc721Config::default()),
            TokenStandard::Erc1155 => TokenConfigData::Erc1155(Erc1155Config::default()),
            TokenStandard::Erc1400 => TokenConfigData::Erc1400(Erc1400Config::default()),
            TokenStandard::Erc3525 => {
                let mut config = Erc3525Config::default();
                // 两种模式的默认字段集不统一，min用decimals，max用valueDecimals
                match mode {
                    ConfigMode::Min => config.decimals = "18".to_string(),
                    ConfigMode::Max => config.value_decimals = "18".to_string(),
                }
                TokenConfigData::Erc3525(config)
            }
            TokenStandard::Erc4626 => TokenConfigData::Erc4626(Erc4626Config::default()),
        }
    }

    pub fn standard(&self) -> TokenStandard {
        match self {
            TokenConfigData::Erc20(_) => TokenStandard::Erc20,
            TokenConfigData::Erc721(_) => TokenStandard::Erc721,
            TokenConfigData::Erc1155(_) => TokenStandard::Erc1155,
            TokenConfigData::Erc1400(_) => TokenStandard::Erc1400,
            TokenConfigData::Erc3525(_) => TokenStandard::Erc3525,
            TokenConfigData::Erc4626(_) => TokenStandard::Erc4626,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TokenConfigData::Erc20(c) => &c.name,
            TokenConfigData::Erc721(c) => &c.name,
            TokenConfigData::Erc1155(c) => &c.name,
            TokenConfigData::Erc1400(c) => &c.name,
            TokenConfigData::Erc3525(c) => &c.name,
            TokenConfigData::Erc4626(c) => &c.name,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            TokenConfigData::Erc20(c) => &c.symbol,
            TokenConfigData::Erc721(c) => &c.symbol,
            TokenConfigData::Erc1155(c) => &c.symbol,
            TokenConfigData::Erc1400(c) => &c.symbol,
            TokenConfigData::Erc3525(c) => &c.symbol,
            TokenConfigData::Erc4626(c) => &c.symbol,
        }
    }

    /// 序列化为JSON对象（camelCase字段）
    pub fn to_value(&self) -> anyhow::Result<Value> {
        let value = match self {
            TokenConfigData::Erc20(c) => serde_json::to_value(c),
            TokenConfigData::Erc721(c) => serde_json::to_value(c),
            TokenConfigData::Erc1155(c) => serde_json::to_value(c),
            TokenConfigData::Erc1400(c) => serde_json::to_value(c),
            TokenConfigData::Erc3525(c) => serde_json::to_value(c),
            TokenConfigData::Erc4626(c) => serde_json::to_value(c),
        };
        value.context("Failed to serialize token config")
    }

    /// 从JSON对象还原（按标准选择目标结构体）
    pub fn from_value(standard: TokenStandard, value: Value) -> anyhow::Result<Self> {
        let config = match standard {
            TokenStandard::Erc20 => TokenConfigData::Erc20(
                serde_json::from_value(value).context("Invalid ERC-20 config")?,
            ),
            TokenStandard::Erc721 => TokenConfigData::Erc721(
                serde_json::from_value(value).context("Invalid ERC-721 config")?,
            ),
            TokenStandard::Erc1155 => TokenConfigData::Erc1155(
                serde_json::from_value(value).context("Invalid ERC-1155 config")?,
            ),
            TokenStandard::Erc1400 => TokenConfigData::Erc1400(
                serde_json::from_value(value).context("Invalid ERC-1400 config")?,
            ),
            TokenStandard::Erc3525 => TokenConfigData::Erc3525(
                serde_json::from_value(value).context("Invalid ERC-3525 config")?,
            ),
            TokenStandard::Erc4626 => TokenConfigData::Erc4626(
                serde_json::from_value(value).context("Invalid ERC-4626 config")?,
            ),
        };
        Ok(config)
    }

    /// 字段级补丁：整体序列化、覆盖补丁键、整体还原。
    /// null值表示清空该字段（还原为默认值）。
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> anyhow::Result<()> {
        let mut current = self.to_value()?;
        let obj = current
            .as_object_mut()
            .context("Token config did not serialize to an object")?;

        for (key, value) in patch {
            if value.is_null() {
                obj.remove(key);
            } else {
                obj.insert(key.clone(), value.clone());
            }
        }

        *self = Self::from_value(self.standard(), current)?;
        Ok(())
    }
}
