//! 代币标准定义模块
//!
//! 定义支持的ERC标准及配置模式，统一宽松解析规则

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// 支持的代币标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStandard {
    /// 同质化代币 (fungible)
    Erc20,
    /// 非同质化代币 (NFT)
    Erc721,
    /// 多代币标准 (semi-fungible)
    Erc1155,
    /// 证券型代币 (security token)
    Erc1400,
    /// 半同质化代币 (slot + value)
    Erc3525,
    /// 收益金库标准 (tokenized vault)
    Erc4626,
}

impl TokenStandard {
    pub const ALL: [TokenStandard; 6] = [
        TokenStandard::Erc20,
        TokenStandard::Erc721,
        TokenStandard::Erc1155,
        TokenStandard::Erc1400,
        TokenStandard::Erc3525,
        TokenStandard::Erc4626,
    ];

    /// 规范字符串表示（线上格式）
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStandard::Erc20 => "ERC-20",
            TokenStandard::Erc721 => "ERC-721",
            TokenStandard::Erc1155 => "ERC-1155",
            TokenStandard::Erc1400 => "ERC-1400",
            TokenStandard::Erc3525 => "ERC-3525",
            TokenStandard::Erc4626 => "ERC-4626",
        }
    }

    /// 宽松解析："erc20"、"ERC20"、"ERC-20"、"erc_20" 均可识别
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "erc20" => Some(TokenStandard::Erc20),
            "erc721" => Some(TokenStandard::Erc721),
            "erc1155" => Some(TokenStandard::Erc1155),
            "erc1400" => Some(TokenStandard::Erc1400),
            "erc3525" => Some(TokenStandard::Erc3525),
            "erc4626" => Some(TokenStandard::Erc4626),
            _ => None,
        }
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TokenStandard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenStandard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TokenStandard::parse_lenient(&raw)
            .ok_or_else(|| de::Error::custom(format!("Unsupported token standard: {}", raw)))
    }
}

/// 配置模式：min（基础字段）/ max（完整字段 + 子实体）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfigMode {
    #[default]
    Min,
    Max,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Min => "min",
            ConfigMode::Max => "max",
        }
    }

    /// 宽松解析，兼容旧格式别名 basic/advanced
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "min" | "basic" | "simple" => Some(ConfigMode::Min),
            "max" | "advanced" | "detailed" => Some(ConfigMode::Max),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConfigMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConfigMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ConfigMode::parse_lenient(&raw)
            .ok_or_else(|| de::Error::custom(format!("Unsupported config mode: {}", raw)))
    }
}
