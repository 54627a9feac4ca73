//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 上游服务配置（代币CRUD服务 + 示例文件发现服务）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub token_service_url: String,
    pub discovery_service_url: String,
    pub request_timeout_secs: u64,
}

/// 示例目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
}

/// 表单会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8090".into()),
            frontend_url: std::env::var("FRONTEND_URL").ok(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            token_service_url: std::env::var("TOKEN_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3001/api/v1".into()),
            discovery_service_url: std::env::var("DISCOVERY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3002/api/v1/examples".into()),
            request_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            auto_refresh: std::env::var("CATALOG_AUTO_REFRESH")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(true),
            // 前端的自动刷新节奏是60秒，保持一致
            refresh_interval_secs: std::env::var("CATALOG_REFRESH_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86400), // 默认24小时
            sweep_interval_secs: std::env::var("SESSION_SWEEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            upstream: UpstreamConfig::default(),
            catalog: CatalogConfig::default(),
            session: SessionConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                let file_config = Self::from_file(path)?;
                // 合并配置（文件配置覆盖环境变量）
                config = file_config;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        // 验证上游地址格式
        if !self.upstream.token_service_url.starts_with("http://")
            && !self.upstream.token_service_url.starts_with("https://")
        {
            anyhow::bail!("TOKEN_SERVICE_URL must start with http:// or https://");
        }
        if !self.upstream.discovery_service_url.starts_with("http://")
            && !self.upstream.discovery_service_url.starts_with("https://")
        {
            anyhow::bail!("DISCOVERY_SERVICE_URL must start with http:// or https://");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        // 刷新周期下限，避免把发现服务打挂
        if self.catalog.refresh_interval_secs < 5 {
            anyhow::bail!("CATALOG_REFRESH_SECS must be at least 5");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_config_from_env() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.catalog.refresh_interval_secs, 60);
        assert_eq!(config.session.ttl_secs, 86400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9090"

[logging]
level = "info"
format = "text"

[upstream]
token_service_url = "http://tokens.internal/api/v1"
discovery_service_url = "http://examples.internal/api/v1"
request_timeout_secs = 5

[catalog]
auto_refresh = false
refresh_interval_secs = 120

[session]
ttl_secs = 3600
sweep_interval_secs = 60
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert!(!config.catalog.auto_refresh);
        assert_eq!(config.catalog.refresh_interval_secs, 120);
        assert_eq!(config.session.ttl_secs, 3600);
    }

    #[test]
    fn test_config_validation_rejects_bad_refresh() {
        let mut config = Config::from_env().unwrap();
        config.catalog.refresh_interval_secs = 1;
        assert!(config.validate().is_err());
    }
}
