//! 示例配置目录服务
//!
//! 从外部文件发现服务拉取示例JSON清单，内存缓存 + 固定周期刷新。
//! 过滤是四个谓词的合取（搜索词、资产类型、分类、代币标准），
//! 每次请求对内存列表直接扫描，不建索引、不分页。
//! 刷新失败保留旧清单，只记日志。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::domain::standard::{ConfigMode, TokenStandard};

/// 资产类型展示名 -> 内部slug 的固定映射
static ASSET_TYPE_SLUGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Alternative Assets / Carbon Credits", "alternative-assets/carbon-credits"),
        ("Alternative Assets / Real Estate", "alternative-assets/real-estate"),
        ("Alternative Assets / Private Equity", "alternative-assets/private-equity"),
        ("Alternative Assets / Collectibles", "alternative-assets/collectibles"),
        ("Stablecoins / Fiat-Backed", "stablecoins/fiat-backed"),
        ("Stablecoins / Crypto-Backed", "stablecoins/crypto-backed"),
        ("Stablecoins / Algorithmic", "stablecoins/algorithmic"),
        ("Funds / Money Market", "funds/money-market"),
        ("Funds / Digital Tokenized Fund", "funds/digital-tokenized-fund"),
        ("Bonds / Corporate", "bonds/corporate"),
        ("Bonds / Sovereign", "bonds/sovereign"),
        ("Equity / Private Company", "equity/private-company"),
        ("Structured Products / Credit Linked", "structured-products/credit-linked"),
    ])
});

/// 展示名转slug，未知输入原样当slug使用（允许前端直接传slug）
pub fn asset_type_slug(display_or_slug: &str) -> String {
    ASSET_TYPE_SLUGS
        .get(display_or_slug)
        .map(|slug| slug.to_string())
        .unwrap_or_else(|| display_or_slug.to_string())
}

/// 已知的资产类型展示名（本地兜底列表）
pub fn known_asset_types() -> Vec<String> {
    let mut names: Vec<String> = ASSET_TYPE_SLUGS.keys().map(|k| k.to_string()).collect();
    names.sort();
    names
}

/// 示例文件元数据（由发现服务持有，这里只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExampleFileItem {
    pub name: String,
    pub path: String,
    pub asset_type: String,
    pub category: String,
    pub token_standard: String,
    #[serde(default)]
    pub config_mode: Option<String>,
}

/// 选中文件的加载结果
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadedExample {
    pub content: String,
    #[schema(value_type = Option<String>)]
    pub token_standard: Option<TokenStandard>,
    #[schema(value_type = Option<String>)]
    pub config_mode: Option<ConfigMode>,
}

/// 过滤条件（全部可选，取合取）
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub asset_type: Option<String>,
    pub category: Option<String>,
    pub standard: Option<String>,
}

/// 文件发现服务客户端
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn discover_files(&self) -> Result<Vec<ExampleFileItem>>;
    async fn load_file(&self, path: &str) -> Result<String>;
    async fn asset_types(&self) -> Result<Vec<String>>;
    async fn categories(&self) -> Result<Vec<String>>;
}

/// HTTP实现：对接外部发现服务
pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout_secs,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .with_context(|| format!("Failed to reach discovery service: {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Discovery service error: {}", response.status());
        }

        response
            .json::<T>()
            .await
            .context("Failed to decode discovery service response")
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn discover_files(&self) -> Result<Vec<ExampleFileItem>> {
        self.get_json(format!("{}/files", self.base_url)).await
    }

    async fn load_file(&self, path: &str) -> Result<String> {
        let url = format!(
            "{}/files/content?path={}",
            self.base_url,
            urlencode(path)
        );
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .with_context(|| format!("Failed to load example file: {}", path))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("Example file not found: {}", path);
        }
        if !response.status().is_success() {
            anyhow::bail!("Discovery service error: {}", response.status());
        }

        response
            .text()
            .await
            .context("Failed to read example file content")
    }

    async fn asset_types(&self) -> Result<Vec<String>> {
        self.get_json(format!("{}/asset-types", self.base_url)).await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.get_json(format!("{}/categories", self.base_url)).await
    }
}

/// 最小百分号编码，仅处理路径里常见的分隔符
fn urlencode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// 静态实现：固定清单 + 内嵌内容（测试与离线开发用）
#[derive(Default)]
pub struct StaticCatalogClient {
    pub items: Vec<ExampleFileItem>,
    pub contents: HashMap<String, String>,
}

#[async_trait]
impl CatalogClient for StaticCatalogClient {
    async fn discover_files(&self) -> Result<Vec<ExampleFileItem>> {
        Ok(self.items.clone())
    }

    async fn load_file(&self, path: &str) -> Result<String> {
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Example file not found: {}", path))
    }

    async fn asset_types(&self) -> Result<Vec<String>> {
        Ok(known_asset_types())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let mut categories: Vec<String> =
            self.items.iter().map(|item| item.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

/// 目录服务：缓存 + 周期刷新 + 过滤
pub struct CatalogService {
    client: Arc<dyn CatalogClient>,
    cache: RwLock<Vec<ExampleFileItem>>,
    last_refreshed: RwLock<Option<DateTime<Utc>>>,
    refresh_interval_secs: u64,
}

impl CatalogService {
    pub fn new(client: Arc<dyn CatalogClient>, refresh_interval_secs: u64) -> Self {
        Self {
            client,
            cache: RwLock::new(Vec::new()),
            last_refreshed: RwLock::new(None),
            refresh_interval_secs,
        }
    }

    /// 拉取最新清单。失败时保留旧清单。
    pub async fn refresh(&self) -> Result<usize> {
        let files = self.client.discover_files().await?;
        let count = files.len();
        *self.cache.write().await = files;
        *self.last_refreshed.write().await = Some(Utc::now());
        Ok(count)
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.read().await
    }

    /// 四谓词合取过滤
    pub async fn filtered(&self, filter: &CatalogFilter) -> Vec<ExampleFileItem> {
        let cache = self.cache.read().await;

        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let asset_slug = filter
            .asset_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(asset_type_slug);
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let standard = filter
            .standard
            .as_deref()
            .and_then(TokenStandard::parse_lenient);

        cache
            .iter()
            .filter(|item| {
                if let Some(search) = &search {
                    let haystack =
                        format!("{} {}", item.name.to_lowercase(), item.path.to_lowercase());
                    if !haystack.contains(search.as_str()) {
                        return false;
                    }
                }
                if let Some(slug) = &asset_slug {
                    if item.asset_type != *slug {
                        return false;
                    }
                }
                if let Some(category) = &category {
                    if item.category.to_lowercase() != *category {
                        return false;
                    }
                }
                if let Some(standard) = standard {
                    match TokenStandard::parse_lenient(&item.token_standard) {
                        Some(item_standard) if item_standard == standard => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    /// 加载选中文件并嗅探标准/模式。失败不影响缓存状态。
    pub async fn load(&self, path: &str) -> Result<LoadedExample> {
        let content = self.client.load_file(path).await?;

        let (token_standard, config_mode) = match serde_json::from_str::<serde_json::Value>(&content)
        {
            Ok(value) => {
                let standard = value
                    .get("standard")
                    .or_else(|| value.get("tokenStandard"))
                    .and_then(|v| v.as_str())
                    .and_then(TokenStandard::parse_lenient);
                let mode = value
                    .get("configMode")
                    .or_else(|| value.get("config_mode"))
                    .and_then(|v| v.as_str())
                    .and_then(ConfigMode::parse_lenient);
                (standard, mode)
            }
            // 内容不是合法JSON时原样返回，由调用方决定怎么处理
            Err(_) => (None, None),
        };

        Ok(LoadedExample {
            content,
            token_standard,
            config_mode,
        })
    }

    pub async fn asset_types(&self) -> Vec<String> {
        match self.client.asset_types().await {
            Ok(types) if !types.is_empty() => types,
            Ok(_) => known_asset_types(),
            Err(e) => {
                tracing::warn!("Falling back to built-in asset types: {}", e);
                known_asset_types()
            }
        }
    }

    pub async fn categories(&self) -> Vec<String> {
        match self.client.categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!("Failed to fetch categories: {}", e);
                Vec::new()
            }
        }
    }

    /// 启动固定周期的后台刷新任务
    pub fn start_background_refresher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                service.refresh_interval_secs,
            ));
            loop {
                ticker.tick().await;
                match service.refresh().await {
                    Ok(count) => {
                        tracing::debug!("Example catalog refreshed: {} files", count);
                    }
                    Err(e) => {
                        // 保留上一份清单
                        tracing::warn!("Example catalog refresh failed: {}", e);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, asset_type: &str, category: &str, standard: &str) -> ExampleFileItem {
        ExampleFileItem {
            name: name.to_string(),
            path: format!("/examples/{}.json", name),
            asset_type: asset_type.to_string(),
            category: category.to_string(),
            token_standard: standard.to_string(),
            config_mode: None,
        }
    }

    fn service_with(items: Vec<ExampleFileItem>) -> Arc<CatalogService> {
        let client = Arc::new(StaticCatalogClient {
            items,
            contents: HashMap::new(),
        });
        Arc::new(CatalogService::new(client, 60))
    }

    #[tokio::test]
    async fn test_display_name_maps_to_slug() {
        let service = service_with(vec![
            item("carbon", "alternative-assets/carbon-credits", "primary", "ERC-3525"),
            item("usd-coin", "stablecoins/fiat-backed", "primary", "ERC-20"),
        ]);
        service.refresh().await.unwrap();

        let filter = CatalogFilter {
            asset_type: Some("Alternative Assets / Carbon Credits".to_string()),
            ..CatalogFilter::default()
        };
        let results = service.filtered(&filter).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "carbon");
    }

    #[tokio::test]
    async fn test_category_and_standard_intersect() {
        let service = service_with(vec![
            item("a", "bonds/corporate", "primary", "ERC-3525"),
            item("b", "bonds/corporate", "primary", "ERC-20"),
            item("c", "bonds/corporate", "secondary", "ERC-3525"),
        ]);
        service.refresh().await.unwrap();

        let filter = CatalogFilter {
            category: Some("primary".to_string()),
            standard: Some("erc3525".to_string()),
            ..CatalogFilter::default()
        };
        let results = service.filtered(&filter).await;
        // 交集而不是并集
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "a");
    }

    #[tokio::test]
    async fn test_search_matches_name_and_path() {
        let service = service_with(vec![
            item("carbon-forward", "alternative-assets/carbon-credits", "primary", "ERC-3525"),
            item("treasury-bill", "bonds/sovereign", "primary", "ERC-1400"),
        ]);
        service.refresh().await.unwrap();

        let filter = CatalogFilter {
            search: Some("CARBON".to_string()),
            ..CatalogFilter::default()
        };
        let results = service.filtered(&filter).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "carbon-forward");
    }

    #[tokio::test]
    async fn test_load_sniffs_standard_and_mode() {
        let mut contents = HashMap::new();
        contents.insert(
            "/examples/x.json".to_string(),
            r#"{"name":"X","standard":"erc3525","configMode":"advanced"}"#.to_string(),
        );
        let client = Arc::new(StaticCatalogClient {
            items: Vec::new(),
            contents,
        });
        let service = CatalogService::new(client, 60);

        let loaded = service.load("/examples/x.json").await.unwrap();
        assert_eq!(loaded.token_standard, Some(TokenStandard::Erc3525));
        assert_eq!(loaded.config_mode, Some(ConfigMode::Max));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cache() {
        let service = service_with(vec![item(
            "kept",
            "bonds/corporate",
            "primary",
            "ERC-20",
        )]);
        service.refresh().await.unwrap();

        assert!(service.load("/missing.json").await.is_err());
        let remaining = service.filtered(&CatalogFilter::default()).await;
        assert_eq!(remaining.len(), 1);
    }
}
