//! 代币CRUD服务客户端
//!
//! 对接外部的代币部署后端。所有调用都是单次网络请求，
//! 无重试、无回滚，失败直接上抛给调用方展示。

use anyhow::{Context, Result};
use serde_json::Value;

/// 上游代币服务客户端
pub struct TokenServiceClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl TokenServiceClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout_secs,
        }
    }

    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    async fn decode(response: reqwest::Response, action: &str) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token service {} failed: {} {}", action, status, body);
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to decode token service {} response", action))
    }

    /// 创建代币配置
    pub async fn create_token(
        &self,
        project_id: &str,
        data: &Value,
        has_enhanced_fields: bool,
    ) -> Result<Value> {
        let url = format!(
            "{}/projects/{}/tokens?enhanced={}",
            self.base_url, project_id, has_enhanced_fields
        );
        tracing::info!("Creating token via {}", url);

        let response = self
            .client
            .post(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .json(data)
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "create").await
    }

    /// 读取基础代币记录
    pub async fn get_token(&self, project_id: &str, token_id: &str) -> Result<Value> {
        let url = format!(
            "{}/projects/{}/tokens/{}",
            self.base_url, project_id, token_id
        );
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "read").await
    }

    /// 读取完整代币记录（含标准子实体）
    pub async fn get_complete_token(&self, project_id: &str, token_id: &str) -> Result<Value> {
        let url = format!(
            "{}/projects/{}/tokens/{}/complete",
            self.base_url, project_id, token_id
        );
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "read").await
    }

    /// 更新代币配置
    pub async fn update_token(
        &self,
        project_id: &str,
        token_id: &str,
        data: &Value,
    ) -> Result<Value> {
        let url = format!(
            "{}/projects/{}/tokens/{}",
            self.base_url, project_id, token_id
        );
        tracing::info!("Updating token via {}", url);

        let response = self
            .client
            .put(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .json(data)
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "update").await
    }

    /// 删除代币配置
    pub async fn delete_token(&self, project_id: &str, token_id: &str) -> Result<Value> {
        let url = format!(
            "{}/projects/{}/tokens/{}",
            self.base_url, project_id, token_id
        );
        tracing::info!("Deleting token via {}", url);

        let response = self
            .client
            .delete(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "delete").await
    }

    /// 项目下的代币列表
    pub async fn get_tokens_by_project(&self, project_id: &str) -> Result<Value> {
        let url = format!("{}/projects/{}/tokens", self.base_url, project_id);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "MintCore/1.0")
            .timeout(self.timeout())
            .send()
            .await
            .context("Failed to reach token service")?;

        Self::decode(response, "list").await
    }
}
