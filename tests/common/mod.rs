//! 测试辅助模块
//! 提供测试工具和辅助函数

use std::collections::HashMap;
use std::sync::Arc;

use mintcore::service::catalog_service::{
    CatalogService, ExampleFileItem, StaticCatalogClient,
};
use mintcore::service::form_session::SessionStore;

/// 创建测试会话存储（1小时TTL）
pub fn test_session_store() -> SessionStore {
    SessionStore::new(3600)
}

/// 构造一条示例文件元数据
pub fn example_item(
    name: &str,
    asset_type: &str,
    category: &str,
    standard: &str,
) -> ExampleFileItem {
    ExampleFileItem {
        name: name.to_string(),
        path: format!("/examples/{}.json", name),
        asset_type: asset_type.to_string(),
        category: category.to_string(),
        token_standard: standard.to_string(),
        config_mode: None,
    }
}

/// 基于静态清单创建目录服务
pub fn test_catalog(items: Vec<ExampleFileItem>) -> Arc<CatalogService> {
    test_catalog_with_contents(items, HashMap::new())
}

/// 基于静态清单和文件内容创建目录服务
pub fn test_catalog_with_contents(
    items: Vec<ExampleFileItem>,
    contents: HashMap<String, String>,
) -> Arc<CatalogService> {
    let client = Arc::new(StaticCatalogClient { items, contents });
    Arc::new(CatalogService::new(client, 60))
}
