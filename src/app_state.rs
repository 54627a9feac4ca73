use std::sync::Arc;

use crate::service::{
    catalog_service::{CatalogService, HttpCatalogClient},
    form_session::SessionStore,
    token_client::TokenServiceClient,
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub catalog: Arc<CatalogService>,
    pub token_client: Arc<TokenServiceClient>,
    pub config: Arc<crate::config::Config>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: Arc<crate::config::Config>) -> anyhow::Result<Self> {
        let sessions = Arc::new(SessionStore::new(config.session.ttl_secs));

        let catalog_client = Arc::new(HttpCatalogClient::new(
            config.upstream.discovery_service_url.clone(),
            config.upstream.request_timeout_secs,
        ));
        let catalog = Arc::new(CatalogService::new(
            catalog_client,
            config.catalog.refresh_interval_secs,
        ));

        let token_client = Arc::new(TokenServiceClient::new(
            config.upstream.token_service_url.clone(),
            config.upstream.request_timeout_secs,
        ));

        Ok(Self {
            sessions,
            catalog,
            token_client,
            config,
        })
    }
}
