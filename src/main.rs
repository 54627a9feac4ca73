//! MintCore 主入口
//! 代币化资产配置服务后端

use std::sync::Arc;

use anyhow::Result;
use mintcore::{api, app_state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量
    dotenvy::dotenv().ok();

    // ✅ 1.5 加载配置文件（如果存在CONFIG_PATH）
    let config = match std::env::var("CONFIG_PATH") {
        Ok(config_path) => {
            match mintcore::config::Config::from_env_and_file(Some(config_path.as_str())) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("⚠️ Failed to load config file: {}", e);
                    mintcore::config::Config::from_env()?
                }
            }
        }
        Err(_) => mintcore::config::Config::from_env()?,
    };
    config.validate()?;

    // ✅ 2. 初始化日志（结构化日志）
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mintcore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting MintCore Token Configuration Service");

    // ✅ 3. 初始化应用状态
    let config_arc = Arc::new(config);
    let state = Arc::new(AppState::new(config_arc.clone())?);

    // ✅ 4. 启动后台任务

    // 4.1 示例目录定时刷新（与前端60秒节奏一致，可配置关闭）
    if config_arc.catalog.auto_refresh {
        state.catalog.start_background_refresher();
        tracing::info!(
            "✅ Catalog auto-refresh started (every {}s)",
            config_arc.catalog.refresh_interval_secs
        );
    } else {
        tracing::info!("⏭️ Catalog auto-refresh disabled");
    }

    // 4.2 表单会话TTL清理
    state
        .sessions
        .spawn_ttl_sweeper(config_arc.session.sweep_interval_secs);
    tracing::info!("✅ Session TTL sweeper started");

    // ✅ 5. 构建API路由
    // 使用统一的 api::routes() 函数，包含完整的路由配置：
    // - 表单: /api/v1/forms/* (会话、字段、子实体、模块、校验)
    // - 目录: /api/v1/catalog/* (files, file-content, asset-types, categories, refresh)
    // - 模板: /api/v1/templates/*
    // - 测试控制台: /api/v1/test-console/execute
    // 包含所有中间件：CORS、追踪、响应时间等
    // 健康检查端点在 api::routes 中已定义: /api/health, /healthz
    let app = api::routes(state.clone());

    // ✅ 6. 启动服务器
    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| config_arc.server.bind_addr.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("🎉 Server listening on http://{}", bind_addr);
    tracing::info!("📖 Swagger UI: http://{}/docs", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
