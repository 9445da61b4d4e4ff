use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use mock_shop::app::cart::service::CartRegistry;
use mock_shop::app::catalog::store::JsonFileCatalog;
use mock_shop::app::{router, spawn_cart_eviction, AppState};
use mock_shop::infrastructure::{
    config::{load_config, resolve_config_path},
    logger::Logger,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 第一个命令行参数可指定配置文件
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let config_path = resolve_config_path(explicit);
    let config = load_config(config_path.as_deref())?;

    Logger::init(&config.logging)?;
    match &config_path {
        Some(path) => info!("从配置文件加载: {}", path.display()),
        None => info!("未找到配置文件，使用默认配置"),
    }

    let catalog = JsonFileCatalog::new(&config.catalog.data_dir);
    catalog
        .ensure_data_files()
        .await
        .context("无法初始化商品目录数据文件")?;

    let carts = CartRegistry::with_policy(config.cart_policy());
    if let Some((idle_ttl, sweep_interval)) = config.eviction() {
        spawn_cart_eviction(carts.clone(), idle_ttl, sweep_interval);
    }

    let injector = config.fault_injector();
    info!(
        "故障注入: 启用={}, 失败概率={}, 超时概率={}",
        injector.is_enabled(),
        injector.failure_rate(),
        injector.timeout_rate()
    );

    let state = AppState::new(
        carts,
        Arc::new(catalog),
        injector,
        config.cart_settings(),
    );
    let app = router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法绑定到 {}", addr))?;

    info!("🚀 服务器运行在 http://{}", addr);
    info!("📖 API 端点:");
    info!("   GET    /categories              - 分类列表");
    info!("   GET    /products                - 商品列表 (支持 category 过滤)");
    info!("   POST   /shopping-cart           - 添加商品");
    info!("   DELETE /shopping-cart           - 减少或移除商品");
    info!("   GET    /shopping-cart/:cartId   - 购物车明细");
    info!("   DELETE /shopping-cart/:cartId   - 删除购物车");
    info!("   GET    /health                  - 健康检查");

    axum::serve(listener, app).await?;
    Ok(())
}
