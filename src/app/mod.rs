//! 应用层：路由、共享状态与后台任务

pub mod cart;
pub mod catalog;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use self::cart::service::CartRegistry;
use self::catalog::store::CatalogStore;
use crate::core::chaos::FaultInjector;
use crate::core::middleware::{fault_injection_middleware, request_logging_middleware};

/// 购物车行为开关
#[derive(Debug, Clone, Copy, Default)]
pub struct CartSettings {
    /// 添加商品时校验商品是否存在于目录
    pub validate_products_on_add: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub carts: CartRegistry,
    pub catalog: Arc<dyn CatalogStore>,
    pub chaos: Arc<FaultInjector>,
    pub settings: CartSettings,
}

impl AppState {
    pub fn new(
        carts: CartRegistry,
        catalog: Arc<dyn CatalogStore>,
        chaos: FaultInjector,
        settings: CartSettings,
    ) -> Self {
        Self {
            carts,
            catalog,
            chaos: Arc::new(chaos),
            settings,
        }
    }
}

/// 构建完整路由，故障注入覆盖包括 fallback 在内的所有请求
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(catalog::handler::list_categories))
        .route("/products", get(catalog::handler::list_products))
        .route(
            "/shopping-cart",
            post(cart::handler::add_item).delete(cart::handler::remove_item),
        )
        .route(
            "/shopping-cart/:cart_id",
            get(cart::handler::get_cart).delete(cart::handler::delete_cart),
        )
        .route("/health", get(health_check))
        .layer(middleware::from_fn_with_state(
            state.chaos.clone(),
            fault_injection_middleware,
        ))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// 健康检查
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "carts": state.carts.len(),
        "chaos": state.chaos.stats(),
    }))
}

/// 启动后台任务，定期清理长时间无活动的购物车
pub fn spawn_cart_eviction(
    carts: CartRegistry,
    idle_ttl: Duration,
    sweep_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        "启动购物车清理任务: 闲置上限 {}s, 间隔 {}s",
        idle_ttl.as_secs(),
        sweep_interval.as_secs()
    );
    let ttl = chrono::Duration::from_std(idle_ttl).unwrap_or(chrono::Duration::MAX);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        // 启动时不立即执行
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = carts.evict_idle(Utc::now(), ttl);
            if removed > 0 {
                info!("已清理 {} 个闲置购物车", removed);
            } else {
                debug!("没有需要清理的购物车");
            }
        }
    })
}
