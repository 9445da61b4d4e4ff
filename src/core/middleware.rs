//! 核心中间件模块

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::core::chaos::{FaultDecision, FaultInjector};
use crate::core::error::AppError;

/// 请求日志中间件
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    info!(
        "{} {} - {} - {}ms - User-Agent: {:?}",
        method,
        uri,
        status,
        duration.as_millis(),
        user_agent
    );

    response
}

/// 故障注入中间件，在所有路由处理之前执行
pub async fn fault_injection_middleware(
    State(injector): State<Arc<FaultInjector>>,
    req: Request,
    next: Next,
) -> Response {
    if injector.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    match injector.decide() {
        FaultDecision::Pass => next.run(req).await,
        FaultDecision::Fail => {
            warn!("注入模拟服务器错误: {} {}", req.method(), req.uri());
            AppError::SimulatedServerError.into_response()
        }
        FaultDecision::Stall => {
            warn!("注入模拟超时，请求将不会得到响应: {} {}", req.method(), req.uri());
            std::future::pending::<Response>().await
        }
    }
}
