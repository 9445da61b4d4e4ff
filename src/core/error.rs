//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::app::cart::model::CartError;
use crate::app::catalog::store::CatalogError;
use crate::core::response::ErrorResponse;

/// 核心错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error("Product not found")]
    ProductNotFound,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// 故障注入产生的错误，并非真实故障
    #[error("Simulated server error")]
    SimulatedServerError,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Cart(_) | AppError::ProductNotFound => StatusCode::NOT_FOUND,
            AppError::Catalog(_) | AppError::SimulatedServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Catalog(err) => {
                error!("读取商品目录失败: {}", err);
                "Failed to read catalog data".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
