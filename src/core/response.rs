//! 核心响应处理模块

use serde::Serialize;

use crate::app::cart::model::CartId;

/// 操作结果响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<CartId>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cart_id: None,
        }
    }

    pub fn with_cart(message: impl Into<String>, cart_id: CartId) -> Self {
        Self {
            message: message.into(),
            cart_id: Some(cart_id),
        }
    }
}

/// 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
