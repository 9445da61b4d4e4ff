//! 购物车数据模型

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 购物车标识（不透明令牌）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(String);

impl CartId {
    /// 生成一个全新的全局唯一标识
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CartId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for CartId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 购物车操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Cart not found")]
    CartNotFound,
    #[error("Product not found in cart")]
    ProductNotInCart,
}

/// 减少数量后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    /// 商品条目被整体移除
    Removed,
    /// 商品数量被减少，附带剩余数量
    Decreased { remaining: i64 },
}

/// 添加商品后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// 实际生效的购物车标识，调用方后续必须使用它
    pub cart_id: CartId,
    /// 本次调用是否新建了购物车
    pub created: bool,
}

/// 单个购物车：商品 ID 到数量的映射，按首次加入的顺序保存
///
/// 存储的数量始终大于 0，降到 0 或以下的条目会被直接删除。
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    items: IndexMap<String, i64>,
    last_activity: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            last_activity: Utc::now(),
        }
    }

    /// 累加数量；结果不为正时移除该条目
    pub fn add(&mut self, product_id: &str, quantity: i64) {
        let current = self.items.get(product_id).copied().unwrap_or(0);
        let updated = current.saturating_add(quantity);
        self.store(product_id, updated);
        self.touch();
    }

    /// 请求数量不小于已存数量时移除条目，否则按请求数量减少
    ///
    /// 非正的请求数量按 0 处理，条目保持不变。
    pub fn decrement(&mut self, product_id: &str, quantity: i64) -> Result<ItemChange, CartError> {
        let stored = self
            .items
            .get(product_id)
            .copied()
            .ok_or(CartError::ProductNotInCart)?;

        let remaining = stored.saturating_sub(quantity.max(0));
        self.store(product_id, remaining);
        self.touch();

        Ok(if remaining > 0 {
            ItemChange::Decreased { remaining }
        } else {
            ItemChange::Removed
        })
    }

    /// 写回数量，不为正时删除条目；保留其余条目的相对顺序
    fn store(&mut self, product_id: &str, quantity: i64) {
        if quantity > 0 {
            self.items.insert(product_id.to_string(), quantity);
        } else {
            self.items.shift_remove(product_id);
        }
    }

    pub fn items(&self) -> &IndexMap<String, i64> {
        &self.items
    }

    pub fn quantity(&self, product_id: &str) -> Option<i64> {
        self.items.get(product_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now().max(self.last_activity);
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// 添加商品请求体
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(default)]
    pub cart_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
}

/// 减少/移除商品请求体
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// 购物车明细中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CartLine {
    Priced {
        id: String,
        name: String,
        price: f64,
        quantity: i64,
        total: String,
    },
    /// 商品已不在目录中
    Missing { id: String, error: String },
}

impl CartLine {
    pub fn id(&self) -> &str {
        match self {
            CartLine::Priced { id, .. } | CartLine::Missing { id, .. } => id,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CartLine::Missing { .. })
    }
}

/// 带价格的购物车视图，每次读取时重新计算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: String,
}
