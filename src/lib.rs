//! # Mock Shop
//!
//! 用于客户端开发联调的模拟电商后端：
//! - 商品目录与分类的只读查询（JSON 文件存储）
//! - 内存购物车的创建、累加、减少与删除
//! - 请求级故障注入：按概率返回服务器错误或永不响应

pub mod app;
pub mod core;
pub mod infrastructure;

pub use crate::app::{router, AppState, CartSettings};
pub use crate::core::chaos::{FaultInjector, FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use crate::core::error::AppError;
pub use crate::infrastructure::config::Config;
