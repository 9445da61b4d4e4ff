//! 核心层：错误、响应、中间件与故障注入

pub mod chaos;
pub mod error;
pub mod middleware;
pub mod response;
