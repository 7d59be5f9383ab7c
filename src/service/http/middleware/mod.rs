//! HTTP 中间件 (认证提取器 + 限流)

pub mod auth;
pub mod rate_limit;

pub use auth::{AdminContext, AuthContext};
pub use rate_limit::RateLimit;
