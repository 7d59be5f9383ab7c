//! # KOALBOT-RS
//!
//! koalbot 账户服务 - 管理本地运营用户与 Stockity 联合登录
//!
//! ## 核心能力
//!
//! - **联合登录**: 对接 Stockity 身份服务, 首次登录自动建档 + 激活门控
//! - **账户对账**: 外部身份 -> 本地影子账户的唯一映射
//! - **资料缓存**: 上游 Profile 的反规范化快照, 一次拉取长期复用
//! - **令牌签发**: HS256 本地会话令牌 (72h) / 运营用户 access+refresh
//! - **运营管理**: 用户/会员 CRUD、仪表盘统计、健康检查 (基于 Actix-web)
//!
//! ## 架构设计
//!
//! ```text
//! 客户端 (HTTP)
//!     ↓
//! Service Layer (service/)
//!     ↓
//! Login Orchestration (member/, user/)
//!     ↓            ↘
//! Storage (storage/)  Stockity Client (stockity/)
//! ```

// ============================================================================
// 外部依赖
// ============================================================================

// Web 框架
pub use actix_web;

// 异步运行时
pub use futures;
pub use tokio;

// 并发工具
pub use dashmap;

// 序列化
pub use serde;
pub use serde_json;

// 时间
pub use chrono;

// 日志
pub use log;

// 错误处理
pub use thiserror;

// UUID
pub use uuid;

// ============================================================================
// 内部模块
// ============================================================================

/// 配置管理
pub mod config;

/// Stockity 上游身份客户端
pub mod stockity;

/// 会员账户 (影子账户 + 资料快照 + 联合登录编排)
pub mod member;

/// 运营用户 (本地口令登录)
pub mod user;

/// 持久化存储 (PostgreSQL)
pub mod storage;

/// 对外服务层 (HTTP)
pub mod service;

/// 工具模块
pub mod utils;

// ============================================================================
// 重导出常用类型
// ============================================================================

pub use config::AppConfig;
pub use member::login_manager::{LoginError, MemberLoginManager};
pub use member::{MemberAccount, MemberProfile, Provider};
pub use stockity::StockityClient;
pub use user::User;

// ============================================================================
// 全局错误类型
// ============================================================================

/// 服务级错误类型
#[derive(Debug, thiserror::Error)]
pub enum KoalbotError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordError(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// 全局 Result 类型
pub type Result<T> = std::result::Result<T, KoalbotError>;
