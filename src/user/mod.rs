//! 运营用户模块
//!
//! 本地口令登录的后台用户, 与联合会员账户相互独立

pub mod auth_manager;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// 用户角色 (封闭集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    /// 管理员 - 可操作用户/会员管理端
    Admin,
    /// 只读观察者
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Viewer => "viewer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(UserRole::Admin),
            "viewer" => Some(UserRole::Viewer),
            _ => None,
        }
    }
}

/// 运营用户
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub uid: Uuid,
    pub username: String,
    /// bcrypt 哈希, 永不序列化
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("viewer"), Some(UserRole::Viewer));
        assert_eq!(UserRole::parse("root"), None);
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }
}
