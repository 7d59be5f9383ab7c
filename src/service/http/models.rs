//! HTTP API 请求/响应模型
//!
//! 错误响应统一为 `{"error": code}` 或带上游消息的
//! `{"error": code, "message": ...}`, 错误码跨版本保持稳定

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::member::{MemberAccount, MemberProfileView};
use crate::user::User;

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(code: &str) -> Self {
        Self {
            error: code.to_string(),
            message: None,
        }
    }

    pub fn with_message(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            message: Some(message.into()),
        }
    }
}

// ==================== 联合会员登录 ====================

#[derive(Debug, Deserialize)]
pub struct V1LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct V1LoginResponse {
    /// 本地签发的会话令牌
    pub token: String,
    /// 上游 bearer token 透传, 供调用方直连上游
    pub token_api: String,
    pub user_profile: MemberProfileView,
    /// 上游 API 基址
    pub api_url: String,
}

// ==================== 运营用户登录 ====================

#[derive(Debug, Deserialize)]
pub struct UserLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserLoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub uid: Uuid,
    pub username: String,
    pub role: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid,
            username: user.username.clone(),
            role: user.role.clone(),
            last_seen: user.last_seen,
        }
    }
}

// ==================== 运营用户管理 ====================

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub uid: Uuid,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UserItem {
    pub uid: Uuid,
    pub username: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<User> for UserItem {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            username: user.username,
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            created_by: user.created_by,
            updated_at: user.updated_at,
            updated_by: user.updated_by,
            last_seen: user.last_seen,
        }
    }
}

// ==================== 会员账户管理 ====================
// 线上字段名沿用既有管理端契约 (id_pengguna / jenis)

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    #[serde(rename = "id_pengguna", default)]
    pub provider_user_id: i64,
    pub telegram: Option<String>,
    #[serde(rename = "jenis")]
    pub provider: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(rename = "id_pengguna")]
    pub provider_user_id: Option<i64>,
    pub telegram: Option<String>,
    #[serde(rename = "jenis")]
    pub provider: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MemberItem {
    pub id: i64,
    pub uuid: Uuid,
    #[serde(rename = "id_pengguna")]
    pub provider_user_id: i64,
    pub telegram: Option<String>,
    #[serde(rename = "jenis")]
    pub provider: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<MemberAccount> for MemberItem {
    fn from(member: MemberAccount) -> Self {
        Self {
            id: member.id,
            uuid: member.uuid,
            provider_user_id: member.provider_user_id,
            telegram: member.telegram,
            provider: member.provider.to_string(),
            active: member.active,
            created_at: member.created_at,
            updated_at: member.updated_at,
            deleted_at: member.deleted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub active: i64,
    pub inactive: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_message_omitted_when_absent() {
        let body = serde_json::to_value(ErrorBody::new("server_error")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "server_error"}));

        let body =
            serde_json::to_value(ErrorBody::with_message("upstream_error", "boom")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "upstream_error", "message": "boom"})
        );
    }

    #[test]
    fn test_member_item_uses_wire_field_names() {
        let raw: CreateMemberRequest = serde_json::from_str(
            r#"{"id_pengguna": 42, "jenis": "stockity", "active": true}"#,
        )
        .unwrap();
        assert_eq!(raw.provider_user_id, 42);
        assert_eq!(raw.provider.as_deref(), Some("stockity"));
    }
}
