//! Stockity 线上协议模型
//!
//! 上游响应有两种形态: 裸对象或 `{"data": {...}}` 包装,
//! 统一用 [`Envelope`] 解包后走同一条校验路径

use serde::{Deserialize, Serialize};

/// 上游响应包装: 先尝试 data 包装形态, 再退回裸对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Flat(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Flat(inner) => inner,
        }
    }
}

/// sign_in 成功载荷: 不透明 bearer token + 字符串形式的外部用户 id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInResponse {
    pub authtoken: String,
    pub user_id: String,
}

/// 上游用户资料 (约 35 个字段, 余额为浮点, 三个不透明 JSON 子对象)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: i64,
    pub avatar: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub balance: f64,
    pub balance_version: i64,
    pub bonus: f64,
    pub gender: String,
    pub email: String,
    pub email_verified: bool,
    pub phone: String,
    pub phone_verified: bool,
    pub phone_prefix: String,
    pub receive_news: bool,
    pub receive_sms: bool,
    pub receive_notification: bool,
    pub country: String,
    pub country_name: String,
    pub currency: String,
    pub birthday: String,
    pub activate: bool,
    pub password_is_set: bool,
    pub tutorial: bool,
    /// 不透明 JSON, 原样存储与返回
    pub coupons: serde_json::Value,
    /// 不透明 JSON, 原样存储与返回
    pub free_deals: serde_json::Value,
    pub blocked: bool,
    pub agree_risk: bool,
    pub agreed: bool,
    pub status_group: String,
    pub docs_verified: bool,
    /// RFC-3339 字符串, 为空或不可解析时缓存侧记为缺失
    pub registered_at: String,
    pub status_by_deposit: String,
    pub status_id: i32,
    pub deposits_sum: f64,
    /// 不透明 JSON, 原样存储与返回
    pub push_notification_categories: serde_json::Value,
    pub preserve_name: bool,
    pub registration_country_iso: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wrapped() {
        let raw = r#"{"data":{"authtoken":"abc","user_id":"42"}}"#;
        let session = serde_json::from_str::<Envelope<SignInResponse>>(raw)
            .unwrap()
            .into_inner();
        assert_eq!(session.authtoken, "abc");
        assert_eq!(session.user_id, "42");
    }

    #[test]
    fn test_envelope_flat() {
        let raw = r#"{"authtoken":"abc","user_id":"42"}"#;
        let session = serde_json::from_str::<Envelope<SignInResponse>>(raw)
            .unwrap()
            .into_inner();
        assert_eq!(session.authtoken, "abc");
        assert_eq!(session.user_id, "42");
    }

    #[test]
    fn test_profile_tolerates_missing_fields() {
        let profile: Profile = serde_json::from_str(r#"{"id": 7, "email": "a@b.c"}"#).unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.email, "a@b.c");
        assert_eq!(profile.balance, 0.0);
        assert!(profile.coupons.is_null());
    }

    #[test]
    fn test_profile_keeps_opaque_blobs_verbatim() {
        let raw = r#"{"id": 1, "coupons": [{"code": "XYZ", "pct": 15}], "free_deals": {"n": 2}}"#;
        let profile: Profile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.coupons[0]["code"], "XYZ");
        assert_eq!(profile.free_deals["n"], 2);
    }
}
