//! 会员账户模块
//!
//! 影子账户 (外部身份 -> 本地记录的对账锚点) 与资料快照模型,
//! 以及联合登录编排器

pub mod login_manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::stockity::Profile;

/// 账户来源提供方 (封闭集合; 目前只有 Stockity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "provider_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Stockity,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Stockity => "stockity",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stockity" => Ok(Provider::Stockity),
            _ => Err(()),
        }
    }
}

/// 会员影子账户
///
/// 每个外部用户 id 至多一行 (唯一约束); 首次联合登录自动建档,
/// active 默认 false, 激活只能由管理端带外操作完成; 只做软删除
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberAccount {
    pub id: i64,
    pub uuid: Uuid,
    pub provider_user_id: i64,
    pub telegram: Option<String>,
    pub provider: Provider,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 会员资料快照 (上游 Profile 的反规范化缓存, 按会员账户 1:1)
///
/// 只在登录编排的 upsert 步骤被改写; 拉取一次后长期复用, 无 TTL
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberProfile {
    /// 上游资料主键
    pub id: i64,
    pub member_id: i64,
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
    pub coupons: Option<serde_json::Value>,
    pub free_deals: Option<serde_json::Value>,
    pub blocked: bool,
    pub agree_risk: bool,
    pub agreed: bool,
    pub status_group: String,
    pub docs_verified: bool,
    pub registered_at: Option<DateTime<Utc>>,
    pub status_by_deposit: String,
    pub status_id: i32,
    pub deposits_sum: f64,
    pub push_notification_categories: Option<serde_json::Value>,
    pub preserve_name: bool,
    pub registration_country_iso: String,
}

/// 对外资料投影 (登录响应里的 user_profile; 不含本地 member_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfileView {
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
    pub coupons: Option<serde_json::Value>,
    pub free_deals: Option<serde_json::Value>,
    pub blocked: bool,
    pub agree_risk: bool,
    pub agreed: bool,
    pub status_group: String,
    pub docs_verified: bool,
    pub registered_at: Option<DateTime<Utc>>,
    pub status_by_deposit: String,
    pub status_id: i32,
    pub deposits_sum: f64,
    pub push_notification_categories: Option<serde_json::Value>,
    pub preserve_name: bool,
    pub registration_country_iso: String,
}

fn opt_json(value: serde_json::Value) -> Option<serde_json::Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

impl MemberProfile {
    /// 上游 Profile -> 快照的纯映射
    ///
    /// 除 registered_at (RFC-3339 解析, 失败/为空记为缺失) 外
    /// 所有字段原值透传; 三个不透明 JSON 子对象不做任何解释
    pub fn from_upstream(profile: Profile, member_id: i64) -> Self {
        let registered_at = if profile.registered_at.is_empty() {
            None
        } else {
            DateTime::parse_from_rfc3339(&profile.registered_at)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        };

        Self {
            id: profile.id,
            member_id,
            avatar: profile.avatar,
            first_name: profile.first_name,
            last_name: profile.last_name,
            nickname: profile.nickname,
            balance: profile.balance,
            balance_version: profile.balance_version,
            bonus: profile.bonus,
            gender: profile.gender,
            email: profile.email,
            email_verified: profile.email_verified,
            phone: profile.phone,
            phone_verified: profile.phone_verified,
            phone_prefix: profile.phone_prefix,
            receive_news: profile.receive_news,
            receive_sms: profile.receive_sms,
            receive_notification: profile.receive_notification,
            country: profile.country,
            country_name: profile.country_name,
            currency: profile.currency,
            birthday: profile.birthday,
            activate: profile.activate,
            password_is_set: profile.password_is_set,
            tutorial: profile.tutorial,
            coupons: opt_json(profile.coupons),
            free_deals: opt_json(profile.free_deals),
            blocked: profile.blocked,
            agree_risk: profile.agree_risk,
            agreed: profile.agreed,
            status_group: profile.status_group,
            docs_verified: profile.docs_verified,
            registered_at,
            status_by_deposit: profile.status_by_deposit,
            status_id: profile.status_id,
            deposits_sum: profile.deposits_sum,
            push_notification_categories: opt_json(profile.push_notification_categories),
            preserve_name: profile.preserve_name,
            registration_country_iso: profile.registration_country_iso,
        }
    }

    /// 快照 -> 对外投影
    pub fn into_view(self) -> MemberProfileView {
        MemberProfileView {
            id: self.id,
            avatar: self.avatar,
            first_name: self.first_name,
            last_name: self.last_name,
            nickname: self.nickname,
            balance: self.balance,
            balance_version: self.balance_version,
            bonus: self.bonus,
            gender: self.gender,
            email: self.email,
            email_verified: self.email_verified,
            phone: self.phone,
            phone_verified: self.phone_verified,
            phone_prefix: self.phone_prefix,
            receive_news: self.receive_news,
            receive_sms: self.receive_sms,
            receive_notification: self.receive_notification,
            country: self.country,
            country_name: self.country_name,
            currency: self.currency,
            birthday: self.birthday,
            activate: self.activate,
            password_is_set: self.password_is_set,
            tutorial: self.tutorial,
            coupons: self.coupons,
            free_deals: self.free_deals,
            blocked: self.blocked,
            agree_risk: self.agree_risk,
            agreed: self.agreed,
            status_group: self.status_group,
            docs_verified: self.docs_verified,
            registered_at: self.registered_at,
            status_by_deposit: self.status_by_deposit,
            status_id: self.status_id,
            deposits_sum: self.deposits_sum,
            push_notification_categories: self.push_notification_categories,
            preserve_name: self.preserve_name,
            registration_country_iso: self.registration_country_iso,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "avatar": "https://cdn.example/a.png",
            "first_name": "Budi",
            "last_name": "Santoso",
            "nickname": "budi",
            "balance": 1250.75,
            "balance_version": 9,
            "bonus": 3.5,
            "gender": "male",
            "email": "budi@example.com",
            "email_verified": true,
            "phone": "81234567",
            "phone_verified": false,
            "phone_prefix": "+62",
            "receive_news": true,
            "receive_sms": false,
            "receive_notification": true,
            "country": "ID",
            "country_name": "Indonesia",
            "currency": "IDR",
            "birthday": "1990-04-02",
            "activate": true,
            "password_is_set": true,
            "tutorial": false,
            "coupons": [{"code": "WELCOME", "pct": 30}],
            "free_deals": {"count": 1},
            "blocked": false,
            "agree_risk": true,
            "agreed": true,
            "status_group": "standard",
            "docs_verified": false,
            "registered_at": "2023-06-01T10:15:30Z",
            "status_by_deposit": "bronze",
            "status_id": 2,
            "deposits_sum": 500.0,
            "push_notification_categories": ["deals", "news"],
            "preserve_name": false,
            "registration_country_iso": "ID"
        }))
        .unwrap()
    }

    #[test]
    fn test_mapping_roundtrip_preserves_fields() {
        let upstream = sample_profile();
        let snapshot = MemberProfile::from_upstream(upstream.clone(), 7);
        assert_eq!(snapshot.member_id, 7);

        let view = snapshot.into_view();
        assert_eq!(view.id, upstream.id);
        assert_eq!(view.avatar, upstream.avatar);
        assert_eq!(view.balance, upstream.balance);
        assert_eq!(view.balance_version, upstream.balance_version);
        assert_eq!(view.coupons, Some(upstream.coupons));
        assert_eq!(view.free_deals, Some(upstream.free_deals));
        assert_eq!(
            view.push_notification_categories,
            Some(upstream.push_notification_categories)
        );
        assert_eq!(view.status_id, upstream.status_id);
        assert_eq!(view.deposits_sum, upstream.deposits_sum);
        assert_eq!(
            view.registered_at.unwrap(),
            DateTime::parse_from_rfc3339("2023-06-01T10:15:30Z").unwrap()
        );
    }

    #[test]
    fn test_mapping_unparsable_registered_at_is_absent() {
        let mut upstream = sample_profile();
        upstream.registered_at = "not-a-date".to_string();
        let snapshot = MemberProfile::from_upstream(upstream, 7);
        assert!(snapshot.registered_at.is_none());
    }

    #[test]
    fn test_mapping_empty_registered_at_is_absent() {
        let mut upstream = sample_profile();
        upstream.registered_at = String::new();
        let snapshot = MemberProfile::from_upstream(upstream, 7);
        assert!(snapshot.registered_at.is_none());
    }

    #[test]
    fn test_null_blobs_stay_null_in_view() {
        let mut upstream = sample_profile();
        upstream.coupons = serde_json::Value::Null;
        let view = MemberProfile::from_upstream(upstream, 7).into_view();
        assert_eq!(view.coupons, None);
        assert_eq!(serde_json::to_value(&view.coupons).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("stockity".parse::<Provider>().unwrap(), Provider::Stockity);
        assert!("binomo".parse::<Provider>().is_err());
        assert_eq!(Provider::Stockity.to_string(), "stockity");
    }
}
