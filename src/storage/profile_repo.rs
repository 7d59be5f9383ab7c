//! 会员资料快照仓库

use async_trait::async_trait;
use sqlx::PgPool;

use super::MemberProfileStore;
use crate::member::MemberProfile;

const PROFILE_COLUMNS: &str = "id, member_id, avatar, first_name, last_name, nickname, \
    balance, balance_version, bonus, gender, email, email_verified, \
    phone, phone_verified, phone_prefix, receive_news, receive_sms, \
    receive_notification, country, country_name, currency, birthday, \
    activate, password_is_set, tutorial, coupons, free_deals, blocked, \
    agree_risk, agreed, status_group, docs_verified, registered_at, \
    status_by_deposit, status_id, deposits_sum, push_notification_categories, \
    preserve_name, registration_country_iso";

pub struct PgMemberProfileRepository {
    pool: PgPool,
}

impl PgMemberProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberProfileStore for PgMemberProfileRepository {
    async fn get_by_member_id(
        &self,
        member_id: i64,
    ) -> Result<Option<MemberProfile>, sqlx::Error> {
        sqlx::query_as::<_, MemberProfile>(&format!(
            "SELECT {} FROM member_profiles WHERE member_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert(&self, profile: &MemberProfile) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            r#"
            INSERT INTO member_profiles ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                    $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                    $31, $32, $33, $34, $35, $36, $37, $38, $39)
            ON CONFLICT (id) DO UPDATE SET
                member_id = EXCLUDED.member_id,
                avatar = EXCLUDED.avatar,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                nickname = EXCLUDED.nickname,
                balance = EXCLUDED.balance,
                balance_version = EXCLUDED.balance_version,
                bonus = EXCLUDED.bonus,
                gender = EXCLUDED.gender,
                email = EXCLUDED.email,
                email_verified = EXCLUDED.email_verified,
                phone = EXCLUDED.phone,
                phone_verified = EXCLUDED.phone_verified,
                phone_prefix = EXCLUDED.phone_prefix,
                receive_news = EXCLUDED.receive_news,
                receive_sms = EXCLUDED.receive_sms,
                receive_notification = EXCLUDED.receive_notification,
                country = EXCLUDED.country,
                country_name = EXCLUDED.country_name,
                currency = EXCLUDED.currency,
                birthday = EXCLUDED.birthday,
                activate = EXCLUDED.activate,
                password_is_set = EXCLUDED.password_is_set,
                tutorial = EXCLUDED.tutorial,
                coupons = EXCLUDED.coupons,
                free_deals = EXCLUDED.free_deals,
                blocked = EXCLUDED.blocked,
                agree_risk = EXCLUDED.agree_risk,
                agreed = EXCLUDED.agreed,
                status_group = EXCLUDED.status_group,
                docs_verified = EXCLUDED.docs_verified,
                registered_at = EXCLUDED.registered_at,
                status_by_deposit = EXCLUDED.status_by_deposit,
                status_id = EXCLUDED.status_id,
                deposits_sum = EXCLUDED.deposits_sum,
                push_notification_categories = EXCLUDED.push_notification_categories,
                preserve_name = EXCLUDED.preserve_name,
                registration_country_iso = EXCLUDED.registration_country_iso
            "#,
            PROFILE_COLUMNS
        ))
        .bind(profile.id)
        .bind(profile.member_id)
        .bind(&profile.avatar)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.nickname)
        .bind(profile.balance)
        .bind(profile.balance_version)
        .bind(profile.bonus)
        .bind(&profile.gender)
        .bind(&profile.email)
        .bind(profile.email_verified)
        .bind(&profile.phone)
        .bind(profile.phone_verified)
        .bind(&profile.phone_prefix)
        .bind(profile.receive_news)
        .bind(profile.receive_sms)
        .bind(profile.receive_notification)
        .bind(&profile.country)
        .bind(&profile.country_name)
        .bind(&profile.currency)
        .bind(&profile.birthday)
        .bind(profile.activate)
        .bind(profile.password_is_set)
        .bind(profile.tutorial)
        .bind(&profile.coupons)
        .bind(&profile.free_deals)
        .bind(profile.blocked)
        .bind(profile.agree_risk)
        .bind(profile.agreed)
        .bind(&profile.status_group)
        .bind(profile.docs_verified)
        .bind(profile.registered_at)
        .bind(&profile.status_by_deposit)
        .bind(profile.status_id)
        .bind(profile.deposits_sum)
        .bind(&profile.push_notification_categories)
        .bind(profile.preserve_name)
        .bind(&profile.registration_country_iso)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
