//! 运营用户 refresh token 仓库
//!
//! 只有内部用户登录流程持久化 refresh token;
//! 联合会员令牌是无状态的, 不落库

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_refresh_token(
        &self,
        user_uid: Uuid,
        token: &str,
        last_seen: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_refresh_tokens (user_uid, token, last_seen, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_uid)
        .bind(token)
        .bind(last_seen)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
