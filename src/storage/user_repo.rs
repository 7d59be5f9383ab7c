//! 运营用户仓库

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::user::User;

const USER_COLUMNS: &str = "id, uid, username, password, role, active, created_at, created_by, \
    updated_at, updated_by, deleted_at, last_seen";

/// 部分更新请求; password 传入时必须已是 bcrypt 哈希
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.active.is_none()
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        created_by: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, role, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list(
        &self,
        search: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE deleted_at IS NULL
              AND ($1 = '' OR username ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE deleted_at IS NULL
              AND ($1 = '' OR username ILIKE '%' || $1 || '%')
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        ))
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn update(
        &self,
        uid: Uuid,
        update: UserUpdate,
        updated_by: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password = COALESCE($3, password),
                role = COALESCE($4, role),
                active = COALESCE($5, active),
                updated_at = NOW(),
                updated_by = $6
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(update.username)
        .bind(update.password)
        .bind(update.role)
        .bind(update.active)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, uid: Uuid, deleted_by: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), active = FALSE, updated_at = NOW(), updated_by = $2
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_last_seen(
        &self,
        uid: Uuid,
        last_seen: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_seen = $2 WHERE uid = $1")
            .bind(uid)
            .bind(last_seen)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
