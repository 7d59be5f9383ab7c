//! 会员账户仓库

use async_trait::async_trait;
use sqlx::PgPool;

use super::MemberAccountStore;
use crate::member::{MemberAccount, Provider};

const MEMBER_COLUMNS: &str =
    "id, uuid, provider_user_id, telegram, provider, active, created_at, updated_at, deleted_at";

/// 管理端部分更新请求; None 表示不改动该字段
#[derive(Debug, Clone, Default)]
pub struct MemberAccountUpdate {
    pub provider_user_id: Option<i64>,
    pub telegram: Option<String>,
    pub provider: Option<Provider>,
    pub active: Option<bool>,
}

impl MemberAccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider_user_id.is_none()
            && self.telegram.is_none()
            && self.provider.is_none()
            && self.active.is_none()
    }
}

pub struct PgMemberAccountRepository {
    pool: PgPool,
}

impl PgMemberAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<MemberAccount>, sqlx::Error> {
        sqlx::query_as::<_, MemberAccount>(&format!(
            "SELECT {} FROM member_accounts WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 管理端手工建档: 普通插入, 外部 id 冲突按错误返回
    /// (与登录流程的幂等 create 不同, 重复建档应当被看见)
    pub async fn create_manual(
        &self,
        provider_user_id: i64,
        telegram: Option<String>,
        provider: Provider,
        active: bool,
    ) -> Result<MemberAccount, sqlx::Error> {
        sqlx::query_as::<_, MemberAccount>(&format!(
            r#"
            INSERT INTO member_accounts (provider_user_id, telegram, provider, active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(provider_user_id)
        .bind(telegram)
        .bind(provider)
        .bind(active)
        .fetch_one(&self.pool)
        .await
    }

    /// 列表: 排除软删除行; search 同时匹配 telegram 与外部 id
    pub async fn list(
        &self,
        search: &str,
        provider: Option<Provider>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MemberAccount>, i64), sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM member_accounts
            WHERE deleted_at IS NULL
              AND ($1 = '' OR telegram ILIKE '%' || $1 || '%'
                   OR CAST(provider_user_id AS TEXT) ILIKE '%' || $1 || '%')
              AND ($2::provider_kind IS NULL OR provider = $2)
            "#,
        )
        .bind(search)
        .bind(provider)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, MemberAccount>(&format!(
            r#"
            SELECT {} FROM member_accounts
            WHERE deleted_at IS NULL
              AND ($1 = '' OR telegram ILIKE '%' || $1 || '%'
                   OR CAST(provider_user_id AS TEXT) ILIKE '%' || $1 || '%')
              AND ($2::provider_kind IS NULL OR provider = $2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
            MEMBER_COLUMNS
        ))
        .bind(search)
        .bind(provider)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn update(&self, id: i64, update: MemberAccountUpdate) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE member_accounts SET
                provider_user_id = COALESCE($2, provider_user_id),
                telegram = COALESCE($3, telegram),
                provider = COALESCE($4, provider),
                active = COALESCE($5, active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.provider_user_id)
        .bind(update.telegram)
        .bind(update.provider)
        .bind(update.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 软删除同时强制 active = FALSE, 保证该行退出登录流程
    pub async fn soft_delete(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE member_accounts
            SET deleted_at = NOW(), updated_at = NOW(), active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 仪表盘统计: (active, inactive)
    pub async fn count_by_active(&self) -> Result<(i64, i64), sqlx::Error> {
        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM member_accounts WHERE deleted_at IS NULL AND active = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        let (inactive,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM member_accounts WHERE deleted_at IS NULL AND active = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((active, inactive))
    }
}

#[async_trait]
impl MemberAccountStore for PgMemberAccountRepository {
    async fn get_by_provider_user_id(
        &self,
        provider_user_id: i64,
    ) -> Result<Option<MemberAccount>, sqlx::Error> {
        sqlx::query_as::<_, MemberAccount>(&format!(
            "SELECT {} FROM member_accounts WHERE provider_user_id = $1",
            MEMBER_COLUMNS
        ))
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create(
        &self,
        provider_user_id: i64,
        telegram: Option<String>,
        provider: Provider,
        active: bool,
    ) -> Result<MemberAccount, sqlx::Error> {
        let inserted = sqlx::query_as::<_, MemberAccount>(&format!(
            r#"
            INSERT INTO member_accounts (provider_user_id, telegram, provider, active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider_user_id) DO NOTHING
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(provider_user_id)
        .bind(telegram)
        .bind(provider)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            // 并发首登争用: 落败方解析为既有行
            None => self
                .get_by_provider_user_id(provider_user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }
}
