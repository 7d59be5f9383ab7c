//! 持久化存储 (PostgreSQL / sqlx)
//!
//! 登录编排只依赖这里定义的窄接口; 管理端 CRUD 直接使用具体仓库

pub mod member_repo;
pub mod postgres;
pub mod profile_repo;
pub mod seed;
pub mod token_repo;
pub mod user_repo;

use async_trait::async_trait;

use crate::member::{MemberAccount, MemberProfile, Provider};

pub use member_repo::PgMemberAccountRepository;
pub use postgres::{bootstrap_schema, connect};
pub use profile_repo::PgMemberProfileRepository;
pub use token_repo::PgTokenRepository;
pub use user_repo::PgUserRepository;

/// 会员账户对账存储边界
///
/// create 必须对外部 id 冲突幂等: 并发首登争用同一外部 id 时
/// 落败方解析为既有行, 不得产生第二行, 也不报服务器错误
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberAccountStore: Send + Sync {
    async fn get_by_provider_user_id(
        &self,
        provider_user_id: i64,
    ) -> Result<Option<MemberAccount>, sqlx::Error>;

    async fn create(
        &self,
        provider_user_id: i64,
        telegram: Option<String>,
        provider: Provider,
        active: bool,
    ) -> Result<MemberAccount, sqlx::Error>;
}

/// 资料快照存储边界 (按会员账户 id 1:1)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberProfileStore: Send + Sync {
    async fn get_by_member_id(
        &self,
        member_id: i64,
    ) -> Result<Option<MemberProfile>, sqlx::Error>;

    /// 插入; 主键冲突时覆盖所有字段
    async fn upsert(&self, profile: &MemberProfile) -> Result<(), sqlx::Error>;
}
