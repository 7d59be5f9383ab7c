//! 联合登录编排器
//!
//! 控制流: 上游认证 -> 账户对账 (查不到则自动建档) -> 激活门控
//! -> 资料解析 (缓存未命中才回源) -> 本地令牌签发
//!
//! 任何一步失败即终止本次调用, 不重试, 不暴露部分结果;
//! 第一步拿到的上游 bearer token 只在全程成功时返回给调用方

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::stockity::{self, IdentityProvider, StockityError};
use crate::storage::{MemberAccountStore, MemberProfileStore};
use crate::utils::jwt::TokenSigner;
use crate::{KoalbotError, MemberProfile, Provider};

/// 登录全程成功的产物
#[derive(Debug)]
pub struct LoginSuccess {
    /// 本地签发的会话令牌 (72h)
    pub token: String,
    /// 上游 bearer token 透传
    pub token_api: String,
    /// 解析到的资料快照 (缓存命中原样返回, 未命中为刚拉取的)
    pub profile: MemberProfile,
}

/// 对外稳定的登录错误分类
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid_credentials")]
    InvalidCredentials,

    /// 覆盖"刚自动建档"与"已存在但未激活"两种情况, 调用方无从区分
    #[error("account_inactive")]
    AccountInactive,

    /// 上游对输入做了语义拒绝 (422), 透出上游响应体
    #[error("upstream_validation: {0}")]
    UpstreamValidation(String),

    /// 其它上游失败 (状态码/传输/契约违反), 响应体已截断
    #[error("upstream_error: {0}")]
    Upstream(String),

    #[error("profile_fetch_failed")]
    ProfileFetchFailed(Option<String>),

    #[error("server_error: {0}")]
    Server(#[from] KoalbotError),
}

/// 联合登录编排器; 自身无状态, 每次调用相互独立
pub struct MemberLoginManager {
    identity: Arc<dyn IdentityProvider>,
    members: Arc<dyn MemberAccountStore>,
    profiles: Arc<dyn MemberProfileStore>,
    signer: Arc<TokenSigner>,
}

impl MemberLoginManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        members: Arc<dyn MemberAccountStore>,
        profiles: Arc<dyn MemberProfileStore>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            identity,
            members,
            profiles,
            signer,
        }
    }

    pub async fn login(
        &self,
        device_id: &str,
        device_type: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginSuccess, LoginError> {
        // 1. 上游认证
        let session = self
            .identity
            .sign_in(device_id, device_type, email, password)
            .await
            .map_err(|e| match e {
                StockityError::InvalidCredentials => LoginError::InvalidCredentials,
                StockityError::Upstream {
                    status: 422, body, ..
                } => LoginError::UpstreamValidation(body),
                StockityError::Upstream { body, .. } => LoginError::Upstream(body),
                other => LoginError::Upstream(other.to_string()),
            })?;

        // 2. 外部用户 id 解析 (契约违反, 与上一步的失败区分开)
        let provider_user_id = stockity::parse_user_id(&session.user_id)
            .map_err(|_| LoginError::Upstream("invalid user_id from upstream".to_string()))?;

        // 3. 账户对账: 未见过的外部 id 自动建档后直接终止
        let member = match self.members.get_by_provider_user_id(provider_user_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                self.members
                    .create(provider_user_id, None, Provider::Stockity, false)
                    .await
                    .map_err(|e| LoginError::Server(e.into()))?;
                log::info!(
                    "auto-provisioned member account for provider user {}, awaiting activation",
                    provider_user_id
                );
                // 新建账户在本次调用内永不可用
                return Err(LoginError::AccountInactive);
            }
            Err(e) => return Err(LoginError::Server(e.into())),
        };

        // 4. 激活门控
        if !member.active {
            return Err(LoginError::AccountInactive);
        }

        // 5. 资料解析: 命中即用 (无新鲜度检查), 未命中回源并 upsert
        let profile = match self.profiles.get_by_member_id(member.id).await {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                let upstream = self
                    .identity
                    .get_profile(device_id, device_type, &session.authtoken)
                    .await
                    .map_err(|e| match e {
                        StockityError::Upstream { body, .. } => {
                            LoginError::ProfileFetchFailed(Some(body))
                        }
                        _ => LoginError::ProfileFetchFailed(None),
                    })?;
                let snapshot = MemberProfile::from_upstream(upstream, member.id);
                self.profiles
                    .upsert(&snapshot)
                    .await
                    .map_err(|e| LoginError::Server(e.into()))?;
                snapshot
            }
            Err(e) => return Err(LoginError::Server(e.into())),
        };

        // 6. 令牌签发
        let token = self
            .signer
            .sign_member_token(
                &member.uuid.to_string(),
                member.provider_user_id,
                Utc::now(),
            )
            .map_err(|e| LoginError::Server(e.into()))?;

        Ok(LoginSuccess {
            token,
            token_api: session.authtoken,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stockity::{MockIdentityProvider, Profile, SignInResponse};
    use crate::storage::{MockMemberAccountStore, MockMemberProfileStore};
    use crate::MemberAccount;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn member(id: i64, provider_user_id: i64, active: bool) -> MemberAccount {
        MemberAccount {
            id,
            uuid: Uuid::new_v4(),
            provider_user_id,
            telegram: None,
            provider: Provider::Stockity,
            active,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn session(user_id: &str) -> SignInResponse {
        SignInResponse {
            authtoken: "abc".to_string(),
            user_id: user_id.to_string(),
        }
    }

    fn upstream_profile(id: i64) -> Profile {
        Profile {
            id,
            email: "budi@example.com".to_string(),
            ..Profile::default()
        }
    }

    fn manager(
        identity: MockIdentityProvider,
        members: MockMemberAccountStore,
        profiles: MockMemberProfileStore,
    ) -> MemberLoginManager {
        MemberLoginManager::new(
            Arc::new(identity),
            Arc::new(members),
            Arc::new(profiles),
            Arc::new(TokenSigner::new("test_secret")),
        )
    }

    #[tokio::test]
    async fn test_first_login_auto_provisions_then_rejects() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));
        identity.expect_get_profile().times(0);

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .with(eq(42i64))
            .times(1)
            .returning(|_| Ok(None));
        members
            .expect_create()
            .with(eq(42i64), eq(None::<String>), eq(Provider::Stockity), eq(false))
            .times(1)
            .returning(|provider_user_id, _, _, _| Ok(member(1, provider_user_id, false)));

        let mut profiles = MockMemberProfileStore::new();
        profiles.expect_get_by_member_id().times(0);
        profiles.expect_upsert().times(0);

        let err = manager(identity, members, profiles)
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::AccountInactive));
    }

    #[tokio::test]
    async fn test_inactive_member_rejected_without_profile_lookup() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));
        identity.expect_get_profile().times(0);

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .times(1)
            .returning(|_| Ok(Some(member(1, 42, false))));
        members.expect_create().times(0);

        let mut profiles = MockMemberProfileStore::new();
        profiles.expect_get_by_member_id().times(0);

        let err = manager(identity, members, profiles)
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::AccountInactive));
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_profile_exactly_once() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));
        identity
            .expect_get_profile()
            .with(eq("dev-1"), eq("web"), eq("abc"))
            .times(1)
            .returning(|_, _, _| Ok(upstream_profile(42)));

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .times(1)
            .returning(|_| Ok(Some(member(7, 42, true))));

        let mut profiles = MockMemberProfileStore::new();
        profiles
            .expect_get_by_member_id()
            .with(eq(7i64))
            .times(1)
            .returning(|_| Ok(None));
        profiles
            .expect_upsert()
            .withf(|snapshot: &MemberProfile| snapshot.id == 42 && snapshot.member_id == 7)
            .times(1)
            .returning(|_| Ok(()));

        let success = manager(identity, members, profiles)
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(success.token_api, "abc");
        assert_eq!(success.profile.id, 42);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream_fetch() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));
        identity.expect_get_profile().times(0);

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .times(1)
            .returning(|_| Ok(Some(member(7, 42, true))));

        let mut profiles = MockMemberProfileStore::new();
        profiles
            .expect_get_by_member_id()
            .times(1)
            .returning(|_| Ok(Some(MemberProfile::from_upstream(upstream_profile(42), 7))));
        profiles.expect_upsert().times(0);

        let success = manager(identity, members, profiles)
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(success.profile.member_id, 7);

        // 令牌可被本地验证, user_id 声明等于外部 id
        let claims = TokenSigner::new("test_secret")
            .verify_member_token(&success.token)
            .unwrap();
        assert_eq!(claims.user_id, 42);
    }

    #[tokio::test]
    async fn test_invalid_credentials_passthrough() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Err(StockityError::InvalidCredentials));

        let mut members = MockMemberAccountStore::new();
        members.expect_get_by_provider_user_id().times(0);

        let err = manager(identity, members, MockMemberProfileStore::new())
            .login("dev-1", "web", "budi@example.com", "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_upstream_422_maps_to_validation_error() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_in().times(1).returning(|_, _, _, _| {
            Err(StockityError::Upstream {
                status: 422,
                endpoint: "sign_in",
                body: "{\"error\":\"email malformed\"}".to_string(),
            })
        });

        let err = manager(
            identity,
            MockMemberAccountStore::new(),
            MockMemberProfileStore::new(),
        )
        .login("dev-1", "web", "not-an-email", "pw")
        .await
        .unwrap_err();
        match err {
            LoginError::UpstreamValidation(body) => assert!(body.contains("email malformed")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_upstream_error() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("forty-two")));

        let mut members = MockMemberAccountStore::new();
        members.expect_get_by_provider_user_id().times(0);

        let err = manager(identity, members, MockMemberProfileStore::new())
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap_err();
        match err {
            LoginError::Upstream(message) => assert!(message.contains("invalid user_id")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_profile_fetch_failure_is_terminal() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));
        identity.expect_get_profile().times(1).returning(|_, _, _| {
            Err(StockityError::Upstream {
                status: 500,
                endpoint: "profile",
                body: "boom".to_string(),
            })
        });

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .times(1)
            .returning(|_| Ok(Some(member(7, 42, true))));

        let mut profiles = MockMemberProfileStore::new();
        profiles
            .expect_get_by_member_id()
            .times(1)
            .returning(|_| Ok(None));
        profiles.expect_upsert().times(0);

        let err = manager(identity, members, profiles)
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::ProfileFetchFailed(Some(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .times(1)
            .returning(|_, _, _, _| Ok(session("42")));

        let mut members = MockMemberAccountStore::new();
        members
            .expect_get_by_provider_user_id()
            .times(1)
            .returning(|_| Err(sqlx::Error::PoolTimedOut));

        let err = manager(identity, members, MockMemberProfileStore::new())
            .login("dev-1", "web", "budi@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::Server(_)));
    }
}
