//! 运营用户口令登录
//!
//! bcrypt 校验 -> 更新 last_seen -> 签发 access + refresh,
//! refresh token 落库 (与无状态的会员令牌流程相反)

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{PgTokenRepository, PgUserRepository};
use crate::user::User;
use crate::utils::jwt::{TokenSigner, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use crate::KoalbotError;

#[derive(Debug, Error)]
pub enum UserAuthError {
    #[error("invalid_credentials")]
    InvalidCredentials,

    /// 未激活或已软删除
    #[error("user_inactive")]
    UserInactive,

    #[error("server_error: {0}")]
    Server(#[from] KoalbotError),
}

/// 登录成功后签发的令牌对
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: User,
}

pub struct UserAuthManager {
    users: Arc<PgUserRepository>,
    tokens: Arc<PgTokenRepository>,
    signer: Arc<TokenSigner>,
}

impl UserAuthManager {
    pub fn new(
        users: Arc<PgUserRepository>,
        tokens: Arc<PgTokenRepository>,
        signer: Arc<TokenSigner>,
    ) -> Self {
        Self {
            users,
            tokens,
            signer,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedTokens, UserAuthError> {
        let mut user = self
            .users
            .find_by_username(username)
            .await
            .map_err(KoalbotError::from)?
            .ok_or(UserAuthError::InvalidCredentials)?;

        if !user.active || user.deleted_at.is_some() {
            return Err(UserAuthError::UserInactive);
        }

        if !bcrypt::verify(password, &user.password).map_err(KoalbotError::from)? {
            return Err(UserAuthError::InvalidCredentials);
        }

        let last_seen = Utc::now();
        self.users
            .update_last_seen(user.uid, last_seen)
            .await
            .map_err(KoalbotError::from)?;
        user.last_seen = Some(last_seen);

        let uid = user.uid.to_string();
        let (access_token, expires_at) = self
            .signer
            .sign_user_token(&uid, &user.username, &user.role, last_seen, ACCESS_TOKEN_TTL_SECS)
            .map_err(KoalbotError::from)?;
        let (refresh_token, refresh_expires_at) = self
            .signer
            .sign_user_token(&uid, &user.username, &user.role, last_seen, REFRESH_TOKEN_TTL_SECS)
            .map_err(KoalbotError::from)?;

        self.tokens
            .save_refresh_token(user.uid, &refresh_token, last_seen, refresh_expires_at)
            .await
            .map_err(KoalbotError::from)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_at,
            refresh_expires_at,
            user,
        })
    }
}
