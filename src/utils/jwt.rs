//! JWT Token 管理
//!
//! HS256 对称签名; 验证侧只接受 HMAC 算法族,
//! 其它算法类别的 token 一律拒绝

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// 会员会话令牌有效期 (秒) - 72 小时
pub const MEMBER_TOKEN_TTL_SECS: i64 = 72 * 3600;

/// 运营用户 access token 有效期 (秒) - 24 小时
pub const ACCESS_TOKEN_TTL_SECS: i64 = 24 * 3600;

/// 运营用户 refresh token 有效期 (秒) - 7 天
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

/// 会员会话令牌载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClaims {
    /// 会员账户公开标识 (uuid)
    pub sub: String,
    /// 外部 (Stockity) 用户 id
    pub user_id: i64,
    /// 最近一次登录 (Unix 秒)
    pub last_seen: i64,
    pub iat: i64,
    pub exp: i64,
}

/// 运营用户令牌载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// 用户公开标识 (uid)
    pub sub: String,
    pub username: String,
    pub role: String,
    pub last_seen: i64,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 签名器 (无状态, 不持久化任何已签发令牌)
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// 签发会员会话令牌, 过期时间严格为签发时刻 + 72h
    pub fn sign_member_token(
        &self,
        member_uuid: &str,
        provider_user_id: i64,
        last_seen: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = MemberClaims {
            sub: member_uuid.to_string(),
            user_id: provider_user_id,
            last_seen: last_seen.timestamp(),
            iat: now,
            exp: now + MEMBER_TOKEN_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// 签发运营用户令牌 (access 与 refresh 共用同一载荷结构, TTL 不同)
    pub fn sign_user_token(
        &self,
        uid: &str,
        username: &str,
        role: &str,
        last_seen: DateTime<Utc>,
        ttl_secs: i64,
    ) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(ttl_secs);
        let claims = UserClaims {
            sub: uid.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            last_seen: last_seen.timestamp(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, expires_at))
    }

    pub fn verify_member_token(
        &self,
        token: &str,
    ) -> Result<MemberClaims, jsonwebtoken::errors::Error> {
        let data = decode::<MemberClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }

    pub fn verify_user_token(
        &self,
        token: &str,
    ) -> Result<UserClaims, jsonwebtoken::errors::Error> {
        let data = decode::<UserClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test_secret")
    }

    #[test]
    fn test_member_token_roundtrip() {
        let last_seen = Utc::now();
        let token = signer()
            .sign_member_token("uuid-1", 42, last_seen)
            .unwrap();
        assert!(!token.is_empty());

        let claims = signer().verify_member_token(&token).unwrap();
        assert_eq!(claims.sub, "uuid-1");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.last_seen, last_seen.timestamp());
        assert_eq!(claims.exp - claims.iat, MEMBER_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_user_token_roundtrip() {
        let (token, expires_at) = signer()
            .sign_user_token("uid-1", "ops", "admin", Utc::now(), ACCESS_TOKEN_TTL_SECS)
            .unwrap();
        let claims = signer().verify_user_token(&token).unwrap();
        assert_eq!(claims.sub, "uid-1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer()
            .sign_member_token("uuid-1", 42, Utc::now())
            .unwrap();
        let other = TokenSigner::new("other_secret");
        assert!(other.verify_member_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = signer()
            .sign_member_token("uuid-1", 42, Utc::now())
            .unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('X');
        assert!(signer().verify_member_token(&tampered).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        // HS384 与验证配置的 HS256 不同, 必须被拒绝
        let claims = MemberClaims {
            sub: "uuid-1".to_string(),
            user_id: 42,
            last_seen: 0,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();
        assert!(signer().verify_member_token(&token).is_err());
    }
}
