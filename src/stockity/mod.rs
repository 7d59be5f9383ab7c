//! Stockity 上游身份客户端
//!
//! 负责凭据交换 (sign_in) 与资料拉取 (profile), 并把上游的
//! 传输/状态码错误翻译为本地类型化错误

pub mod client;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use client::StockityClient;
pub use models::{Profile, SignInResponse};

/// 上游错误响应体截断上限 (字节)
pub const MAX_ERROR_BODY_BYTES: usize = 1024;

/// Stockity 客户端错误
#[derive(Debug, Error)]
pub enum StockityError {
    /// 上游返回 401
    #[error("invalid_credentials")]
    InvalidCredentials,

    /// 上游返回其它非 2xx, 响应体已截断
    #[error("stockity {endpoint} status {status}: {body}")]
    Upstream {
        status: u16,
        endpoint: &'static str,
        body: String,
    },

    /// 2xx 但载荷违反上游契约 (空 token、零值 id 等)
    #[error("invalid {0} response")]
    Contract(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// 身份提供方抽象, 编排层依赖该接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 凭据交换, 返回上游会话 (不透明 bearer token + 外部用户 id)
    async fn sign_in(
        &self,
        device_id: &str,
        device_type: &str,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, StockityError>;

    /// 用 sign_in 拿到的 token 拉取用户资料
    async fn get_profile(
        &self,
        device_id: &str,
        device_type: &str,
        auth_token: &str,
    ) -> Result<Profile, StockityError>;
}

/// 外部用户 id 以字符串传输, 这里严格解析为 i64;
/// 解析失败属于上游契约违反, 不是用户错误
pub fn parse_user_id(raw: &str) -> Result<i64, std::num::ParseIntError> {
    raw.parse::<i64>()
}

/// 截断上游错误响应体, 超限部分用标记替代
pub fn limit_body(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut truncated = String::from_utf8_lossy(&body[..MAX_ERROR_BODY_BYTES]).into_owned();
        truncated.push_str("...(truncated)");
        return truncated;
    }
    String::from_utf8_lossy(body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("42").unwrap(), 42);
        assert_eq!(parse_user_id("9007199254740993").unwrap(), 9007199254740993);
        assert!(parse_user_id("").is_err());
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("12.5").is_err());
    }

    #[test]
    fn test_limit_body_short() {
        assert_eq!(limit_body(b""), "");
        assert_eq!(limit_body(b"{\"error\":\"x\"}"), "{\"error\":\"x\"}");
    }

    #[test]
    fn test_limit_body_truncates() {
        let body = vec![b'a'; MAX_ERROR_BODY_BYTES + 100];
        let limited = limit_body(&body);
        assert!(limited.ends_with("...(truncated)"));
        assert_eq!(limited.len(), MAX_ERROR_BODY_BYTES + "...(truncated)".len());
    }
}
