//! Stockity HTTP 客户端实现
//!
//! 所有调用受客户端级超时约束, 不做任何重试;
//! 失败语义见 [`StockityError`](super::StockityError)

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::models::{Envelope, Profile, SignInResponse};
use super::{limit_body, IdentityProvider, StockityError};

const SIGN_IN_PATH: &str = "/passport/v2/sign_in";
const PROFILE_PATH: &str = "/platform/private/v2/profile";

/// Stockity 身份服务客户端
pub struct StockityClient {
    base_url: String,
    http: reqwest::Client,
}

impl StockityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StockityError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl IdentityProvider for StockityClient {
    async fn sign_in(
        &self,
        device_id: &str,
        device_type: &str,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, StockityError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, SIGN_IN_PATH))
            .header("Device-Id", device_id)
            .header("Device-Type", device_type)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(StockityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(StockityError::Upstream {
                status: status.as_u16(),
                endpoint: "sign_in",
                body: limit_body(&body),
            });
        }

        let session = serde_json::from_slice::<Envelope<SignInResponse>>(&body)?.into_inner();
        if session.authtoken.is_empty() || session.user_id.is_empty() {
            return Err(StockityError::Contract("sign_in"));
        }

        Ok(session)
    }

    async fn get_profile(
        &self,
        device_id: &str,
        device_type: &str,
        auth_token: &str,
    ) -> Result<Profile, StockityError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, PROFILE_PATH))
            .header("Device-Id", device_id)
            .header("Device-Type", device_type)
            .header("Authorization-Token", auth_token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(StockityError::Upstream {
                status: status.as_u16(),
                endpoint: "profile",
                body: limit_body(&body),
            });
        }

        let profile = serde_json::from_slice::<Envelope<Profile>>(&body)?.into_inner();
        // id 零值视为契约违反, 不当作合法的"空"资料
        if profile.id == 0 {
            return Err(StockityError::Contract("profile"));
        }

        Ok(profile)
    }
}
