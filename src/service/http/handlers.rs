//! 应用状态与基础处理器

use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::member::login_manager::MemberLoginManager;
use crate::storage::{PgMemberAccountRepository, PgUserRepository};
use crate::user::auth_manager::UserAuthManager;
use crate::utils::jwt::TokenSigner;

/// 应用状态
pub struct AppState {
    pub pool: PgPool,
    pub login_mgr: Arc<MemberLoginManager>,
    pub user_auth: Arc<UserAuthManager>,
    pub users: Arc<PgUserRepository>,
    pub members: Arc<PgMemberAccountRepository>,
    pub signer: Arc<TokenSigner>,
    /// 登录响应里透出的上游 API 基址
    pub api_url: String,
}

/// 健康检查: 带 2s 超时的数据库探活
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let ping = sqlx::query("SELECT 1").execute(&state.pool);
    match tokio::time::timeout(Duration::from_secs(2), ping).await {
        Ok(Ok(_)) => HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })),
        _ => HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "status": "db_unhealthy" })),
    }
}
