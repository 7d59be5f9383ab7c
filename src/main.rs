//! koalbot 账户服务入口
//!
//! 启动顺序: 配置 -> 连接池 -> 表结构引导 -> 种子用户 -> HTTP 服务
//!
//! 运行: cargo run --bin koalbot-server

use std::io;
use std::sync::Arc;
use std::time::Duration;

use koalbot::config::AppConfig;
use koalbot::member::login_manager::MemberLoginManager;
use koalbot::service::http::handlers::AppState;
use koalbot::service::http::HttpServer;
use koalbot::stockity::StockityClient;
use koalbot::storage::{
    self, PgMemberAccountRepository, PgMemberProfileRepository, PgTokenRepository,
    PgUserRepository,
};
use koalbot::user::auth_manager::UserAuthManager;
use koalbot::utils::jwt::TokenSigner;

fn to_io_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::load().map_err(to_io_error)?;

    let pool = storage::connect(&config.database)
        .await
        .map_err(to_io_error)?;
    storage::bootstrap_schema(&pool).await.map_err(to_io_error)?;
    storage::seed::seed_users(&pool).await.map_err(to_io_error)?;

    let signer = Arc::new(TokenSigner::new(&config.auth.jwt_secret));
    let stockity = Arc::new(
        StockityClient::new(
            &config.stockity.base_url,
            Duration::from_secs(config.stockity.timeout_secs),
        )
        .map_err(to_io_error)?,
    );

    let members = Arc::new(PgMemberAccountRepository::new(pool.clone()));
    let profiles = Arc::new(PgMemberProfileRepository::new(pool.clone()));
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let tokens = Arc::new(PgTokenRepository::new(pool.clone()));

    let login_mgr = Arc::new(MemberLoginManager::new(
        stockity.clone(),
        members.clone(),
        profiles,
        signer.clone(),
    ));
    let user_auth = Arc::new(UserAuthManager::new(users.clone(), tokens, signer.clone()));

    let app_state = Arc::new(AppState {
        pool,
        login_mgr,
        user_auth,
        users,
        members,
        signer,
        api_url: config.stockity.base_url.clone(),
    });

    HttpServer::new(app_state, config).run().await
}
