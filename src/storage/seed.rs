//! 首次部署的运营用户种子
//!
//! 仅当 SEED_ENABLED=true 且用户表为空时执行;
//! 账号口令一律来自环境变量, 不写默认值

use sqlx::PgPool;
use std::env;

use crate::{KoalbotError, Result};

pub async fn seed_users(pool: &PgPool) -> Result<()> {
    if env::var("SEED_ENABLED").as_deref() != Ok("true") {
        return Ok(());
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let admin_username = required_env("SEED_ADMIN_USERNAME")?;
    let admin_password = required_env("SEED_ADMIN_PASSWORD")?;
    let viewer_username = required_env("SEED_VIEWER_USERNAME")?;
    let viewer_password = required_env("SEED_VIEWER_PASSWORD")?;

    let admin_hash = bcrypt::hash(&admin_password, bcrypt::DEFAULT_COST)?;
    let viewer_hash = bcrypt::hash(&viewer_password, bcrypt::DEFAULT_COST)?;

    sqlx::query(
        r#"
        INSERT INTO users (username, password, role, created_by)
        VALUES ($1, $2, 'admin', 'seed'), ($3, $4, 'viewer', 'seed')
        "#,
    )
    .bind(&admin_username)
    .bind(&admin_hash)
    .bind(&viewer_username)
    .bind(&viewer_hash)
    .execute(pool)
    .await?;

    log::info!("seeded initial users: {}, {}", admin_username, viewer_username);
    Ok(())
}

fn required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        KoalbotError::ConfigError(format!("{} is required when SEED_ENABLED=true", key))
    })
}
