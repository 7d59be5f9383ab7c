//! 配置管理模块
//!
//! TOML 配置文件 + 环境变量覆盖 (敏感项只从环境变量读取)

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::KoalbotError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub stockity: StockityConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// JSON 请求体上限 (字节)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_client_timeout")]
    pub client_request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            client_request_timeout_secs: default_client_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接串, 被 DATABASE_URL 环境变量覆盖
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_conn_lifetime")]
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            max_lifetime_secs: default_conn_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 签名密钥, 被 JWT_SECRET 环境变量覆盖
    #[serde(default)]
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockityConfig {
    #[serde(default = "default_stockity_base_url")]
    pub base_url: String,
    #[serde(default = "default_stockity_timeout")]
    pub timeout_secs: u64,
}

impl Default for StockityConfig {
    fn default() -> Self {
        Self {
            base_url: default_stockity_base_url(),
            timeout_secs: default_stockity_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 通用限流: 每秒补充速率 / 突发容量
    #[serde(default = "default_rate_rps")]
    pub rps: f64,
    #[serde(default = "default_rate_burst")]
    pub burst: u32,
    /// 登录接口限流 (更严格)
    #[serde(default = "default_login_rps")]
    pub login_rps: f64,
    #[serde(default = "default_login_burst")]
    pub login_burst: u32,
    /// 空闲 IP 清理窗口 (秒)
    #[serde(default = "default_cleanup_secs")]
    pub cleanup_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: default_rate_rps(),
            burst: default_rate_burst(),
            login_rps: default_login_rps(),
            login_burst: default_login_burst(),
            cleanup_secs: default_cleanup_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 为空时放开所有来源 (不带凭据)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            stockity: StockityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, KoalbotError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| KoalbotError::ConfigError(format!("failed to read config file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| KoalbotError::ConfigError(format!("failed to parse config file: {}", e)))
    }

    /// 加载配置: 文件可选, 环境变量覆盖, 最后校验必填项
    pub fn load() -> Result<Self, KoalbotError> {
        let path = env::var("KOALBOT_CONFIG").unwrap_or_else(|_| "config/koalbot.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            Self::load_from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 环境变量覆盖 (敏感项与部署相关项)
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(parsed) = port.parse() {
                self.server.port = parsed;
            } else {
                log::warn!("invalid PORT, using configured value");
            }
        }
        if let Ok(base) = env::var("STOCKITY_BASE_URL") {
            self.stockity.base_url = base;
        }
    }

    fn validate(&self) -> Result<(), KoalbotError> {
        if self.database.url.is_empty() {
            return Err(KoalbotError::ConfigError("DATABASE_URL is required".to_string()));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(KoalbotError::ConfigError("JWT_SECRET is required".to_string()));
        }
        Ok(())
    }
}

// 默认值函数
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    1 << 20
}
fn default_client_timeout() -> u64 {
    10
}
fn default_max_connections() -> u32 {
    25
}
fn default_acquire_timeout() -> u64 {
    5
}
fn default_conn_lifetime() -> u64 {
    15 * 60
}
fn default_stockity_base_url() -> String {
    "https://api.stockity.id".to_string()
}
fn default_stockity_timeout() -> u64 {
    15
}
fn default_rate_rps() -> f64 {
    20.0
}
fn default_rate_burst() -> u32 {
    40
}
fn default_login_rps() -> f64 {
    5.0
}
fn default_login_burst() -> u32 {
    10
}
fn default_cleanup_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.stockity.base_url, "https://api.stockity.id");
        assert_eq!(config.rate_limit.login_burst, 10);
        assert!(config.rate_limit.login_rps < config.rate_limit.rps);
    }

    #[test]
    fn test_parse_partial_toml() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [stockity]
            base_url = "https://api.example.test"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.stockity.base_url, "https://api.example.test");
        // 未给出的段落走默认值
        assert_eq!(parsed.database.max_connections, 25);
        assert_eq!(parsed.rate_limit.burst, 40);
    }

    #[test]
    fn test_validate_requires_secrets() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.database.url = "postgres://localhost/koalbot".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }
}
