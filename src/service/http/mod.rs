//! HTTP API 服务模块
//!
//! 登录、会员/用户管理、健康检查等 RESTful 接口

pub mod auth;
pub mod handlers;
pub mod member_login;
pub mod members_admin;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod stream;
pub mod users_admin;

use actix_web::{error, middleware as actix_middleware, web, App, HttpRequest, HttpResponse,
    HttpServer as ActixHttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, CorsConfig};
use handlers::AppState;
use middleware::RateLimit;
use models::ErrorBody;

/// HTTP 服务器
pub struct HttpServer {
    app_state: Arc<AppState>,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(app_state: Arc<AppState>, config: AppConfig) -> Self {
        Self { app_state, config }
    }

    /// 启动 HTTP 服务器 (阻塞到收到退出信号)
    pub async fn run(self) -> io::Result<()> {
        let bind_address = self.config.server.bind_address();
        log::info!("Starting HTTP server at {}", bind_address);

        let cleanup = Duration::from_secs(self.config.rate_limit.cleanup_secs);
        let general_limit =
            RateLimit::new(self.config.rate_limit.rps, self.config.rate_limit.burst, cleanup);
        let login_limit = RateLimit::new(
            self.config.rate_limit.login_rps,
            self.config.rate_limit.login_burst,
            cleanup,
        );

        let app_state = self.app_state;
        let cors_config = self.config.cors.clone();
        let max_body_bytes = self.config.server.max_body_bytes;
        let client_timeout = Duration::from_secs(self.config.server.client_request_timeout_secs);

        ActixHttpServer::new(move || {
            let login_limit = login_limit.clone();
            App::new()
                // 应用状态
                .app_data(web::Data::new(app_state.clone()))
                // 请求体上限 + JSON 解析错误统一为 invalid_json
                .app_data(web::PayloadConfig::new(max_body_bytes))
                .app_data(
                    web::JsonConfig::default()
                        .limit(max_body_bytes)
                        .error_handler(json_error_handler),
                )
                // 中间件
                .wrap(actix_middleware::Logger::default())
                .wrap(build_cors(&cors_config))
                .wrap(general_limit.clone())
                // 路由
                .configure(move |cfg| routes::configure(cfg, login_limit))
        })
        .client_request_timeout(client_timeout)
        .bind(&bind_address)?
        .run()
        .await
    }
}

fn json_error_handler(
    err: error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ErrorBody::new("invalid_json")),
    )
    .into()
}

fn build_cors(config: &CorsConfig) -> actix_cors::Cors {
    let mut cors = actix_cors::Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            "Content-Type",
            "Authorization",
            "Device-Id",
            "Device-Type",
            "Authorization-Token",
        ])
        .expose_headers(vec!["Authorization"])
        .max_age(12 * 3600);

    if config.allowed_origins.is_empty() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        if config.allow_credentials {
            cors = cors.supports_credentials();
        }
    }

    cors
}
