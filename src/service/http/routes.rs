//! HTTP API 路由配置

use actix_web::web;

use super::auth;
use super::handlers;
use super::member_login;
use super::members_admin;
use super::middleware::RateLimit;
use super::stream;
use super::users_admin;

/// 配置所有路由; 登录路由由独立的 (更严格的) 限流实例包裹
pub fn configure(cfg: &mut web::ServiceConfig, login_limit: RateLimit) {
    cfg
        // 健康检查与状态流
        .route("/healthz", web::get().to(handlers::health_check))
        .route("/status/stream", web::get().to(stream::status_stream))
        // 登录 (运营用户 / 联合会员)
        .service(
            web::resource("/login")
                .wrap(login_limit.clone())
                .route(web::post().to(auth::login)),
        )
        .service(
            web::resource("/v1/login")
                .wrap(login_limit)
                .route(web::post().to(member_login::login)),
        )
        // 运营用户管理 (管理员)
        .service(
            web::scope("/users")
                .route("", web::post().to(users_admin::register))
                .route("", web::get().to(users_admin::list))
                .route("/{uid}", web::put().to(users_admin::update))
                .route("/{uid}", web::delete().to(users_admin::delete)),
        )
        // 会员账户管理 (管理员)
        .service(
            web::scope("/master-pengguna")
                .route("", web::post().to(members_admin::create))
                .route("", web::get().to(members_admin::list))
                .route("/{id}", web::get().to(members_admin::get))
                .route("/{id}", web::put().to(members_admin::update))
                .route("/{id}", web::delete().to(members_admin::delete)),
        )
        // 仪表盘
        .service(
            web::scope("/dashboard").route("/summary", web::get().to(members_admin::summary)),
        );
}
