//! 运营用户认证 HTTP API (`POST /login`)

use actix_web::{web, HttpResponse, Result};
use std::sync::Arc;

use super::handlers::AppState;
use super::models::{ErrorBody, UserInfo, UserLoginRequest, UserLoginResponse};
use crate::user::auth_manager::UserAuthError;

pub async fn login(
    body: web::Json<UserLoginRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    if req.username.is_empty() || req.password.is_empty() {
        return Ok(
            HttpResponse::BadRequest().json(ErrorBody::new("username_and_password_required"))
        );
    }

    match state.user_auth.login(&req.username, &req.password).await {
        Ok(issued) => {
            log::info!("user {} logged in", issued.user.username);
            Ok(HttpResponse::Ok().json(UserLoginResponse {
                token: issued.access_token,
                refresh_token: issued.refresh_token,
                expires_at: issued.expires_at,
                refresh_expires_at: issued.refresh_expires_at,
                user: UserInfo::from(&issued.user),
            }))
        }
        Err(UserAuthError::InvalidCredentials) => {
            Ok(HttpResponse::Unauthorized().json(ErrorBody::new("invalid_credentials")))
        }
        Err(UserAuthError::UserInactive) => {
            Ok(HttpResponse::Unauthorized().json(ErrorBody::new("user_inactive")))
        }
        Err(UserAuthError::Server(err)) => {
            log::error!("user login failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}
