//! 运营用户管理 HTTP API (管理员专用)

use actix_web::{web, HttpResponse, Result};
use std::sync::Arc;
use uuid::Uuid;

use super::handlers::AppState;
use super::middleware::AdminContext;
use super::models::{
    ErrorBody, RegisterUserRequest, RegisterUserResponse, UpdateUserRequest, UserItem,
};
use crate::storage::user_repo::UserUpdate;
use crate::user::UserRole;
use crate::utils::pagination::{PageQuery, Paginated};

pub async fn register(
    admin: AdminContext,
    body: web::Json<RegisterUserRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    if req.username.is_empty() || req.password.is_empty() || req.role.is_empty() {
        return Ok(
            HttpResponse::BadRequest().json(ErrorBody::new("username_password_role_required"))
        );
    }
    if UserRole::parse(&req.role).is_none() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_role")));
    }

    let hash = match bcrypt::hash(&req.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(err) => {
            log::error!("password hashing failed: {:?}", err);
            return Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")));
        }
    };

    match state
        .users
        .create(&req.username, &hash, &req.role, &admin.0.uid)
        .await
    {
        Ok(user) => Ok(HttpResponse::Created().json(RegisterUserResponse {
            uid: user.uid,
            username: user.username,
            role: user.role,
        })),
        Err(err) => {
            log::error!("user create failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn list(
    _admin: AdminContext,
    query: web::Query<PageQuery>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let params = match query.into_inner().parse() {
        Ok(params) => params,
        Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_pagination")));
        }
    };

    match state
        .users
        .list(&params.search, params.limit, params.offset)
        .await
    {
        Ok((users, total)) => {
            let items: Vec<UserItem> = users.into_iter().map(UserItem::from).collect();
            Ok(HttpResponse::Ok().json(Paginated::new(items, total, &params)))
        }
        Err(err) => {
            log::error!("user list failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn update(
    admin: AdminContext,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let uid = match path.into_inner().parse::<Uuid>() {
        Ok(uid) => uid,
        Err(_) => return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_uid"))),
    };

    let req = body.into_inner();
    if let Some(role) = &req.role {
        if UserRole::parse(role).is_none() {
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_role")));
        }
    }

    let password = match req.password {
        Some(plain) => match bcrypt::hash(&plain, bcrypt::DEFAULT_COST) {
            Ok(hash) => Some(hash),
            Err(err) => {
                log::error!("password hashing failed: {:?}", err);
                return Ok(
                    HttpResponse::InternalServerError().json(ErrorBody::new("server_error"))
                );
            }
        },
        None => None,
    };

    let update = UserUpdate {
        username: req.username,
        password,
        role: req.role,
        active: req.active,
    };
    if update.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new("no_fields_to_update")));
    }

    match state.users.update(uid, update, &admin.0.uid).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "updated" }))),
        Err(err) => {
            log::error!("user update failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn delete(
    admin: AdminContext,
    path: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let uid = match path.into_inner().parse::<Uuid>() {
        Ok(uid) => uid,
        Err(_) => return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_uid"))),
    };

    match state.users.soft_delete(uid, &admin.0.uid).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "deleted" }))),
        Err(err) => {
            log::error!("user delete failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}
