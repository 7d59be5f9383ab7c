//! 会员账户管理 HTTP API (管理员专用)
//!
//! 联合登录的带外激活在这里完成 (PUT 带 active=true)

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use super::handlers::AppState;
use super::middleware::AdminContext;
use super::models::{
    CreateMemberRequest, DashboardSummary, ErrorBody, MemberItem, UpdateMemberRequest,
};
use crate::member::Provider;
use crate::storage::member_repo::MemberAccountUpdate;
use crate::utils::pagination::{PageQuery, Paginated};

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    #[serde(rename = "jenis")]
    pub provider: Option<String>,
}

impl MemberListQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
        }
    }
}

pub async fn create(
    _admin: AdminContext,
    body: web::Json<CreateMemberRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    if req.provider_user_id == 0 {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new("id_pengguna_required")));
    }

    let provider = match req.provider.as_deref() {
        None => Provider::Stockity,
        Some(raw) => match Provider::from_str(raw) {
            Ok(provider) => provider,
            Err(()) => {
                return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_jenis")));
            }
        },
    };

    match state
        .members
        .create_manual(
            req.provider_user_id,
            req.telegram,
            provider,
            req.active.unwrap_or(false),
        )
        .await
    {
        Ok(member) => Ok(HttpResponse::Created().json(MemberItem::from(member))),
        Err(err) => {
            log::error!("member create failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn get(
    _admin: AdminContext,
    path: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let id = match path.into_inner().parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_id"))),
    };

    match state.members.get_by_id(id).await {
        Ok(Some(member)) => Ok(HttpResponse::Ok().json(MemberItem::from(member))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ErrorBody::new("not_found"))),
        Err(err) => {
            log::error!("member get failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn list(
    _admin: AdminContext,
    query: web::Query<MemberListQuery>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let params = match query.page_query().parse() {
        Ok(params) => params,
        Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_pagination")));
        }
    };

    let provider = match query.provider.as_deref() {
        None | Some("") => None,
        Some(raw) => match Provider::from_str(raw) {
            Ok(provider) => Some(provider),
            Err(()) => {
                return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_jenis")));
            }
        },
    };

    match state
        .members
        .list(&params.search, provider, params.limit, params.offset)
        .await
    {
        Ok((members, total)) => {
            let items: Vec<MemberItem> = members.into_iter().map(MemberItem::from).collect();
            Ok(HttpResponse::Ok().json(Paginated::new(items, total, &params)))
        }
        Err(err) => {
            log::error!("member list failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn update(
    _admin: AdminContext,
    path: web::Path<String>,
    body: web::Json<UpdateMemberRequest>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let id = match path.into_inner().parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_id"))),
    };

    let req = body.into_inner();
    let provider = match req.provider.as_deref() {
        None => None,
        Some(raw) => match Provider::from_str(raw) {
            Ok(provider) => Some(provider),
            Err(()) => {
                return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_jenis")));
            }
        },
    };

    let update = MemberAccountUpdate {
        provider_user_id: req.provider_user_id,
        telegram: req.telegram,
        provider,
        active: req.active,
    };
    if update.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody::new("no_fields_to_update")));
    }

    match state.members.update(id, update).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "updated" }))),
        Err(err) => {
            log::error!("member update failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn delete(
    _admin: AdminContext,
    path: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    let id = match path.into_inner().parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => return Ok(HttpResponse::BadRequest().json(ErrorBody::new("invalid_id"))),
    };

    match state.members.soft_delete(id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "deleted" }))),
        Err(err) => {
            log::error!("member delete failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}

pub async fn summary(
    _admin: AdminContext,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse> {
    match state.members.count_by_active().await {
        Ok((active, inactive)) => {
            Ok(HttpResponse::Ok().json(DashboardSummary { active, inactive }))
        }
        Err(err) => {
            log::error!("dashboard summary failed: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ErrorBody::new("server_error")))
        }
    }
}
