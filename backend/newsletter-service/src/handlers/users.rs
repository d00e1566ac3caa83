/// User directory and administration handlers
///
/// Reads are public; mutations require the admin role.
use crate::domain::Role;
use crate::error::Result;
use crate::handlers::{ok, ok_counted, ok_empty};
use crate::services::accounts::{CreateUserRequest, UpdateUserRequest};
use crate::middleware::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

const ADMIN: &[Role] = &[Role::Admin];

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let users = state.accounts.list_users().await?;
    Ok(ok_counted(users))
}

pub async fn get_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let user = state.accounts.get_user(path.into_inner()).await?;
    Ok(ok(user))
}

pub async fn create_user(
    state: web::Data<AppState>,
    admin: CurrentUser,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    admin.require_role(ADMIN)?;
    let user = state.accounts.create_user(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "data": user,
    })))
}

pub async fn update_user(
    state: web::Data<AppState>,
    admin: CurrentUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    admin.require_role(ADMIN)?;
    let user = state
        .accounts
        .update_user(path.into_inner(), req.into_inner())
        .await?;
    Ok(ok(user))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    admin: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    admin.require_role(ADMIN)?;
    state.accounts.delete_user(path.into_inner()).await?;
    Ok(ok_empty())
}
