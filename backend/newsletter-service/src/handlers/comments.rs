/// Comment handlers - threaded replies, deletion modes and voting
use crate::domain::ParentRef;
use crate::error::Result;
use crate::handlers::{ok, ok_empty, voted, VoteRequest};
use crate::middleware::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    pub comment: String,
}

async fn create(
    state: &AppState,
    parent: ParentRef,
    user: CurrentUser,
    req: CommentRequest,
) -> Result<HttpResponse> {
    let created = state
        .comments
        .create_comment(parent, user.id(), &req.comment)
        .await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "data": created })))
}

/// Direct children of a post or comment
pub async fn list_by_parent(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = state.comments.list_by_parent(path.into_inner()).await?;
    Ok(ok(comments))
}

pub async fn comment_on_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    create(&state, ParentRef::Post(path.into_inner()), user, req.into_inner()).await
}

pub async fn reply_to_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    create(&state, ParentRef::Comment(path.into_inner()), user, req.into_inner()).await
}

/// Comment author removes their comment
pub async fn hard_delete(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.comments.hard_delete(path.into_inner(), user.id()).await?;
    Ok(ok_empty())
}

/// Post author blanks a comment under their post
pub async fn soft_delete(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment = state
        .comments
        .soft_delete_by_post_author(path.into_inner(), user.id())
        .await?;
    Ok(ok(comment))
}

/// Post author clears every comment under their post
pub async fn delete_all_for_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let removed = state
        .comments
        .delete_all_for_post_by_author(path.into_inner(), user.id())
        .await?;
    Ok(ok(json!({ "removed": removed })))
}

pub async fn vote(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let outcome = state
        .comments
        .vote(path.into_inner(), user.id(), req.value())
        .await?;
    Ok(voted(outcome))
}
