/// Post handlers - publishing, feeds, voting and cascade deletion
use crate::error::Result;
use crate::handlers::{ok, ok_empty, voted, VoteRequest};
use crate::services::posts::CreatePost;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image: bool,
}

/// Optional pagination body for the feed routes
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn page(body: Option<web::Json<PageRequest>>) -> PageRequest {
    body.map(web::Json::into_inner).unwrap_or_default()
}

pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let post = state
        .posts
        .create_post(
            user.id(),
            CreatePost {
                title: req.title,
                content: req.content,
                tags: req.tags,
                image: req.image,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "data": post })))
}

/// Single post with its author's public profile
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let found = state.posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": found.post,
        "author": found.author,
    })))
}

pub async fn list_by_tag(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = state.posts.list_by_tag(&path).await?;
    Ok(ok(posts))
}

/// Newest posts across all authors
pub async fn list_recent(
    state: web::Data<AppState>,
    _user: CurrentUser,
    body: Option<web::Json<PageRequest>>,
) -> Result<HttpResponse> {
    let page = page(body);
    let posts = state.posts.list_recent(page.limit, page.offset).await?;
    Ok(ok(posts))
}

pub async fn list_mine(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: Option<web::Json<PageRequest>>,
) -> Result<HttpResponse> {
    let page = page(body);
    let posts = state
        .posts
        .list_by_author(user.id(), page.limit, page.offset)
        .await?;
    Ok(ok(posts))
}

pub async fn list_by_user(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
    body: Option<web::Json<PageRequest>>,
) -> Result<HttpResponse> {
    let page = page(body);
    let posts = state
        .posts
        .list_by_author(path.into_inner(), page.limit, page.offset)
        .await?;
    Ok(ok(posts))
}

pub async fn vote(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let outcome = state
        .posts
        .vote(path.into_inner(), user.id(), req.value())
        .await?;
    Ok(voted(outcome))
}

/// Delete a post together with every comment under it
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete_post(path.into_inner(), user.id()).await?;
    Ok(ok_empty())
}
