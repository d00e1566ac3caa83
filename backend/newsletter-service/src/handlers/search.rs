/// Search handlers
use crate::error::Result;
use crate::handlers::ok;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: String,
}

pub async fn users(
    state: web::Data<AppState>,
    _user: CurrentUser,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let users = state.search.search_users(&req.query).await?;
    Ok(ok(users))
}

/// Nickname prefix suggestions
pub async fn autocomplete(
    state: web::Data<AppState>,
    _user: CurrentUser,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let users = state.search.autocomplete_users(&req.query).await?;
    Ok(ok(users))
}

pub async fn posts(
    state: web::Data<AppState>,
    _user: CurrentUser,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let posts = state.search.search_posts(&req.query).await?;
    Ok(ok(posts))
}
