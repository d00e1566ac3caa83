/// Authentication handlers - registration, login and self-service profile updates
use crate::error::Result;
use crate::handlers::ok;
use crate::services::accounts::{
    LoginRequest, RegisterRequest, Session, UpdateDetailsRequest, UpdatePasswordRequest,
};
use crate::state::{AppState, ServiceSettings};
use crate::middleware::CurrentUser;
use actix_middleware::TOKEN_COOKIE;
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `{ success, token }` plus the session cookie
fn token_response(session: Session, settings: &ServiceSettings) -> HttpResponse {
    let cookie = Cookie::build(TOKEN_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies)
        .max_age(Duration::days(settings.cookie_max_age_days))
        .finish();

    HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "token": session.token,
    }))
}

/// Register a new account and start a session
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let session = state.accounts.register(req.into_inner()).await?;
    Ok(token_response(session, &state.settings))
}

/// Exchange email and password for a session
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = state.accounts.login(req.into_inner()).await?;
    Ok(token_response(session, &state.settings))
}

/// Current user
pub async fn me(user: CurrentUser) -> Result<HttpResponse> {
    Ok(ok(user.0))
}

pub async fn update_details(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<UpdateDetailsRequest>,
) -> Result<HttpResponse> {
    let user = state.accounts.update_details(user.id(), req.into_inner()).await?;
    Ok(ok(user))
}

/// Change password; responds with a fresh session
pub async fn update_password(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse> {
    let session = state.accounts.update_password(user.id(), req.into_inner()).await?;
    Ok(token_response(session, &state.settings))
}
