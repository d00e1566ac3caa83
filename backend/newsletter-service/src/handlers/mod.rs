/// HTTP handlers for the newsletter API
///
/// Every route lives under `/newsletter/api/v1`. Successful responses use the
/// `{ "success": true, "data": ... }` envelope; failures are rendered by
/// [`crate::error::AppError`].
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;
pub mod search;
pub mod users;

use crate::domain::VoteOutcome;
use crate::error::AppError;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

pub const API_PREFIX: &str = "/newsletter/api/v1";

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        count: None,
        data,
    })
}

pub(crate) fn ok_counted<T: Serialize>(data: Vec<T>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        count: Some(data.len()),
        data,
    })
}

/// `{ "success": true, "data": {} }`
pub(crate) fn ok_empty() -> HttpResponse {
    ok(serde_json::json!({}))
}

/// Vote value handed to the ledger when the body carries no usable vote
const NO_VOTE: i64 = -1;

/// Body of the vote routes: numeric `1` upvotes, numeric `0` downvotes and
/// anything else (strings, other numbers, missing field) is ignored
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoteRequest {
    pub vote: Option<serde_json::Value>,
}

impl VoteRequest {
    pub fn value(&self) -> i64 {
        match self.vote.as_ref().and_then(serde_json::Value::as_f64) {
            Some(v) if v == 1.0 => 1,
            Some(v) if v == 0.0 => 0,
            _ => NO_VOTE,
        }
    }
}

/// `{ "success": true, "data": entity, "score": upvotes - downvotes }`
pub(crate) fn voted<T: Serialize>(outcome: VoteOutcome<T>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": outcome.entity,
        "score": outcome.net_score,
    }))
}

/// Register every route, extractor config and ops endpoint
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| {
                tracing::debug!(error = %err, "rejected request body");
                AppError::ValidationError("Invalid request body".to_string()).into()
            }),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Resource not found".to_string()).into()),
    )
    .route("/health", web::get().to(health::health))
    .route("/ready", web::get().to(health::ready))
    .route("/metrics", web::get().to(crate::metrics::serve_metrics))
    .service(
        web::scope(API_PREFIX)
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/updatedetails", web::put().to(auth::update_details))
                    .route("/updatepassword", web::put().to(auth::update_password)),
            )
            .service(
                web::scope("/user")
                    .service(
                        web::resource("")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    ),
            )
            .service(
                web::scope("/post")
                    .route("", web::post().to(posts::list_recent))
                    .route("/createpost", web::post().to(posts::create_post))
                    .route("/me", web::post().to(posts::list_mine))
                    .route("/get/{id}", web::get().to(posts::get_post))
                    .route("/tag/{tag}", web::get().to(posts::list_by_tag))
                    .route("/user/{id}", web::post().to(posts::list_by_user))
                    .route("/vote/{id}", web::put().to(posts::vote))
                    .route("/delete/{id}", web::delete().to(posts::delete_post)),
            )
            .service(
                web::scope("/comment")
                    .route("/get/{id}", web::get().to(comments::list_by_parent))
                    .route("/post/{id}", web::post().to(comments::comment_on_post))
                    .route("/comment/{id}", web::post().to(comments::reply_to_comment))
                    .route("/delete/post/{id}", web::delete().to(comments::delete_all_for_post))
                    .route("/delete/postauthor/{id}", web::put().to(comments::soft_delete))
                    .route("/delete/{id}", web::delete().to(comments::hard_delete))
                    .route("/vote/{id}", web::put().to(comments::vote)),
            )
            .service(
                web::scope("/search")
                    .route("/user", web::post().to(search::users))
                    .route("/user/auto", web::post().to(search::autocomplete))
                    .route("/post", web::post().to(search::posts)),
            ),
    );
}
