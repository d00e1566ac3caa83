/// Shared application state handed to every handler
use crate::config::Config;
use crate::repository::Store;
use crate::services::{AccountService, CommentService, PostService, SearchService, MAX_COMMENT_DEPTH};
use crypto_core::JwtSigner;
use sqlx::PgPool;
use std::sync::Arc;

/// Service knobs derived from [`Config`]
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub max_comment_depth: i32,
    pub search_result_limit: i64,
    pub cookie_max_age_days: i64,
    pub secure_cookies: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_comment_depth: MAX_COMMENT_DEPTH,
            search_result_limit: 50,
            cookie_max_age_days: 30,
            secure_cookies: false,
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_comment_depth: config.comments.max_depth,
            search_result_limit: config.search.result_limit,
            cookie_max_age_days: config.auth.cookie_expire_days,
            secure_cookies: config.is_production(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub comments: CommentService,
    pub search: SearchService,
    pub settings: ServiceSettings,
    /// Present when running on Postgres; used by the readiness probe
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(store: Store, signer: Arc<JwtSigner>, settings: ServiceSettings, db: Option<PgPool>) -> Self {
        let comments = CommentService::new(store.clone(), settings.max_comment_depth);
        Self {
            accounts: AccountService::new(store.clone(), signer),
            posts: PostService::new(store.clone(), comments.clone()),
            search: SearchService::new(store, settings.search_result_limit),
            comments,
            settings,
            db,
        }
    }
}
