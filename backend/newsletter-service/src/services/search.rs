/// Search service - user and post lookup by case-insensitive substring
use crate::domain::{Post, User};
use crate::error::{AppError, Result};
use crate::repository::Store;
use tracing::debug;

/// Autocomplete never returns more than this many nicknames
pub const AUTOCOMPLETE_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct SearchService {
    store: Store,
    result_limit: i64,
}

fn query_text(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::ValidationError(
            "Please provide a search query".to_string(),
        ));
    }
    Ok(query)
}

impl SearchService {
    pub fn new(store: Store, result_limit: i64) -> Self {
        Self {
            store,
            result_limit,
        }
    }

    /// Users whose nickname or email contains `query`
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let query = query_text(query)?;
        let users = self.store.users.search(query, self.result_limit).await?;
        debug!(query, hits = users.len(), "user search");
        Ok(users)
    }

    /// Posts whose title or content contains `query`, newest first
    pub async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
        let query = query_text(query)?;
        let posts = self.store.posts.search(query, self.result_limit).await?;
        debug!(query, hits = posts.len(), "post search");
        Ok(posts)
    }

    /// Users whose nickname starts with `prefix`
    pub async fn autocomplete_users(&self, prefix: &str) -> Result<Vec<User>> {
        let prefix = query_text(prefix)?;
        let limit = AUTOCOMPLETE_LIMIT.min(self.result_limit);
        self.store.users.autocomplete(prefix, limit).await
    }
}
