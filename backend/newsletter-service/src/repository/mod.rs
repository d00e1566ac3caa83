//! Storage interface for users, posts and comments.
//!
//! Each trait is implemented twice: against Postgres (`postgres`) and against a
//! process-local store (`memory`) used by tests and `STORE_BACKEND=memory`.
//! Every method is atomic on its own; callers compose multi-step sequences.

pub mod memory;
pub mod postgres;

use crate::domain::{
    Comment, NewComment, NewPost, NewUser, Post, User, UserChanges, VoteDirection,
};
use crate::error::Result;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::{PgCommentRepository, PgPostRepository, PgUserRepository};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fetch every user whose id is in `ids` (missing ids are skipped)
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// All users, oldest first
    async fn list(&self) -> Result<Vec<User>>;

    /// Apply the non-empty fields of `changes`; `None` if the user is absent
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Case-insensitive substring match on nickname or email
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>>;

    /// Case-insensitive nickname prefix match
    async fn autocomplete(&self, prefix: &str, limit: i64) -> Result<Vec<User>>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Newest first
    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;

    /// Newest first
    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>>;

    /// Newest first
    async fn list_by_author(&self, author_id: Uuid, limit: i64, offset: i64)
        -> Result<Vec<Post>>;

    /// Case-insensitive substring match on title or content, newest first
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Post>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Append a comment id to the post's child list; `None` if the post is absent
    async fn append_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>>;

    /// Detach a comment id from the post's child list
    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool>;

    /// Empty the post's child list
    async fn clear_comments(&self, post_id: Uuid) -> Result<bool>;

    /// Atomically toggle `actor` in the vote set for `direction`, removing it
    /// from the opposite set. `None` if the post is absent.
    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Post>>;
}

#[async_trait::async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<Comment>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Direct children of a post or comment, oldest first
    async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<Comment>>;

    /// Append a reply id to the comment's child list; `None` if absent
    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Option<Comment>>;

    async fn remove_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<bool>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Replace the body and mark the comment deleted; `None` if absent
    async fn soft_delete(&self, id: Uuid, body: &str) -> Result<Option<Comment>>;

    /// Remove every comment of a post, returning how many were removed
    async fn delete_by_post(&self, post_id: Uuid) -> Result<u64>;

    /// Same contract as [`PostRepository::toggle_vote`]
    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Comment>>;
}

/// The repositories a running service works against
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}

/// Escape LIKE metacharacters so user input matches literally
pub(crate) fn like_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
