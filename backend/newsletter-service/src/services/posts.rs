/// Post service - post creation, listing, deletion and voting
use crate::domain::{NewPost, Post, PostWithAuthor, UserProfile, VoteOutcome};
use crate::error::{AppError, Result};
use crate::metrics::POSTS_DELETED_TOTAL;
use crate::repository::Store;
use crate::services::comments::CommentService;
use crate::services::votes::VoteLedger;
use tracing::info;
use uuid::Uuid;

/// Page size when the client does not ask for one
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Input for [`PostService::create_post`]
#[derive(Debug, Clone, Default)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image: bool,
}

/// Clamp client pagination into `(limit, offset)`
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Trim tags, drop empties and duplicates, keep first-seen order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[derive(Clone)]
pub struct PostService {
    store: Store,
    comments: CommentService,
    ledger: VoteLedger,
}

impl PostService {
    pub fn new(store: Store, comments: CommentService) -> Self {
        Self {
            ledger: VoteLedger::new(store.clone()),
            store,
            comments,
        }
    }

    pub async fn create_post(&self, author_id: Uuid, input: CreatePost) -> Result<Post> {
        let title = input.title.trim();
        let content = input.content.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Please add a title".to_string()));
        }
        if content.is_empty() {
            return Err(AppError::ValidationError("Please add some content".to_string()));
        }

        let post = self
            .store
            .posts
            .insert(NewPost {
                author_id,
                title: title.to_string(),
                content: content.to_string(),
                tags: normalize_tags(input.tags),
                image: input.image,
            })
            .await?;

        info!(post_id = %post.id, author_id = %author_id, "post created");
        Ok(post)
    }

    /// Get a post with its author's public profile
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostWithAuthor> {
        let post = self
            .store
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;

        let author = self
            .store
            .users
            .find_by_id(post.author_id)
            .await?
            .map(|u| UserProfile::from(&u));

        Ok(PostWithAuthor { post, author })
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.store.posts.list_by_tag(tag.trim()).await
    }

    pub async fn list_recent(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Post>> {
        let (limit, offset) = page_bounds(limit, offset);
        self.store.posts.list_recent(limit, offset).await
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Post>> {
        let (limit, offset) = page_bounds(limit, offset);
        self.store
            .posts
            .list_by_author(author_id, limit, offset)
            .await
    }

    /// Delete a post and all of its comments. Only the author may do this.
    ///
    /// Comments go first, then the post. The two steps are not transactional:
    /// if the second fails the post survives with a stale child list.
    pub async fn delete_post(&self, post_id: Uuid, actor: Uuid) -> Result<()> {
        let post = self
            .store
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;

        if post.author_id != actor {
            return Err(AppError::Unauthorized(
                "Not authorized to delete this post".to_string(),
            ));
        }

        let removed = self.comments.delete_all_for_post(post_id).await?;
        self.store.posts.delete(post_id).await?;

        POSTS_DELETED_TOTAL.inc();
        info!(post_id = %post_id, comments_removed = removed, "post deleted");
        Ok(())
    }

    /// Vote on a post through the ledger
    pub async fn vote(&self, post_id: Uuid, actor: Uuid, value: i64) -> Result<VoteOutcome<Post>> {
        self.ledger.vote_post(post_id, actor, value).await
    }
}
