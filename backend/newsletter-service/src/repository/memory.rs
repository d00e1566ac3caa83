//! Process-local store.
//!
//! All three repository traits share one `RwLock`ed state so each trait call is
//! atomic. Rows are kept in insertion order; "newest first" listings iterate in
//! reverse.

use super::{CommentRepository, PostRepository, UserRepository};
use crate::domain::{
    Comment, NewComment, NewPost, NewUser, Post, User, UserChanges, VoteDirection,
};
use crate::error::{AppError, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate() -> AppError {
    AppError::Conflict("Duplicate field value entered".to_string())
}

/// Toggle `actor` in `toggled`, always clearing it from `opposite`
fn toggle_membership(toggled: &mut Vec<Uuid>, opposite: &mut Vec<Uuid>, actor: Uuid) {
    if let Some(pos) = toggled.iter().position(|id| *id == actor) {
        toggled.remove(pos);
    } else {
        toggled.push(actor);
    }
    opposite.retain(|id| *id != actor);
}

fn apply_vote(upvotes: &mut Vec<Uuid>, downvotes: &mut Vec<Uuid>, actor: Uuid, dir: VoteDirection) {
    match dir {
        VoteDirection::Up => toggle_membership(upvotes, downvotes, actor),
        VoteDirection::Down => toggle_membership(downvotes, upvotes, actor),
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    rows.skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|u| u.email == user.email || u.nickname == user.nickname)
        {
            return Err(duplicate());
        }

        let created = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            sur_name: user.sur_name,
            nickname: user.nickname,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            age: user.age,
            profile_picture: user.profile_picture,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.state.read().await.users.clone())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut state = self.state.write().await;

        let clashes = state.users.iter().any(|u| {
            u.id != id
                && (changes.email.as_deref() == Some(u.email.as_str())
                    || changes.nickname.as_deref() == Some(u.nickname.as_str()))
        });
        if clashes {
            return Err(duplicate());
        }

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.sur_name {
            user.sur_name = v;
        }
        if let Some(v) = changes.nickname {
            user.nickname = v;
        }
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        if let Some(v) = changes.age {
            user.age = Some(v);
        }
        if let Some(v) = changes.profile_picture {
            user.profile_picture = v;
        }
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        Ok(state.users.len() != before)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| contains_ci(&u.nickname, &needle) || contains_ci(&u.email, &needle))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn autocomplete(&self, prefix: &str, limit: i64) -> Result<Vec<User>> {
        let needle = prefix.to_lowercase();
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.nickname.to_lowercase().starts_with(&needle))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }
}

#[async_trait::async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            image: post.image,
            author_id: post.author_id,
            tags: post.tags,
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        };
        self.state.write().await.posts.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        Ok(page(state.posts.iter().rev().cloned(), limit, offset))
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .rev()
            .filter(|p| p.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        Ok(page(
            state
                .posts
                .iter()
                .rev()
                .filter(|p| p.author_id == author_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Post>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(page(
            state
                .posts
                .iter()
                .rev()
                .filter(|p| contains_ci(&p.title, &needle) || contains_ci(&p.content, &needle))
                .cloned(),
            limit,
            0,
        ))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        Ok(state.posts.len() != before)
    }

    async fn append_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.iter_mut().find(|p| p.id == post_id).map(|post| {
            post.comments.push(comment_id);
            post.clone()
        }))
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                post.comments.retain(|id| *id != comment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_comments(&self, post_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                post.comments.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.iter_mut().find(|p| p.id == id).map(|post| {
            apply_vote(&mut post.upvotes, &mut post.downvotes, actor, direction);
            post.clone()
        }))
    }
}

#[async_trait::async_trait]
impl CommentRepository for MemoryStore {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        // Mirrors the posts foreign key on the Postgres store
        if !state.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::not_found("Post", comment.post_id));
        }

        let created = Comment {
            id: Uuid::new_v4(),
            body: comment.body,
            author_id: comment.author_id,
            post_id: comment.post_id,
            parent_kind: comment.parent.kind(),
            parent_id: comment.parent.id(),
            depth: comment.depth,
            comments: Vec::new(),
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            deleted: false,
            created_at: Utc::now(),
        };
        state.comments.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state
            .comments
            .iter_mut()
            .find(|c| c.id == parent_id)
            .map(|parent| {
                parent.comments.push(child_id);
                parent.clone()
            }))
    }

    async fn remove_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.comments.iter_mut().find(|c| c.id == parent_id) {
            Some(parent) => {
                parent.comments.retain(|id| *id != child_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() != before)
    }

    async fn soft_delete(&self, id: Uuid, body: &str) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.body = body.to_string();
            comment.deleted = true;
            comment.clone()
        }))
    }

    async fn delete_by_post(&self, post_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.post_id != post_id);
        Ok((before - state.comments.len()) as u64)
    }

    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Comment>> {
        let mut state = self.state.write().await;
        Ok(state.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            apply_vote(&mut comment.upvotes, &mut comment.downvotes, actor, direction);
            comment.clone()
        }))
    }
}
