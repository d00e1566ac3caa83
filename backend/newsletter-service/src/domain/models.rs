use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Body written over a comment soft-deleted by the post author
pub const DELETED_COMMENT_BODY: &str = "Deleted Comment";

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("{} is not a valid role", other)),
        }
    }
}

/// User account. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub sur_name: String,
    pub nickname: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub age: Option<NaiveDate>,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub sur_name: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub age: Option<NaiveDate>,
    pub profile_picture: String,
}

/// Partial user update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub sur_name: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub age: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

/// Public projection of a user attached to posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub sur_name: String,
    pub nickname: String,
    pub profile_picture: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            sur_name: user.sur_name.clone(),
            nickname: user.nickname.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

// ============================================================================
// Votes
// ============================================================================

/// Direction of a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// `1` is an upvote, `0` a downvote; anything else is not a vote
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(VoteDirection::Up),
            0 => Some(VoteDirection::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

/// Which kind of entity a vote targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Post,
    Comment,
}

impl VoteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteTarget::Post => "post",
            VoteTarget::Comment => "comment",
        }
    }
}

/// An entity carrying upvote/downvote sets
pub trait Votable {
    fn upvotes(&self) -> &[Uuid];
    fn downvotes(&self) -> &[Uuid];

    /// |upvotes| - |downvotes|
    fn net_score(&self) -> i64 {
        self.upvotes().len() as i64 - self.downvotes().len() as i64
    }
}

/// Entity after a vote, with its score computed from the re-read row
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome<T> {
    pub entity: T,
    pub net_score: i64,
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: bool,
    pub author_id: Uuid,
    pub tags: Vec<String>,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Votable for Post {
    fn upvotes(&self) -> &[Uuid] {
        &self.upvotes
    }

    fn downvotes(&self) -> &[Uuid] {
        &self.downvotes
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image: bool,
}

/// Post with its author's public profile (`None` once the account is gone)
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Option<UserProfile>,
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "parent_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Post,
    Comment,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Post => "post",
            ParentKind::Comment => "comment",
        }
    }
}

/// What a comment hangs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Post(Uuid),
    Comment(Uuid),
}

impl ParentRef {
    pub fn kind(&self) -> ParentKind {
        match self {
            ParentRef::Post(_) => ParentKind::Post,
            ParentRef::Comment(_) => ParentKind::Comment,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ParentRef::Post(id) | ParentRef::Comment(id) => *id,
        }
    }
}

/// Comment node. The tree is stored flat: each row knows its post, its parent
/// and its depth, and keeps the ordered ids of its direct replies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_kind: ParentKind,
    pub parent_id: Uuid,
    pub depth: i32,
    pub comments: Vec<Uuid>,
    pub upvotes: Vec<Uuid>,
    pub downvotes: Vec<Uuid>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn parent(&self) -> ParentRef {
        match self.parent_kind {
            ParentKind::Post => ParentRef::Post(self.parent_id),
            ParentKind::Comment => ParentRef::Comment(self.parent_id),
        }
    }
}

impl Votable for Comment {
    fn upvotes(&self) -> &[Uuid] {
        &self.upvotes
    }

    fn downvotes(&self) -> &[Uuid] {
        &self.downvotes
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent: ParentRef,
    pub depth: i32,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserProfile>,
}
