use super::{like_escape, CommentRepository, PostRepository, UserRepository};
use crate::domain::{
    Comment, NewComment, NewPost, NewUser, Post, User, UserChanges, VoteDirection,
};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, first_name, sur_name, nickname, email, password_hash, role, \
                            age, profile_picture, created_at";

const POST_COLUMNS: &str =
    "id, title, content, image, author_id, tags, upvotes, downvotes, comments, created_at";

const COMMENT_COLUMNS: &str = "id, body, author_id, post_id, parent_kind, parent_id, depth, \
                               comments, upvotes, downvotes, deleted, created_at";

/// `(toggled set, opposite set)` column names for a vote direction
fn vote_columns(direction: VoteDirection) -> (&'static str, &'static str) {
    match direction {
        VoteDirection::Up => ("upvotes", "downvotes"),
        VoteDirection::Down => ("downvotes", "upvotes"),
    }
}

/// Single-statement membership toggle. The row lock taken by UPDATE makes
/// concurrent votes on the same entity serialize on the latest row version.
fn toggle_vote_sql(table: &str, columns: &str, direction: VoteDirection) -> String {
    let (toggled, opposite) = vote_columns(direction);
    format!(
        r#"
        UPDATE {table}
        SET {toggled} = CASE
                WHEN $2 = ANY({toggled}) THEN array_remove({toggled}, $2)
                ELSE array_append({toggled}, $2)
            END,
            {opposite} = array_remove({opposite}, $2)
        WHERE id = $1
        RETURNING {columns}
        "#
    )
}

// ============================================================================
// Users
// ============================================================================

/// Repository for user accounts
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, first_name, sur_name, nickname, email, password_hash,
                               role, age, profile_picture, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.first_name)
            .bind(&user.sur_name)
            .bind(&user.nickname)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.age)
            .bind(&user.profile_picture)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                sur_name = COALESCE($3, sur_name),
                nickname = COALESCE($4, nickname),
                email = COALESCE($5, email),
                role = COALESCE($6, role),
                age = COALESCE($7, age),
                profile_picture = COALESCE($8, profile_picture)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.sur_name)
            .bind(changes.nickname)
            .bind(changes.email)
            .bind(changes.role)
            .bind(changes.age)
            .bind(changes.profile_picture)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE nickname ILIKE $1 OR email ILIKE $1
            ORDER BY nickname ASC
            LIMIT $2
            "#
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(format!("%{}%", like_escape(query)))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn autocomplete(&self, prefix: &str, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE nickname ILIKE $1
            ORDER BY nickname ASC
            LIMIT $2
            "#
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(format!("{}%", like_escape(prefix)))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Repository for posts and their vote/child-list columns
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let sql = format!(
            r#"
            INSERT INTO posts (id, title, content, image, author_id, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.image)
            .bind(post.author_id)
            .bind(&post.tags)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE $1 = ANY(tags) ORDER BY created_at DESC, id DESC"
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(tag)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            WHERE title ILIKE $1 OR content ILIKE $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(format!("%{}%", like_escape(query)))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET comments = array_append(comments, $2) WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE posts SET comments = array_remove(comments, $2) WHERE id = $1")
                .bind(post_id)
                .bind(comment_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_comments(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET comments = '{}' WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Post>> {
        let sql = toggle_vote_sql("posts", POST_COLUMNS, direction);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }
}

// ============================================================================
// Comments
// ============================================================================

/// Repository for the flat comment tree
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let sql = format!(
            r#"
            INSERT INTO comments (id, body, author_id, post_id, parent_kind, parent_id, depth, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COMMENT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(&comment.body)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .bind(comment.parent.kind())
            .bind(comment.parent.id())
            .bind(comment.depth)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::NotFound(_) => AppError::not_found("Post", comment.post_id),
                other => other,
            })?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE parent_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn append_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Option<Comment>> {
        let sql = format!(
            "UPDATE comments SET comments = array_append(comments, $2) WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(parent_id)
            .bind(child_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn remove_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE comments SET comments = array_remove(comments, $2) WHERE id = $1",
        )
        .bind(parent_id)
        .bind(child_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: Uuid, body: &str) -> Result<Option<Comment>> {
        let sql = format!(
            "UPDATE comments SET body = $2, deleted = TRUE WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(body)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn delete_by_post(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn toggle_vote(
        &self,
        id: Uuid,
        actor: Uuid,
        direction: VoteDirection,
    ) -> Result<Option<Comment>> {
        let sql = toggle_vote_sql("comments", COMMENT_COLUMNS, direction);
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }
}
