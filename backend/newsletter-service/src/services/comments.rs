/// Comment service - threaded comments under posts
///
/// Comments nest under a post (depth 1) or under another comment (parent depth
/// + 1) up to `max_depth`. The comment author may hard-delete a comment; the
/// author of the owning post may blank it instead. Replies to a hard-deleted
/// comment stay in place and are removed with the post.
use crate::domain::{
    Comment, CommentWithAuthor, NewComment, ParentRef, Post, UserProfile,
    VoteOutcome, DELETED_COMMENT_BODY,
};
use crate::error::{AppError, Result};
use crate::metrics::{
    COMMENTS_CREATED_TOTAL, COMMENT_DELETIONS_TOTAL, COMMENT_DEPTH_REJECTIONS_TOTAL,
};
use crate::repository::Store;
use crate::services::votes::VoteLedger;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Default deepest nesting level (root comments are depth 1)
pub const MAX_COMMENT_DEPTH: i32 = 4;

/// A freshly created comment together with the parent it was attached to
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CreatedComment {
    OnPost { comment: Comment, post: Post },
    Reply { comment: Comment, parent: Comment },
}

impl CreatedComment {
    pub fn comment(&self) -> &Comment {
        match self {
            CreatedComment::OnPost { comment, .. } | CreatedComment::Reply { comment, .. } => {
                comment
            }
        }
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Store,
    ledger: VoteLedger,
    max_depth: i32,
}

impl CommentService {
    pub fn new(store: Store, max_depth: i32) -> Self {
        Self {
            ledger: VoteLedger::new(store.clone()),
            store,
            max_depth,
        }
    }

    /// Create a comment under a post or under another comment
    pub async fn create_comment(
        &self,
        parent: ParentRef,
        author_id: Uuid,
        body: &str,
    ) -> Result<CreatedComment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::ValidationError("Please add a comment".to_string()));
        }

        let created = match parent {
            ParentRef::Post(post_id) => {
                if self.store.posts.find_by_id(post_id).await?.is_none() {
                    return Err(AppError::not_found("Post", post_id));
                }

                let comment = self
                    .store
                    .comments
                    .insert(NewComment {
                        author_id,
                        post_id,
                        parent,
                        depth: 1,
                        body: body.to_string(),
                    })
                    .await?;

                let post = self
                    .store
                    .posts
                    .append_comment(post_id, comment.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Post", post_id))?;

                CreatedComment::OnPost { comment, post }
            }
            ParentRef::Comment(parent_id) => {
                let parent_comment = self
                    .store
                    .comments
                    .find_by_id(parent_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Comment", parent_id))?;

                if parent_comment.depth >= self.max_depth {
                    COMMENT_DEPTH_REJECTIONS_TOTAL.inc();
                    return Err(AppError::Forbidden(format!(
                        "Comments cannot be nested deeper than {} levels",
                        self.max_depth
                    )));
                }

                let comment = self
                    .store
                    .comments
                    .insert(NewComment {
                        author_id,
                        post_id: parent_comment.post_id,
                        parent,
                        depth: parent_comment.depth + 1,
                        body: body.to_string(),
                    })
                    .await?;

                let parent_comment = self
                    .store
                    .comments
                    .append_child(parent_id, comment.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Comment", parent_id))?;

                CreatedComment::Reply {
                    comment,
                    parent: parent_comment,
                }
            }
        };

        COMMENTS_CREATED_TOTAL
            .with_label_values(&[parent.kind().as_str()])
            .inc();
        info!(
            comment_id = %created.comment().id,
            parent_kind = parent.kind().as_str(),
            parent_id = %parent.id(),
            depth = created.comment().depth,
            "comment created"
        );

        Ok(created)
    }

    /// Remove a comment. Only its author may do this.
    pub async fn hard_delete(&self, comment_id: Uuid, actor: Uuid) -> Result<()> {
        let comment = self
            .store
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;

        if comment.author_id != actor {
            return Err(AppError::Unauthorized(
                "Not authorized to delete this comment".to_string(),
            ));
        }

        self.store.comments.delete(comment_id).await?;

        let detached = match comment.parent() {
            ParentRef::Post(post_id) => self.store.posts.remove_comment(post_id, comment_id).await?,
            ParentRef::Comment(parent_id) => {
                self.store
                    .comments
                    .remove_child(parent_id, comment_id)
                    .await?
            }
        };
        if !detached {
            warn!(comment_id = %comment_id, parent_id = %comment.parent_id, "parent missing while detaching comment");
        }

        COMMENT_DELETIONS_TOTAL.with_label_values(&["hard"]).inc();
        info!(comment_id = %comment_id, actor = %actor, "comment removed by author");
        Ok(())
    }

    /// Blank a comment's body. Only the author of the comment's post may do this.
    pub async fn soft_delete_by_post_author(&self, comment_id: Uuid, actor: Uuid) -> Result<Comment> {
        let comment = self
            .store
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;

        let post = self
            .store
            .posts
            .find_by_id(comment.post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", comment.post_id))?;

        if post.author_id != actor {
            return Err(AppError::Unauthorized(
                "Only the post author can delete comments on this post".to_string(),
            ));
        }

        if comment.deleted {
            return Ok(comment);
        }

        let comment = self
            .store
            .comments
            .soft_delete(comment_id, DELETED_COMMENT_BODY)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;

        COMMENT_DELETIONS_TOTAL.with_label_values(&["soft"]).inc();
        info!(comment_id = %comment_id, post_id = %post.id, "comment blanked by post author");
        Ok(comment)
    }

    /// Remove every comment of a post. Callers enforce authorization.
    pub async fn delete_all_for_post(&self, post_id: Uuid) -> Result<u64> {
        let removed = self.store.comments.delete_by_post(post_id).await?;
        COMMENT_DELETIONS_TOTAL
            .with_label_values(&["cascade"])
            .inc_by(removed);
        info!(post_id = %post_id, removed, "comments removed for post");
        Ok(removed)
    }

    /// Remove every comment of a post on behalf of that post's author
    pub async fn delete_all_for_post_by_author(&self, post_id: Uuid, actor: Uuid) -> Result<u64> {
        let post = self
            .store
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;

        if post.author_id != actor {
            return Err(AppError::Unauthorized(
                "Only the post author can delete comments on this post".to_string(),
            ));
        }

        let removed = self.delete_all_for_post(post_id).await?;
        self.store.posts.clear_comments(post_id).await?;
        Ok(removed)
    }

    /// Direct children of a post or comment, oldest first, with author profiles
    pub async fn list_by_parent(&self, parent_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let comments = self.store.comments.list_by_parent(parent_id).await?;

        let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<Uuid, UserProfile> = self
            .store
            .users
            .find_many(&author_ids)
            .await?
            .iter()
            .map(|u| (u.id, UserProfile::from(u)))
            .collect();

        Ok(comments
            .into_iter()
            .map(|comment| CommentWithAuthor {
                author: authors.get(&comment.author_id).cloned(),
                comment,
            })
            .collect())
    }

    /// Vote on a comment through the ledger
    pub async fn vote(&self, comment_id: Uuid, actor: Uuid, value: i64) -> Result<VoteOutcome<Comment>> {
        self.ledger.vote_comment(comment_id, actor, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewPost, NewUser, Role};

    struct Fixture {
        store: Store,
        service: CommentService,
        post_author: Uuid,
        post_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Store::in_memory();
        let author = store
            .users
            .insert(NewUser {
                first_name: "Post".into(),
                sur_name: "Author".into(),
                nickname: "poster".into(),
                email: "poster@example.com".into(),
                password_hash: "hash".into(),
                role: Role::User,
                age: None,
                profile_picture: String::new(),
            })
            .await
            .unwrap();
        let post = store
            .posts
            .insert(NewPost {
                author_id: author.id,
                title: "Thread".into(),
                content: "content".into(),
                tags: vec![],
                image: false,
            })
            .await
            .unwrap();

        Fixture {
            service: CommentService::new(store.clone(), MAX_COMMENT_DEPTH),
            store,
            post_author: author.id,
            post_id: post.id,
        }
    }

    #[tokio::test]
    async fn test_comment_on_post_is_depth_one_and_linked() {
        let f = fixture().await;
        let created = f
            .service
            .create_comment(ParentRef::Post(f.post_id), Uuid::new_v4(), "  first!  ")
            .await
            .unwrap();

        match created {
            CreatedComment::OnPost { comment, post } => {
                assert_eq!(comment.depth, 1);
                assert_eq!(comment.body, "first!");
                assert_eq!(comment.post_id, f.post_id);
                assert_eq!(post.comments, vec![comment.id]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .create_comment(ParentRef::Post(f.post_id), Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_missing_parents_are_not_found() {
        let f = fixture().await;
        let actor = Uuid::new_v4();
        assert!(matches!(
            f.service
                .create_comment(ParentRef::Post(Uuid::new_v4()), actor, "hi")
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service
                .create_comment(ParentRef::Comment(Uuid::new_v4()), actor, "hi")
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let f = fixture().await;
        let actor = Uuid::new_v4();

        let mut parent = f
            .service
            .create_comment(ParentRef::Post(f.post_id), actor, "depth 1")
            .await
            .unwrap()
            .comment()
            .clone();

        for expected_depth in 2..=MAX_COMMENT_DEPTH {
            let created = f
                .service
                .create_comment(ParentRef::Comment(parent.id), actor, "reply")
                .await
                .unwrap();
            let CreatedComment::Reply { comment, parent: updated_parent } = created else {
                panic!("expected a reply");
            };
            assert_eq!(comment.depth, expected_depth);
            assert_eq!(comment.post_id, f.post_id);
            assert_eq!(updated_parent.comments, vec![comment.id]);
            parent = comment;
        }

        assert_eq!(parent.depth, MAX_COMMENT_DEPTH);
        let err = f
            .service
            .create_comment(ParentRef::Comment(parent.id), actor, "too deep")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.store.comments.list_by_parent(parent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hard_delete_by_other_user_changes_nothing() {
        let f = fixture().await;
        let author = Uuid::new_v4();
        let comment = f
            .service
            .create_comment(ParentRef::Post(f.post_id), author, "mine")
            .await
            .unwrap()
            .comment()
            .clone();

        let err = f
            .service
            .hard_delete(comment.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let still_there = f.store.comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(still_there.body, "mine");
        let post = f.store.posts.find_by_id(f.post_id).await.unwrap().unwrap();
        assert_eq!(post.comments, vec![comment.id]);
    }

    #[tokio::test]
    async fn test_hard_delete_detaches_from_parent() {
        let f = fixture().await;
        let author = Uuid::new_v4();
        let root = f
            .service
            .create_comment(ParentRef::Post(f.post_id), author, "root")
            .await
            .unwrap()
            .comment()
            .clone();
        let reply = f
            .service
            .create_comment(ParentRef::Comment(root.id), author, "reply")
            .await
            .unwrap()
            .comment()
            .clone();

        f.service.hard_delete(reply.id, author).await.unwrap();
        assert!(f.store.comments.find_by_id(reply.id).await.unwrap().is_none());
        let root_after = f.store.comments.find_by_id(root.id).await.unwrap().unwrap();
        assert!(root_after.comments.is_empty());

        f.service.hard_delete(root.id, author).await.unwrap();
        let post = f.store.posts.find_by_id(f.post_id).await.unwrap().unwrap();
        assert!(post.comments.is_empty());

        assert!(matches!(
            f.service.hard_delete(root.id, author).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_by_post_author_keeps_children() {
        let f = fixture().await;
        let commenter = Uuid::new_v4();
        let root = f
            .service
            .create_comment(ParentRef::Post(f.post_id), commenter, "rude")
            .await
            .unwrap()
            .comment()
            .clone();
        let reply = f
            .service
            .create_comment(ParentRef::Comment(root.id), commenter, "reply")
            .await
            .unwrap()
            .comment()
            .clone();

        let blanked = f
            .service
            .soft_delete_by_post_author(root.id, f.post_author)
            .await
            .unwrap();
        assert_eq!(blanked.body, DELETED_COMMENT_BODY);
        assert!(blanked.deleted);
        assert_eq!(blanked.comments, vec![reply.id]);
        assert!(f.store.comments.find_by_id(reply.id).await.unwrap().is_some());

        let again = f
            .service
            .soft_delete_by_post_author(root.id, f.post_author)
            .await
            .unwrap();
        assert_eq!(again.body, DELETED_COMMENT_BODY);
    }

    #[tokio::test]
    async fn test_soft_delete_uses_post_author_not_comment_author() {
        let f = fixture().await;
        let commenter = Uuid::new_v4();
        let root = f
            .service
            .create_comment(ParentRef::Post(f.post_id), commenter, "hello")
            .await
            .unwrap()
            .comment()
            .clone();
        let reply = f
            .service
            .create_comment(ParentRef::Comment(root.id), Uuid::new_v4(), "nested")
            .await
            .unwrap()
            .comment()
            .clone();

        // The parent comment's author does not own the thread
        let err = f
            .service
            .soft_delete_by_post_author(reply.id, commenter)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let blanked = f
            .service
            .soft_delete_by_post_author(reply.id, f.post_author)
            .await
            .unwrap();
        assert!(blanked.deleted);
    }

    #[tokio::test]
    async fn test_list_by_parent_attaches_authors_oldest_first() {
        let f = fixture().await;
        f.service
            .create_comment(ParentRef::Post(f.post_id), f.post_author, "one")
            .await
            .unwrap();
        f.service
            .create_comment(ParentRef::Post(f.post_id), Uuid::new_v4(), "two")
            .await
            .unwrap();

        let listed = f.service.list_by_parent(f.post_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].comment.body, "one");
        assert_eq!(
            listed[0].author.as_ref().map(|a| a.nickname.as_str()),
            Some("poster")
        );
        assert_eq!(listed[1].comment.body, "two");
        assert!(listed[1].author.is_none());
    }

    #[tokio::test]
    async fn test_delete_all_for_post_by_author() {
        let f = fixture().await;
        let root = f
            .service
            .create_comment(ParentRef::Post(f.post_id), Uuid::new_v4(), "root")
            .await
            .unwrap()
            .comment()
            .clone();
        f.service
            .create_comment(ParentRef::Comment(root.id), Uuid::new_v4(), "reply")
            .await
            .unwrap();

        assert!(matches!(
            f.service
                .delete_all_for_post_by_author(f.post_id, Uuid::new_v4())
                .await,
            Err(AppError::Unauthorized(_))
        ));

        let removed = f
            .service
            .delete_all_for_post_by_author(f.post_id, f.post_author)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        let post = f.store.posts.find_by_id(f.post_id).await.unwrap().unwrap();
        assert!(post.comments.is_empty());
    }

    #[tokio::test]
    async fn test_vote_on_comment_goes_through_ledger() {
        let f = fixture().await;
        let comment = f
            .service
            .create_comment(ParentRef::Post(f.post_id), Uuid::new_v4(), "vote me")
            .await
            .unwrap()
            .comment()
            .clone();
        let voter = Uuid::new_v4();

        let outcome = f.service.vote(comment.id, voter, 0).await.unwrap();
        assert_eq!(outcome.entity.downvotes, vec![voter]);
        assert_eq!(outcome.net_score, -1);
    }
}
