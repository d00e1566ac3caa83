/// Vote ledger - upvote/downvote toggling shared by posts and comments
///
/// A vote value of `1` toggles an upvote, `0` toggles a downvote, and any other
/// value leaves the entity untouched. Switching direction moves the actor from
/// one set to the other, so an actor is never in both.
use crate::domain::{Comment, Post, Votable, VoteDirection, VoteOutcome, VoteTarget};
use crate::error::{AppError, Result};
use crate::metrics::VOTES_APPLIED_TOTAL;
use crate::repository::Store;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct VoteLedger {
    store: Store,
}

impl VoteLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Apply a vote to a post
    pub async fn vote_post(&self, post_id: Uuid, actor: Uuid, value: i64) -> Result<VoteOutcome<Post>> {
        let post = match VoteDirection::from_value(value) {
            Some(direction) => self.store.posts.toggle_vote(post_id, actor, direction).await?,
            None => self.store.posts.find_by_id(post_id).await?,
        }
        .ok_or_else(|| AppError::not_found("Post", post_id))?;

        Ok(record(VoteTarget::Post, post_id, actor, value, post))
    }

    /// Apply a vote to a comment
    pub async fn vote_comment(
        &self,
        comment_id: Uuid,
        actor: Uuid,
        value: i64,
    ) -> Result<VoteOutcome<Comment>> {
        let comment = match VoteDirection::from_value(value) {
            Some(direction) => {
                self.store
                    .comments
                    .toggle_vote(comment_id, actor, direction)
                    .await?
            }
            None => self.store.comments.find_by_id(comment_id).await?,
        }
        .ok_or_else(|| AppError::not_found("Comment", comment_id))?;

        Ok(record(VoteTarget::Comment, comment_id, actor, value, comment))
    }
}

/// Score the row returned by the store after the toggle
fn record<T: Votable>(
    target: VoteTarget,
    id: Uuid,
    actor: Uuid,
    value: i64,
    entity: T,
) -> VoteOutcome<T> {
    let direction = VoteDirection::from_value(value).map_or("ignored", |d| d.as_str());
    VOTES_APPLIED_TOTAL
        .with_label_values(&[target.as_str(), direction])
        .inc();

    let net_score = entity.net_score();
    debug!(
        target = target.as_str(),
        entity_id = %id,
        actor = %actor,
        direction,
        net_score,
        "vote applied"
    );

    VoteOutcome { entity, net_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewPost;

    async fn setup() -> (VoteLedger, Store, Uuid) {
        let store = Store::in_memory();
        let post = store
            .posts
            .insert(NewPost {
                author_id: Uuid::new_v4(),
                title: "Votes".into(),
                content: "content".into(),
                tags: vec![],
                image: false,
            })
            .await
            .unwrap();
        (VoteLedger::new(store.clone()), store, post.id)
    }

    #[tokio::test]
    async fn test_same_upvote_twice_cancels() {
        let (ledger, _, post_id) = setup().await;
        let voter = Uuid::new_v4();

        ledger.vote_post(post_id, voter, 1).await.unwrap();
        let outcome = ledger.vote_post(post_id, voter, 1).await.unwrap();

        assert!(outcome.entity.upvotes.is_empty());
        assert!(outcome.entity.downvotes.is_empty());
        assert_eq!(outcome.net_score, 0);
    }

    #[tokio::test]
    async fn test_up_then_down_then_down() {
        let (ledger, _, post_id) = setup().await;
        let b = Uuid::new_v4();

        let o = ledger.vote_post(post_id, b, 1).await.unwrap();
        assert_eq!(o.entity.upvotes, vec![b]);
        assert_eq!(o.net_score, 1);

        let o = ledger.vote_post(post_id, b, 0).await.unwrap();
        assert!(o.entity.upvotes.is_empty());
        assert_eq!(o.entity.downvotes, vec![b]);
        assert_eq!(o.net_score, -1);

        let o = ledger.vote_post(post_id, b, 0).await.unwrap();
        assert!(o.entity.downvotes.is_empty());
        assert_eq!(o.net_score, 0);
    }

    #[tokio::test]
    async fn test_sets_stay_disjoint_over_any_sequence() {
        let (ledger, _, post_id) = setup().await;
        let voters: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let sequence = [1, 0, 0, 1, 1, 7, 0, 1, 0, 0, 1, -3];

        for (i, value) in sequence.iter().enumerate() {
            let voter = voters[i % voters.len()];
            let o = ledger.vote_post(post_id, voter, *value).await.unwrap();
            for v in &voters {
                assert!(!(o.entity.upvotes.contains(v) && o.entity.downvotes.contains(v)));
            }
            assert_eq!(
                o.net_score,
                o.entity.upvotes.len() as i64 - o.entity.downvotes.len() as i64
            );
        }
    }

    #[tokio::test]
    async fn test_other_values_are_a_no_op() {
        let (ledger, _, post_id) = setup().await;
        let voter = Uuid::new_v4();
        ledger.vote_post(post_id, voter, 1).await.unwrap();

        let o = ledger.vote_post(post_id, voter, 5).await.unwrap();
        assert_eq!(o.entity.upvotes, vec![voter]);
        assert_eq!(o.net_score, 1);
    }

    #[tokio::test]
    async fn test_vote_on_missing_entity_is_not_found() {
        let (ledger, store, _) = setup().await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            ledger.vote_post(missing, Uuid::new_v4(), 1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            ledger.vote_comment(missing, Uuid::new_v4(), 2).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.posts.find_by_id(missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_votes_stay_consistent() {
        let (ledger, store, post_id) = setup().await;
        let voters: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();

        let handles: Vec<_> = voters
            .iter()
            .map(|voter| {
                let ledger = ledger.clone();
                let voter = *voter;
                tokio::spawn(async move { ledger.vote_post(post_id, voter, 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let post = store.posts.find_by_id(post_id).await.unwrap().unwrap();
        assert_eq!(post.upvotes.len(), voters.len());
        assert_eq!(post.net_score(), voters.len() as i64);
    }
}
