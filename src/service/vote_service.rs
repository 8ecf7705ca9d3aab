use std::sync::Arc;

use crate::{
    domain::{Post, VoteOutcome, VoteValue},
    error::{AppError, Result},
    policy::{Action, Actor, Policy},
    repository::{PostRepository, VoteRepository},
};

pub struct VoteService {
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
    policy: Policy,
}

impl VoteService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        votes: Arc<dyn VoteRepository>,
        policy: Policy,
    ) -> Self {
        Self { posts, votes, policy }
    }

    /// Records the actor's vote, replacing any earlier one, and returns the new tally.
    pub async fn cast_vote(&self, actor: &Actor, post_id: i64, value: i64) -> Result<VoteOutcome> {
        let value = VoteValue::try_from(value)?;
        let post = self.visible_post(actor, post_id).await?;
        self.policy.authorize(actor, Action::Vote(&post))?;

        let vote = self.votes.upsert(post_id, actor.id, value).await?;
        tracing::debug!(post_id, user_id = actor.id, value = vote.value, "Vote recorded");

        Ok(VoteOutcome {
            tally: self.votes.tally(post_id).await?,
            user_vote: Some(vote.value),
        })
    }

    /// Removing a vote that does not exist is not an error.
    pub async fn retract_vote(&self, actor: &Actor, post_id: i64) -> Result<VoteOutcome> {
        self.visible_post(actor, post_id).await?;

        if self.votes.delete(post_id, actor.id).await? {
            tracing::debug!(post_id, user_id = actor.id, "Vote retracted");
        }

        Ok(VoteOutcome {
            tally: self.votes.tally(post_id).await?,
            user_vote: None,
        })
    }

    pub async fn tally(&self, actor: &Actor, post_id: i64) -> Result<VoteOutcome> {
        self.visible_post(actor, post_id).await?;

        let user_vote = self.votes.find(post_id, actor.id).await?.map(|v| v.value);
        Ok(VoteOutcome {
            tally: self.votes.tally(post_id).await?,
            user_vote,
        })
    }

    async fn visible_post(&self, actor: &Actor, post_id: i64) -> Result<Post> {
        let post = self.posts.find_by_id(post_id).await?
            .filter(|post| self.policy.can_perform(actor, Action::ViewPost(post)))
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        Ok(post)
    }
}
