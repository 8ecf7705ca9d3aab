use std::sync::Arc;
use chrono::Utc;

use crate::{
    config::WinnerTrigger,
    domain::{MonthlyWinner, Period, WinnerOutcome},
    error::{AppError, Result},
    policy::{Action, Actor, Policy},
    repository::{PostRepository, WinnerRepository},
};

/// Monthly winner lifecycle per period: uncomputed, computed, then locked once
/// the month is over. The first computation after the lock is never redone.
pub struct WinnerService {
    winners: Arc<dyn WinnerRepository>,
    posts: Arc<dyn PostRepository>,
    policy: Policy,
    trigger: WinnerTrigger,
}

impl WinnerService {
    pub fn new(
        winners: Arc<dyn WinnerRepository>,
        posts: Arc<dyn PostRepository>,
        policy: Policy,
        trigger: WinnerTrigger,
    ) -> Self {
        Self { winners, posts, policy, trigger }
    }

    /// Recomputes the winner from current tallies. Once a period has closed,
    /// the first computation after its end is final and is returned from then
    /// on. `None` when nothing was posted in the period.
    pub async fn compute_winner(&self, actor: &Actor, period: Period) -> Result<Option<WinnerOutcome>> {
        self.policy.authorize(actor, Action::ViewMonthlyWinner)?;

        match self.winners.compute(&period).await? {
            Some(winner) => self.outcome(winner).await.map(Some),
            None => {
                tracing::debug!(period = %period, "No posts in period");
                Ok(None)
            }
        }
    }

    /// A final winner is returned as stored. Otherwise the lazy trigger
    /// recomputes, so an open month always reflects current votes, while the
    /// precomputed trigger serves whatever was last computed.
    pub async fn get_winner(&self, actor: &Actor, period: Period) -> Result<WinnerOutcome> {
        self.policy.authorize(actor, Action::ViewMonthlyWinner)?;

        let stored = self.winners.find_by_period(&period).await?;

        match (stored, self.trigger) {
            (Some(winner), _) if winner.is_final() => self.outcome(winner).await,
            (Some(winner), WinnerTrigger::Precomputed) => self.outcome(winner).await,
            (None, WinnerTrigger::Precomputed) => Err(AppError::NotFound(format!(
                "Monthly winner for {} has not been computed",
                period
            ))),
            (_, WinnerTrigger::Lazy) => self
                .compute_winner(actor, period)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("No posts were made in {}", period))),
        }
    }

    async fn outcome(&self, winner: MonthlyWinner) -> Result<WinnerOutcome> {
        let post = self.posts.find_by_id(winner.post_id).await?
            .ok_or_else(|| AppError::Internal(format!(
                "Winning post {} for {} is missing",
                winner.post_id, winner.period
            )))?;

        Ok(WinnerOutcome {
            locked: winner.period.is_locked(Utc::now()),
            period: winner.period,
            post,
            vote_count: winner.vote_count,
            computed_at: winner.computed_at,
        })
    }
}
