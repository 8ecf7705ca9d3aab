use async_trait::async_trait;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod post_repository;
pub mod vote_repository;
pub mod winner_repository;

pub use user_repository::SqliteUserRepository;
pub use post_repository::SqlitePostRepository;
pub use vote_repository::SqliteVoteRepository;
pub use winner_repository::SqliteWinnerRepository;

/// Page size for listings when the caller does not pass a limit.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn password_hash(&self, id: i64) -> Result<Option<String>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn update_profile(&self, id: i64, update: UpdateProfileRequest) -> Result<User>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;
    async fn set_active(&self, id: i64, active: bool) -> Result<User>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>>;
    /// Newest first. `grades` of `None` means every grade level is visible.
    async fn list_visible(
        &self,
        grades: Option<&[GradeLevel]>,
        filter: &PostFilter,
    ) -> Result<Vec<PostView>>;
    async fn update(&self, id: i64, update: UpdatePostRequest) -> Result<Post>;
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Insert or replace the caller's vote on a post in one statement.
    async fn upsert(&self, post_id: i64, user_id: i64, value: VoteValue) -> Result<Vote>;
    async fn find(&self, post_id: i64, user_id: i64) -> Result<Option<Vote>>;
    /// Returns whether a vote was removed.
    async fn delete(&self, post_id: i64, user_id: i64) -> Result<bool>;
    async fn tally(&self, post_id: i64) -> Result<Tally>;
}

#[async_trait]
pub trait WinnerRepository: Send + Sync {
    async fn find_by_period(&self, period: &Period) -> Result<Option<MonthlyWinner>>;
    async fn find_by_post(&self, post_id: i64) -> Result<Vec<MonthlyWinner>>;
    /// Picks the top post of the period and stores it, replacing any earlier
    /// snapshot. A final row is returned untouched. `None` when the period has no posts.
    async fn compute(&self, period: &Period) -> Result<Option<MonthlyWinner>>;
}
