pub mod post_service;
pub mod vote_service;
pub mod winner_service;
pub mod user_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::config::Settings;
use crate::policy::Policy;
use post_service::PostService;
use vote_service::VoteService;
use winner_service::WinnerService;
use user_service::UserService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub post_repo: Arc<dyn PostRepository>,
    pub vote_repo: Arc<dyn VoteRepository>,
    pub winner_repo: Arc<dyn WinnerRepository>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub vote_service: Arc<VoteService>,
    pub winner_service: Arc<WinnerService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> Self {
        let policy = Policy::from(&settings.forum);

        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let post_repo: Arc<dyn PostRepository> = Arc::new(SqlitePostRepository::new(db_pool.clone()));
        let vote_repo: Arc<dyn VoteRepository> = Arc::new(SqliteVoteRepository::new(db_pool.clone()));
        let winner_repo: Arc<dyn WinnerRepository> = Arc::new(SqliteWinnerRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_hours,
            settings.server.secure_cookies,
        ));

        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            auth_service.clone(),
            policy.clone(),
        ));
        let post_service = Arc::new(PostService::new(
            post_repo.clone(),
            winner_repo.clone(),
            policy.clone(),
            settings.forum.allow_delete_locked_winner,
        ));
        let vote_service = Arc::new(VoteService::new(
            post_repo.clone(),
            vote_repo.clone(),
            policy.clone(),
        ));
        let winner_service = Arc::new(WinnerService::new(
            winner_repo.clone(),
            post_repo.clone(),
            policy,
            settings.forum.winner_trigger,
        ));

        Self {
            user_repo,
            post_repo,
            vote_repo,
            winner_repo,
            auth_service,
            user_service,
            post_service,
            vote_service,
            winner_service,
            db_pool,
        }
    }
}
