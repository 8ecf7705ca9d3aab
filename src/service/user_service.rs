use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    policy::{Action, Actor, Policy},
    repository::{UserRepository, MAX_PAGE_SIZE},
};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
    policy: Policy,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, auth: Arc<AuthService>, policy: Policy) -> Self {
        Self { repo, auth, policy }
    }

    /// Checks credentials. Unknown users, wrong passwords and disabled
    /// accounts all fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self.repo.find_by_username(username).await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            tracing::info!(user_id = user.id, "Login attempt for disabled account");
            return Err(AppError::Unauthorized);
        }

        let hash = self.repo.password_hash(user.id).await?
            .ok_or(AppError::Unauthorized)?;

        if !AuthService::verify_password(password, &hash).await? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Public sign-up. Only student and parent accounts can be self-registered.
    pub async fn register(&self, request: CreateUserRequest) -> Result<User> {
        if !matches!(request.role, Role::Student | Role::Parent) {
            return Err(AppError::Validation(
                "Only student and parent accounts can self-register".to_string(),
            ));
        }
        self.insert(request).await
    }

    pub async fn create_user(&self, actor: &Actor, request: CreateUserRequest) -> Result<User> {
        self.policy.authorize(actor, Action::ManageUsers)?;
        self.insert(request).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self, actor: &Actor, limit: i64, offset: i64) -> Result<Vec<User>> {
        self.policy.authorize(actor, Action::ManageUsers)?;
        self.repo.list(limit.clamp(1, MAX_PAGE_SIZE), offset.max(0)).await
    }

    pub async fn update_profile(&self, actor: &Actor, update: UpdateProfileRequest) -> Result<User> {
        update.validate()?;

        if let Some(ref email) = update.email {
            if let Some(existing) = self.repo.find_by_email(email).await? {
                if existing.id != actor.id {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
            }
        }

        self.repo.update_profile(actor.id, update).await
    }

    pub async fn change_password(&self, actor: &Actor, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let hash = self.repo.password_hash(actor.id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !AuthService::verify_password(&request.current_password, &hash).await? {
            return Err(AppError::Validation("Current password is incorrect".to_string()));
        }

        let new_hash = AuthService::hash_password(&request.new_password).await?;
        self.repo.update_password(actor.id, &new_hash).await?;

        tracing::info!(user_id = actor.id, "Password changed");
        Ok(())
    }

    /// Soft-disable or re-enable an account. Disabling drops its sessions.
    pub async fn set_active(&self, actor: &Actor, user_id: i64, active: bool) -> Result<User> {
        self.policy.authorize(actor, Action::ManageUsers)?;

        if user_id == actor.id && !active {
            return Err(AppError::Validation("You cannot disable your own account".to_string()));
        }

        let user = self.repo.set_active(user_id, active).await?;

        if !active {
            let dropped = self.auth.invalidate_user_sessions(user_id).await?;
            tracing::info!(user_id, sessions = dropped, "User disabled");
        } else {
            tracing::info!(user_id, "User enabled");
        }

        Ok(user)
    }

    async fn insert(&self, request: CreateUserRequest) -> Result<User> {
        request.validate()?;

        if self.repo.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;

        let user = self.repo.create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            role: request.role,
            grade_level: request.grade_level,
            first_name: request.first_name,
            last_name: request.last_name,
        }).await?;

        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }
}
