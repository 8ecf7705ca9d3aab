use std::sync::Arc;
use chrono::Utc;

use crate::{
    domain::*,
    error::{AppError, Result},
    policy::{Action, Actor, Policy},
    repository::{PostRepository, WinnerRepository},
};

const MAX_TITLE_LEN: usize = 200;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    winners: Arc<dyn WinnerRepository>,
    policy: Policy,
    allow_delete_locked_winner: bool,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        winners: Arc<dyn WinnerRepository>,
        policy: Policy,
        allow_delete_locked_winner: bool,
    ) -> Self {
        Self { posts, winners, policy, allow_delete_locked_winner }
    }

    pub async fn create_post(&self, actor: &Actor, request: CreatePostRequest) -> Result<Post> {
        self.policy.authorize(actor, Action::CreatePost)?;

        let title = validate_title(&request.title)?;
        let content = validate_content(&request.content)?;

        let post = self.posts.create(NewPost {
            title,
            content,
            post_type: request.post_type,
            grade_level: request.grade_level,
            author_id: actor.id,
            created_at: Utc::now(),
        }).await?;

        tracing::info!(post_id = post.id, author_id = actor.id, post_type = %post.post_type, "Post created");

        Ok(post)
    }

    /// Posts the actor may see, newest first. Each call queries afresh.
    pub async fn list_posts(&self, actor: &Actor, filter: &PostFilter) -> Result<Vec<PostView>> {
        let grades = self.policy.visible_grades(actor);
        self.posts.list_visible(grades.as_deref(), filter).await
    }

    pub async fn get_post(&self, actor: &Actor, id: i64) -> Result<Post> {
        let post = self.find(id).await?;
        if !self.policy.can_perform(actor, Action::ViewPost(&post)) {
            return Err(not_found());
        }
        Ok(post)
    }

    pub async fn update_post(&self, actor: &Actor, id: i64, mut update: UpdatePostRequest) -> Result<Post> {
        let post = self.find_for_change(actor, id).await?;
        self.policy.authorize(actor, Action::EditPost(&post))?;

        if update.is_empty() {
            return Ok(post);
        }
        if let Some(title) = update.title.take() {
            update.title = Some(validate_title(&title)?);
        }
        if let Some(content) = update.content.take() {
            update.content = Some(validate_content(&content)?);
        }

        let updated = self.posts.update(id, update).await?;
        tracing::info!(post_id = id, actor_id = actor.id, "Post updated");
        Ok(updated)
    }

    pub async fn delete_post(&self, actor: &Actor, id: i64) -> Result<()> {
        let post = self.find_for_change(actor, id).await?;
        self.policy.authorize(actor, Action::DeletePost(&post))?;

        let now = Utc::now();
        let locked: Vec<_> = self.winners.find_by_post(id).await?
            .into_iter()
            .filter(|w| w.period.is_locked(now))
            .collect();

        if let Some(winner) = locked.first() {
            if !self.allow_delete_locked_winner {
                return Err(AppError::Conflict(format!(
                    "Post is the recorded winner for {} and cannot be deleted",
                    winner.period
                )));
            }
            tracing::warn!(post_id = id, periods = locked.len(), "Deleting a locked monthly winner");
        }

        self.posts.delete(id).await?;
        tracing::info!(post_id = id, actor_id = actor.id, "Post deleted");
        Ok(())
    }

    async fn find(&self, id: i64) -> Result<Post> {
        self.posts.find_by_id(id).await?.ok_or_else(not_found)
    }

    /// Hidden posts read as missing unless the actor could change them anyway.
    async fn find_for_change(&self, actor: &Actor, id: i64) -> Result<Post> {
        let post = self.find(id).await?;
        let visible = self.policy.can_perform(actor, Action::ViewPost(&post))
            || self.policy.can_perform(actor, Action::EditPost(&post));
        if !visible {
            return Err(not_found());
        }
        Ok(post)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Content cannot be empty".to_string()));
    }
    Ok(content.to_string())
}
