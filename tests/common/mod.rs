#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, Utc};
use school_forum::{
    config::Settings,
    domain::{GradeLevel, NewPost, NewUser, Post, PostType, Role, User},
    policy::Actor,
    service::ServiceContext,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// A single-connection in-memory database; more connections would each see
/// their own empty database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub async fn test_context_with(settings: Settings) -> anyhow::Result<ServiceContext> {
    let pool = test_pool().await?;
    Ok(ServiceContext::new(pool, &settings))
}

pub async fn test_context() -> anyhow::Result<ServiceContext> {
    test_context_with(Settings::default()).await
}

/// Inserts a user directly, skipping password hashing.
pub async fn user(
    ctx: &ServiceContext,
    username: &str,
    role: Role,
    grade_level: GradeLevel,
) -> anyhow::Result<User> {
    let user = ctx.user_repo.create(NewUser {
        username: username.to_string(),
        email: format!("{}@test.school", username),
        password_hash: "unused".to_string(),
        role,
        grade_level,
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
    }).await?;
    Ok(user)
}

pub async fn actor(
    ctx: &ServiceContext,
    username: &str,
    role: Role,
    grade_level: GradeLevel,
) -> anyhow::Result<Actor> {
    Ok(Actor::from(&user(ctx, username, role, grade_level).await?))
}

/// Inserts a post with an explicit creation time.
pub async fn post_at(
    ctx: &ServiceContext,
    author: &Actor,
    title: &str,
    grade_level: GradeLevel,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Post> {
    let post = ctx.post_repo.create(NewPost {
        title: title.to_string(),
        content: format!("{} body", title),
        post_type: PostType::Announcement,
        grade_level,
        author_id: author.id,
        created_at,
    }).await?;
    Ok(post)
}

pub async fn vote_rows(pool: &SqlitePool, post_id: i64) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
