mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::*;
use school_forum::{
    config::{ForumConfig, Settings, WinnerTrigger},
    domain::{GradeLevel, Period, Role},
    error::AppError,
    policy::{Actor, Policy},
    repository::{SqlitePostRepository, SqliteWinnerRepository},
    service::{winner_service::WinnerService, ServiceContext},
};

fn march_2024() -> Period {
    Period::new(2024, 3).unwrap()
}

async fn upvote(ctx: &ServiceContext, voters: &[Actor], post_id: i64) -> anyhow::Result<()> {
    for voter in voters {
        ctx.vote_service.cast_vote(voter, post_id, 1).await?;
    }
    Ok(())
}

async fn voters(ctx: &ServiceContext, count: usize) -> anyhow::Result<Vec<Actor>> {
    let mut voters = Vec::with_capacity(count);
    for i in 0..count {
        voters.push(actor(ctx, &format!("voter{i}"), Role::Student, GradeLevel::All).await?);
    }
    Ok(voters)
}

#[tokio::test]
async fn equal_tallies_go_to_the_lower_post_id() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 2).await?;

    let first = post_at(&ctx, &admin, "First", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap()).await?;
    let second = post_at(&ctx, &admin, "Second", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()).await?;
    assert!(first.id < second.id);

    upvote(&ctx, &voters, first.id).await?;
    upvote(&ctx, &voters, second.id).await?;

    let outcome = ctx.winner_service.compute_winner(&admin, march_2024()).await?.expect("winner");
    assert_eq!(outcome.post.id, first.id);
    assert_eq!(outcome.vote_count, 2);
    assert!(outcome.locked);

    Ok(())
}

#[tokio::test]
async fn highest_tally_wins_and_other_months_are_ignored() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 3).await?;

    let early = post_at(&ctx, &admin, "Early", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()).await?;
    let popular = post_at(&ctx, &admin, "Popular", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 0).unwrap()).await?;
    let april = post_at(&ctx, &admin, "April", GradeLevel::All, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()).await?;

    upvote(&ctx, &voters[..1], early.id).await?;
    upvote(&ctx, &voters[..2], popular.id).await?;
    upvote(&ctx, &voters, april.id).await?;

    let outcome = ctx.winner_service.compute_winner(&admin, march_2024()).await?.expect("winner");
    assert_eq!(outcome.post.id, popular.id);
    assert_eq!(outcome.vote_count, 2);

    Ok(())
}

#[tokio::test]
async fn recomputing_unchanged_data_is_deterministic() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 1).await?;
    let now = Utc::now();
    let period = Period::containing(now);

    let a = post_at(&ctx, &admin, "A", GradeLevel::All, now).await?;
    post_at(&ctx, &admin, "B", GradeLevel::All, now).await?;
    upvote(&ctx, &voters, a.id).await?;

    let first = ctx.winner_service.compute_winner(&admin, period).await?.expect("winner");
    let second = ctx.winner_service.compute_winner(&admin, period).await?.expect("winner");
    assert_eq!(first.post.id, second.post.id);
    assert_eq!(first.post.id, a.id);
    assert!(!second.locked);

    Ok(())
}

#[tokio::test]
async fn open_period_is_recomputed_but_locked_period_is_frozen() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 3).await?;
    let now = Utc::now();

    // Open period: a later surge changes the winner
    let a = post_at(&ctx, &admin, "A", GradeLevel::All, now).await?;
    let b = post_at(&ctx, &admin, "B", GradeLevel::All, now).await?;
    upvote(&ctx, &voters[..1], a.id).await?;
    let before = ctx.winner_service.compute_winner(&admin, Period::containing(now)).await?.expect("winner");
    assert_eq!(before.post.id, a.id);

    upvote(&ctx, &voters, b.id).await?;
    let after = ctx.winner_service.compute_winner(&admin, Period::containing(now)).await?.expect("winner");
    assert_eq!(after.post.id, b.id);
    assert_eq!(after.vote_count, 3);

    // Locked period: late votes do not move the recorded winner
    let old_a = post_at(&ctx, &admin, "Old A", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()).await?;
    let old_b = post_at(&ctx, &admin, "Old B", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap()).await?;
    upvote(&ctx, &voters[..1], old_a.id).await?;
    let locked = ctx.winner_service.compute_winner(&admin, march_2024()).await?.expect("winner");
    assert_eq!(locked.post.id, old_a.id);

    upvote(&ctx, &voters, old_b.id).await?;
    let again = ctx.winner_service.compute_winner(&admin, march_2024()).await?.expect("winner");
    assert_eq!(again.post.id, old_a.id);
    assert_eq!(again.vote_count, 1);
    assert_eq!(again.computed_at, locked.computed_at);

    Ok(())
}

#[tokio::test]
async fn get_winner_computes_lazily_and_reports_empty_periods() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let post = post_at(&ctx, &admin, "Only", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()).await?;

    assert!(ctx.winner_repo.find_by_period(&march_2024()).await?.is_none());
    let outcome = ctx.winner_service.get_winner(&admin, march_2024()).await?;
    assert_eq!(outcome.post.id, post.id);
    assert_eq!(outcome.vote_count, 0);
    assert!(ctx.winner_repo.find_by_period(&march_2024()).await?.is_some());

    let empty = Period::new(2023, 1)?;
    assert!(ctx.winner_service.compute_winner(&admin, empty).await?.is_none());
    let missing = ctx.winner_service.get_winner(&admin, empty).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn get_winner_follows_an_overtaking_post_in_the_current_month() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 3).await?;
    let now = Utc::now();
    let period = Period::containing(now);

    let a = post_at(&ctx, &admin, "A", GradeLevel::All, now).await?;
    let b = post_at(&ctx, &admin, "B", GradeLevel::All, now).await?;

    upvote(&ctx, &voters[..1], a.id).await?;
    let leading = ctx.winner_service.get_winner(&admin, period).await?;
    assert_eq!(leading.post.id, a.id);
    assert!(!leading.locked);

    upvote(&ctx, &voters, b.id).await?;
    let overtaken = ctx.winner_service.get_winner(&admin, period).await?;
    assert_eq!(overtaken.post.id, b.id);
    assert_eq!(overtaken.vote_count, 3);

    let computed = ctx.winner_service.compute_winner(&admin, period).await?.expect("winner");
    assert_eq!(computed.post.id, b.id);

    Ok(())
}

#[tokio::test]
async fn snapshot_taken_before_month_end_is_replaced_once_locked() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let voters = voters(&ctx, 2).await?;

    let early = post_at(&ctx, &admin, "Early", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap()).await?;
    let late = post_at(&ctx, &admin, "Late", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 25, 0, 0, 0).unwrap()).await?;
    upvote(&ctx, &voters[..1], early.id).await?;
    upvote(&ctx, &voters, late.id).await?;

    // Stored mid-month, before the late post pulled ahead
    sqlx::query("INSERT INTO monthly_winners (period, post_id, vote_count, computed_at) VALUES (?, ?, ?, ?)")
        .bind(march_2024().to_string())
        .bind(early.id)
        .bind(1_i64)
        .bind(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap().naive_utc())
        .execute(&ctx.db_pool)
        .await?;
    let stale = ctx.winner_repo.find_by_period(&march_2024()).await?.expect("snapshot");
    assert!(!stale.is_final());

    let outcome = ctx.winner_service.get_winner(&admin, march_2024()).await?;
    assert_eq!(outcome.post.id, late.id);
    assert_eq!(outcome.vote_count, 2);
    assert!(outcome.locked);

    let stored = ctx.winner_repo.find_by_period(&march_2024()).await?.expect("winner");
    assert!(stored.is_final());
    assert_eq!(stored.post_id, late.id);

    Ok(())
}

#[tokio::test]
async fn precomputed_trigger_requires_explicit_computation() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.forum.winner_trigger = WinnerTrigger::Precomputed;
    let ctx = test_context_with(settings).await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    post_at(&ctx, &admin, "Only", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()).await?;

    let before = ctx.winner_service.get_winner(&admin, march_2024()).await;
    assert!(matches!(before, Err(AppError::NotFound(_))));

    ctx.winner_service.compute_winner(&admin, march_2024()).await?;
    assert!(ctx.winner_service.get_winner(&admin, march_2024()).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn only_admins_see_monthly_winners() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let teacher = actor(&ctx, "teacher", Role::Teacher, GradeLevel::Middle).await?;

    let result = ctx.winner_service.get_winner(&teacher, march_2024()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn locked_winner_blocks_deletion_unless_enabled() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let winner = post_at(&ctx, &admin, "Winner", GradeLevel::All, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()).await?;
    ctx.winner_service.compute_winner(&admin, march_2024()).await?;

    let blocked = ctx.post_service.delete_post(&admin, winner.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));
    assert!(ctx.post_repo.find_by_id(winner.id).await?.is_some());

    // Same data, with the toggle on
    let permissive = school_forum::service::post_service::PostService::new(
        Arc::new(SqlitePostRepository::new(ctx.db_pool.clone())),
        Arc::new(SqliteWinnerRepository::new(ctx.db_pool.clone())),
        Policy::from(&ForumConfig::default()),
        true,
    );
    permissive.delete_post(&admin, winner.id).await?;
    assert!(ctx.winner_repo.find_by_period(&march_2024()).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn deleting_an_open_period_winner_clears_the_record() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let admin = actor(&ctx, "admin", Role::Admin, GradeLevel::All).await?;
    let now = Utc::now();
    let period = Period::containing(now);
    let post = post_at(&ctx, &admin, "Current", GradeLevel::All, now).await?;

    ctx.winner_service.compute_winner(&admin, period).await?;
    assert_eq!(ctx.winner_repo.find_by_post(post.id).await?.len(), 1);

    ctx.post_service.delete_post(&admin, post.id).await?;
    assert!(ctx.winner_repo.find_by_period(&period).await?.is_none());

    // A separate winner service over the same pool agrees
    let service = WinnerService::new(
        Arc::new(SqliteWinnerRepository::new(ctx.db_pool.clone())),
        Arc::new(SqlitePostRepository::new(ctx.db_pool.clone())),
        Policy::default(),
        WinnerTrigger::Lazy,
    );
    assert!(service.compute_winner(&admin, period).await?.is_none());

    Ok(())
}
