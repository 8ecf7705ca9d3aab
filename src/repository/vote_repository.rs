use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::{Tally, Vote, VoteValue},
    error::{AppError, Result},
    repository::VoteRepository,
};

#[derive(FromRow)]
struct VoteRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    value: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TallyRow {
    score: i64,
    upvotes: i64,
    downvotes: i64,
}

pub struct SqliteVoteRepository {
    pool: SqlitePool,
}

impl SqliteVoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_vote(row: VoteRow) -> Vote {
        Vote {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            value: row.value,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        }
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepository {
    async fn upsert(&self, post_id: i64, user_id: i64, value: VoteValue) -> Result<Vote> {
        let now = Utc::now().naive_utc();

        // The UNIQUE(post_id, user_id) constraint turns a concurrent second insert
        // into an update instead of a duplicate row.
        sqlx::query(
            r#"
            INSERT INTO votes (post_id, user_id, value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(post_id, user_id) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#
        )
        .bind(post_id)
        .bind(user_id)
        .bind(value.as_i64())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find(post_id, user_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve stored vote".to_string())
        })
    }

    async fn find(&self, post_id: i64, user_id: i64) -> Result<Option<Vote>> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, post_id, user_id, value, created_at, updated_at
            FROM votes
            WHERE post_id = ? AND user_id = ?
            "#
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::row_to_vote))
    }

    async fn delete(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM votes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn tally(&self, post_id: i64) -> Result<Tally> {
        let row = sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT COALESCE(SUM(value), 0) AS score,
                   COALESCE(SUM(CASE WHEN value > 0 THEN 1 ELSE 0 END), 0) AS upvotes,
                   COALESCE(SUM(CASE WHEN value < 0 THEN 1 ELSE 0 END), 0) AS downvotes
            FROM votes
            WHERE post_id = ?
            "#
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Tally {
            post_id,
            score: row.score,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
        })
    }
}
