use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use crate::{
    domain::{MonthlyWinner, Period},
    error::{AppError, Result},
    repository::WinnerRepository,
};

#[derive(FromRow)]
struct WinnerRow {
    id: i64,
    period: String,
    post_id: i64,
    vote_count: i64,
    computed_at: NaiveDateTime,
}

pub struct SqliteWinnerRepository {
    pool: SqlitePool,
}

impl SqliteWinnerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_winner(row: WinnerRow) -> Result<MonthlyWinner> {
        Ok(MonthlyWinner {
            id: row.id,
            period: row.period.parse::<Period>()
                .map_err(|e| AppError::Database(e.to_string()))?,
            post_id: row.post_id,
            vote_count: row.vote_count,
            computed_at: DateTime::from_naive_utc_and_offset(row.computed_at, Utc),
        })
    }

    async fn fetch_in(
        tx: &mut Transaction<'_, Sqlite>,
        period: &Period,
    ) -> Result<Option<MonthlyWinner>> {
        let row = sqlx::query_as::<_, WinnerRow>(
            "SELECT id, period, post_id, vote_count, computed_at FROM monthly_winners WHERE period = ?"
        )
        .bind(period.to_string())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_winner).transpose()
    }
}

#[async_trait]
impl WinnerRepository for SqliteWinnerRepository {
    async fn find_by_period(&self, period: &Period) -> Result<Option<MonthlyWinner>> {
        let row = sqlx::query_as::<_, WinnerRow>(
            "SELECT id, period, post_id, vote_count, computed_at FROM monthly_winners WHERE period = ?"
        )
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_winner).transpose()
    }

    async fn find_by_post(&self, post_id: i64) -> Result<Vec<MonthlyWinner>> {
        let rows = sqlx::query_as::<_, WinnerRow>(
            r#"
            SELECT id, period, post_id, vote_count, computed_at
            FROM monthly_winners
            WHERE post_id = ?
            ORDER BY period
            "#
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_winner)
            .collect()
    }

    async fn compute(&self, period: &Period) -> Result<Option<MonthlyWinner>> {
        let mut tx = self.pool.begin().await?;

        // A row written after the month closed is final; anything earlier is a
        // mid-month snapshot and gets recomputed.
        if let Some(existing) = Self::fetch_in(&mut tx, period).await? {
            if existing.is_final() {
                tx.commit().await?;
                return Ok(Some(existing));
            }
        }

        // Highest tally wins; equal tallies go to the lowest (earliest) post id.
        let leader = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT p.id, COALESCE(SUM(v.value), 0) AS tally
            FROM posts p
            LEFT JOIN votes v ON v.post_id = p.id
            WHERE p.created_at >= ? AND p.created_at < ?
            GROUP BY p.id
            ORDER BY tally DESC, p.id ASC
            LIMIT 1
            "#
        )
        .bind(period.start())
        .bind(period.end())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((post_id, vote_count)) = leader else {
            tx.commit().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO monthly_winners (period, post_id, vote_count, computed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(period) DO UPDATE SET
                post_id = excluded.post_id,
                vote_count = excluded.vote_count,
                computed_at = excluded.computed_at
            "#
        )
        .bind(period.to_string())
        .bind(post_id)
        .bind(vote_count)
        .bind(Utc::now().naive_utc())
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_in(&mut tx, period).await?;
        tx.commit().await?;

        tracing::info!(period = %period, post_id, vote_count, "Monthly winner stored");

        stored
            .ok_or_else(|| AppError::Database("Failed to retrieve stored monthly winner".to_string()))
            .map(Some)
    }
}
