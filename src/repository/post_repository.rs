use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    domain::{GradeLevel, NewPost, Post, PostFilter, PostType, PostView, UpdatePostRequest},
    error::{AppError, Result},
    repository::{PostRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    post_type: String,
    grade_level: String,
    author_id: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_name: String,
    tally: i64,
}

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_post(row: PostRow) -> Result<Post> {
        Ok(Post {
            id: row.id,
            title: row.title,
            content: row.content,
            post_type: row.post_type.parse::<PostType>().map_err(AppError::Database)?,
            grade_level: row.grade_level.parse::<GradeLevel>().map_err(AppError::Database)?,
            author_id: row.author_id,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_view(row: PostViewRow) -> Result<PostView> {
        Ok(PostView {
            post: Self::row_to_post(row.post)?,
            author_name: row.author_name,
            tally: row.tally,
        })
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let created_at = post.created_at.naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO posts (
                title, content, post_type, grade_level, author_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.post_type.as_str())
        .bind(post.grade_level.as_str())
        .bind(post.author_id)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid()).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created post".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, post_type, grade_level, author_id, created_at, updated_at
            FROM posts
            WHERE id = ?
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_post).transpose()
    }

    async fn list_visible(
        &self,
        grades: Option<&[GradeLevel]>,
        filter: &PostFilter,
    ) -> Result<Vec<PostView>> {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = filter.offset.unwrap_or(0).max(0);

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT p.id, p.title, p.content, p.post_type, p.grade_level, p.author_id,
                   p.created_at, p.updated_at,
                   u.first_name || ' ' || u.last_name AS author_name,
                   COALESCE((SELECT SUM(v.value) FROM votes v WHERE v.post_id = p.id), 0) AS tally
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE 1 = 1
            "#,
        );

        if let Some(grades) = grades {
            query.push(" AND p.grade_level IN (");
            let mut separated = query.separated(", ");
            for grade in grades {
                separated.push_bind(grade.as_str());
            }
            separated.push_unseparated(")");
        }
        if let Some(grade_level) = filter.grade_level {
            query.push(" AND p.grade_level = ").push_bind(grade_level.as_str());
        }
        if let Some(post_type) = filter.post_type {
            query.push(" AND p.post_type = ").push_bind(post_type.as_str());
        }

        query
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = query
            .build_query_as::<PostViewRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(Self::row_to_view)
            .collect()
    }

    async fn update(&self, id: i64, update: UpdatePostRequest) -> Result<Post> {
        let mut post = self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(post_type) = update.post_type {
            post.post_type = post_type;
        }
        if let Some(grade_level) = update.grade_level {
            post.grade_level = grade_level;
        }

        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, content = ?, post_type = ?, grade_level = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.post_type.as_str())
        .bind(post.grade_level.as_str())
        .bind(Utc::now().naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated post".to_string())
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // Votes and monthly winner rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        Ok(())
    }
}
