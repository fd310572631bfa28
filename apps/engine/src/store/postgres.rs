//! PostgreSQL chapter store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::store::ChapterStore;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Chapter store over the application's `chapters` table. The write replaces
/// the whole body column — last-write-wins, matching the remote model.
pub struct PgChapterStore {
    pool: PgPool,
}

impl PgChapterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChapterStore for PgChapterStore {
    async fn replace_body(&self, chapter_id: Uuid, body: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET body = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(chapter_id)
        .bind(body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("chapter {chapter_id} does not exist");
        }
        Ok(())
    }

    async fn load_body(&self, chapter_id: Uuid) -> Result<Option<String>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM chapters WHERE id = $1")
                .bind(chapter_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(body)
    }
}
