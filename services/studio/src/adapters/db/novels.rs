//! services/studio/src/adapters/db/novels.rs
//!
//! SQLite implementation of the `NovelRepository` port.

use super::{ensure_novel, now, storage_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use novel_assistant_core::domain::{NewNovel, Novel, NovelId, NovelUpdate};
use novel_assistant_core::ports::{NovelRepository, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

const NOVEL_COLUMNS: &str = "id, title, outline, current_chapter, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteNovelRepository {
    pool: SqlitePool,
}

impl SqliteNovelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn title_taken(&self, title: &str, except: Option<NovelId>) -> PortResult<bool> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT id FROM novels WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(matches!(owner, Some(id) if Some(id) != except))
    }
}

#[derive(FromRow)]
struct NovelRecord {
    id: i64,
    title: String,
    outline: String,
    current_chapter: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NovelRecord {
    fn to_domain(self) -> Novel {
        Novel {
            id: self.id,
            title: self.title,
            outline: self.outline,
            current_chapter: self.current_chapter,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[async_trait]
impl NovelRepository for SqliteNovelRepository {
    async fn create(&self, novel: NewNovel) -> PortResult<Novel> {
        let title = novel.title.trim();
        if title.is_empty() {
            return Err(PortError::ConstraintViolation(
                "Novel title must not be empty".to_string(),
            ));
        }
        if self.title_taken(title, None).await? {
            return Err(PortError::ConstraintViolation(format!(
                "A novel titled '{}' already exists",
                title
            )));
        }

        let timestamp = now();
        let record = sqlx::query_as::<_, NovelRecord>(&format!(
            "INSERT INTO novels (title, outline, current_chapter, created_at, updated_at) \
             VALUES (?, ?, 1, ?, ?) RETURNING {}",
            NOVEL_COLUMNS
        ))
        .bind(title)
        .bind(&novel.outline)
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        info!(novel_id = record.id, title = %record.title, "Created novel");
        Ok(record.to_domain())
    }

    async fn get(&self, novel_id: NovelId) -> PortResult<Novel> {
        sqlx::query_as::<_, NovelRecord>(&format!(
            "SELECT {} FROM novels WHERE id = ?",
            NOVEL_COLUMNS
        ))
        .bind(novel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .map(NovelRecord::to_domain)
        .ok_or_else(|| PortError::NotFound(format!("Novel {} not found", novel_id)))
    }

    async fn find_by_title(&self, title: &str) -> PortResult<Option<Novel>> {
        let record = sqlx::query_as::<_, NovelRecord>(&format!(
            "SELECT {} FROM novels WHERE title = ?",
            NOVEL_COLUMNS
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(record.map(NovelRecord::to_domain))
    }

    async fn list_all(&self) -> PortResult<Vec<Novel>> {
        let records = sqlx::query_as::<_, NovelRecord>(&format!(
            "SELECT {} FROM novels ORDER BY id DESC",
            NOVEL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(records.into_iter().map(NovelRecord::to_domain).collect())
    }

    async fn update(&self, novel_id: NovelId, update: NovelUpdate) -> PortResult<Novel> {
        let current = self.get(novel_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let title = match update.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(PortError::ConstraintViolation(
                        "Novel title must not be empty".to_string(),
                    ));
                }
                if self.title_taken(&title, Some(novel_id)).await? {
                    return Err(PortError::ConstraintViolation(format!(
                        "A novel titled '{}' already exists",
                        title
                    )));
                }
                title
            }
            None => current.title,
        };

        let current_chapter = update.current_chapter.unwrap_or(current.current_chapter);
        if current_chapter < 1 {
            return Err(PortError::ConstraintViolation(format!(
                "Current chapter must be at least 1, got {}",
                current_chapter
            )));
        }

        let record = sqlx::query_as::<_, NovelRecord>(&format!(
            "UPDATE novels SET title = ?, outline = ?, current_chapter = ?, updated_at = ? \
             WHERE id = ? RETURNING {}",
            NOVEL_COLUMNS
        ))
        .bind(&title)
        .bind(update.outline.unwrap_or(current.outline))
        .bind(current_chapter)
        .bind(now())
        .bind(novel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        info!(novel_id, "Updated novel");
        Ok(record.to_domain())
    }

    async fn delete(&self, novel_id: NovelId) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        ensure_novel(&mut *tx, novel_id).await?;

        let statements = [
            "DELETE FROM chapter_versions WHERE chapter_id IN \
             (SELECT id FROM chapters WHERE novel_id = ?)",
            "DELETE FROM character_relationships WHERE novel_id = ?",
            "DELETE FROM characters WHERE novel_id = ?",
            "DELETE FROM chapters WHERE novel_id = ?",
            "DELETE FROM novels WHERE id = ?",
        ];
        for statement in statements {
            sqlx::query(statement)
                .bind(novel_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        info!(novel_id, "Deleted novel with its chapters and characters");
        Ok(())
    }
}
