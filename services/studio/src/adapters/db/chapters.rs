//! services/studio/src/adapters/db/chapters.rs
//!
//! SQLite implementation of the `ChapterRepository` port, including the
//! chapter version history.

use super::{ensure_novel, now, storage_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use novel_assistant_core::domain::{
    Chapter, ChapterId, ChapterQuery, ChapterUpdate, ChapterVersion, NewChapter, NovelId,
    VersionId, AUTO_SAVE_COMMENT, INITIAL_VERSION_COMMENT,
};
use novel_assistant_core::ports::{ChapterRepository, PortError, PortResult};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::info;

const CHAPTER_COLUMNS: &str =
    "id, novel_id, chapter_number, title, content, summary, outline, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteChapterRepository {
    pool: SqlitePool,
}

impl SqliteChapterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

//=========================================================================================
// Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ChapterRecord {
    id: i64,
    novel_id: i64,
    chapter_number: i64,
    title: String,
    content: String,
    summary: String,
    outline: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChapterRecord {
    fn to_domain(self) -> Chapter {
        Chapter {
            id: self.id,
            novel_id: self.novel_id,
            chapter_number: self.chapter_number,
            title: self.title,
            content: self.content,
            summary: self.summary,
            outline: self.outline,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct VersionRecord {
    id: i64,
    chapter_id: i64,
    content: String,
    comment: String,
    created_at: DateTime<Utc>,
}

impl VersionRecord {
    fn to_domain(self) -> ChapterVersion {
        ChapterVersion {
            id: self.id,
            chapter_id: self.chapter_id,
            content: self.content,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// Connection-level Helpers
//=========================================================================================

async fn fetch_chapter(conn: &mut SqliteConnection, chapter_id: ChapterId) -> PortResult<Chapter> {
    sqlx::query_as::<_, ChapterRecord>(&format!(
        "SELECT {} FROM chapters WHERE id = ?",
        CHAPTER_COLUMNS
    ))
    .bind(chapter_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage_error)?
    .map(ChapterRecord::to_domain)
    .ok_or_else(|| PortError::NotFound(format!("Chapter {} not found", chapter_id)))
}

async fn insert_version(
    conn: &mut SqliteConnection,
    chapter_id: ChapterId,
    content: &str,
    comment: &str,
) -> PortResult<()> {
    sqlx::query(
        "INSERT INTO chapter_versions (chapter_id, content, comment, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(chapter_id)
    .bind(content)
    .bind(comment)
    .bind(now())
    .execute(&mut *conn)
    .await
    .map_err(storage_error)?;
    Ok(())
}

//=========================================================================================
// `ChapterRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChapterRepository for SqliteChapterRepository {
    async fn create(&self, chapter: NewChapter) -> PortResult<Chapter> {
        if chapter.chapter_number < 1 {
            return Err(PortError::ConstraintViolation(format!(
                "Chapter number must be at least 1, got {}",
                chapter.chapter_number
            )));
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        ensure_novel(&mut *tx, chapter.novel_id).await?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM chapters WHERE novel_id = ? AND chapter_number = ?",
        )
        .bind(chapter.novel_id)
        .bind(chapter.chapter_number)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;
        if taken.is_some() {
            return Err(PortError::ConstraintViolation(format!(
                "Chapter number {} already exists",
                chapter.chapter_number
            )));
        }

        let timestamp = now();
        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "INSERT INTO chapters (novel_id, chapter_number, title, content, summary, outline, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            CHAPTER_COLUMNS
        ))
        .bind(chapter.novel_id)
        .bind(chapter.chapter_number)
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(&chapter.summary)
        .bind(&chapter.outline)
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        insert_version(&mut *tx, record.id, &record.content, INITIAL_VERSION_COMMENT).await?;
        tx.commit().await.map_err(storage_error)?;

        info!(
            chapter_id = record.id,
            novel_id = record.novel_id,
            chapter_number = record.chapter_number,
            "Created chapter"
        );
        Ok(record.to_domain())
    }

    async fn get(&self, chapter_id: ChapterId) -> PortResult<Chapter> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        fetch_chapter(&mut *conn, chapter_id).await
    }

    async fn find_by_number(
        &self,
        novel_id: NovelId,
        chapter_number: i64,
    ) -> PortResult<Option<Chapter>> {
        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? AND chapter_number = ?",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id)
        .bind(chapter_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(record.map(ChapterRecord::to_domain))
    }

    async fn list_by_novel(
        &self,
        novel_id: NovelId,
        query: ChapterQuery,
    ) -> PortResult<Vec<Chapter>> {
        // Newest first so LIMIT keeps the chapters nearest the cut-off; a
        // negative LIMIT means no limit in SQLite.
        let records = sqlx::query_as::<_, ChapterRecord>(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ?1 AND (?2 IS NULL OR chapter_number < ?2) \
             ORDER BY chapter_number DESC LIMIT ?3",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id)
        .bind(query.before_chapter)
        .bind(query.limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut chapters: Vec<Chapter> = records.into_iter().map(ChapterRecord::to_domain).collect();
        chapters.reverse();
        Ok(chapters)
    }

    async fn next_chapter_number(&self, novel_id: NovelId) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(chapter_number), 0) + 1 FROM chapters WHERE novel_id = ?",
        )
        .bind(novel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn update(&self, chapter_id: ChapterId, update: ChapterUpdate) -> PortResult<Chapter> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let current = fetch_chapter(&mut *tx, chapter_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        if update.content.is_some() {
            insert_version(&mut *tx, chapter_id, &current.content, AUTO_SAVE_COMMENT).await?;
        }

        let record = sqlx::query_as::<_, ChapterRecord>(&format!(
            "UPDATE chapters SET title = ?, content = ?, summary = ?, outline = ?, updated_at = ? \
             WHERE id = ? RETURNING {}",
            CHAPTER_COLUMNS
        ))
        .bind(update.title.unwrap_or(current.title))
        .bind(update.content.unwrap_or(current.content))
        .bind(update.summary.unwrap_or(current.summary))
        .bind(update.outline.unwrap_or(current.outline))
        .bind(now())
        .bind(chapter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(chapter_id, "Updated chapter");
        Ok(record.to_domain())
    }

    async fn delete(&self, chapter_id: ChapterId) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        fetch_chapter(&mut *tx, chapter_id).await?;

        let statements = [
            "DELETE FROM chapter_versions WHERE chapter_id = ?",
            "UPDATE characters SET first_appearance = NULL WHERE first_appearance = ?",
            "UPDATE character_relationships SET start_chapter = NULL WHERE start_chapter = ?",
            "DELETE FROM chapters WHERE id = ?",
        ];
        for statement in statements {
            sqlx::query(statement)
                .bind(chapter_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        info!(chapter_id, "Deleted chapter and its versions");
        Ok(())
    }

    async fn versions(&self, chapter_id: ChapterId) -> PortResult<Vec<ChapterVersion>> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        fetch_chapter(&mut *conn, chapter_id).await?;

        let records = sqlx::query_as::<_, VersionRecord>(
            "SELECT id, chapter_id, content, comment, created_at FROM chapter_versions \
             WHERE chapter_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(chapter_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_error)?;

        Ok(records.into_iter().map(VersionRecord::to_domain).collect())
    }

    async fn restore_version(&self, version_id: VersionId) -> PortResult<Chapter> {
        let version = sqlx::query_as::<_, VersionRecord>(
            "SELECT id, chapter_id, content, comment, created_at FROM chapter_versions WHERE id = ?",
        )
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| PortError::NotFound(format!("Version {} not found", version_id)))?;

        let chapter = self
            .update(
                version.chapter_id,
                ChapterUpdate {
                    content: Some(version.content),
                    ..ChapterUpdate::default()
                },
            )
            .await?;
        info!(version_id, chapter_id = chapter.id, "Restored chapter version");
        Ok(chapter)
    }
}
