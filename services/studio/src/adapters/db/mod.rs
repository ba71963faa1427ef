//! services/studio/src/adapters/db/mod.rs
//!
//! The SQLite storage gateway. A single pool is opened at startup and shared by
//! every repository; statements that must happen together run in one
//! transaction.

mod chapters;
mod characters;
mod novels;
mod relationships;

pub use chapters::SqliteChapterRepository;
pub use characters::SqliteCharacterRepository;
pub use novels::SqliteNovelRepository;
pub use relationships::SqliteRelationshipRepository;

use chrono::{DateTime, Utc};
use novel_assistant_core::domain::{ChapterId, NovelId};
use novel_assistant_core::ports::{PortError, PortResult, Repositories};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

//=========================================================================================
// The Storage Gateway
//=========================================================================================

/// Owns the connection pool and hands out the repository adapters.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database file behind `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// A private in-memory database. The pool is pinned to one connection that
    /// never expires, since every new connection would see an empty database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations, which also seed the relationship-type catalog.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            novels: Arc::new(SqliteNovelRepository::new(self.pool.clone())),
            chapters: Arc::new(SqliteChapterRepository::new(self.pool.clone())),
            characters: Arc::new(SqliteCharacterRepository::new(self.pool.clone())),
            relationships: Arc::new(SqliteRelationshipRepository::new(self.pool.clone())),
        }
    }
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Maps a driver error onto the port taxonomy. Unique and check constraint
/// failures become `ConstraintViolation`; everything else is a storage failure.
pub(crate) fn storage_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(e.to_string()),
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_check_violation()
                || db.is_foreign_key_violation() =>
        {
            PortError::ConstraintViolation(db.message().to_string())
        }
        _ => PortError::Storage(e.to_string()),
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) async fn ensure_novel(conn: &mut SqliteConnection, novel_id: NovelId) -> PortResult<()> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM novels WHERE id = ?")
        .bind(novel_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_error)?
        .map(|_| ())
        .ok_or_else(|| PortError::NotFound(format!("Novel {} not found", novel_id)))
}

/// Fails unless `chapter_id` is a chapter of `novel_id`.
pub(crate) async fn ensure_chapter_in_novel(
    conn: &mut SqliteConnection,
    novel_id: NovelId,
    chapter_id: ChapterId,
) -> PortResult<()> {
    let owner = sqlx::query_scalar::<_, i64>("SELECT novel_id FROM chapters WHERE id = ?")
        .bind(chapter_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_error)?;

    match owner {
        Some(owner) if owner == novel_id => Ok(()),
        Some(_) => Err(PortError::ConstraintViolation(format!(
            "Chapter {} belongs to another novel",
            chapter_id
        ))),
        None => Err(PortError::ConstraintViolation(format!(
            "Chapter {} does not exist",
            chapter_id
        ))),
    }
}
