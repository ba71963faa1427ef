//! services/studio/src/adapters/db/characters.rs
//!
//! SQLite implementation of the `CharacterRepository` port.

use super::{ensure_chapter_in_novel, ensure_novel, now, storage_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use novel_assistant_core::domain::{
    Character, CharacterId, CharacterStatus, CharacterUpdate, NewCharacter, NovelId, RoleType,
};
use novel_assistant_core::ports::{CharacterRepository, PortError, PortResult};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::info;

const CHARACTER_COLUMNS: &str = "id, novel_id, name, description, characteristics, role_type, \
     status, first_appearance, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteCharacterRepository {
    pool: SqlitePool,
}

impl SqliteCharacterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CharacterRecord {
    id: i64,
    novel_id: i64,
    name: String,
    description: String,
    characteristics: String,
    role_type: String,
    status: String,
    first_appearance: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CharacterRecord {
    // Labels written by older tools may not parse; they fall back to the defaults.
    fn to_domain(self) -> Character {
        Character {
            id: self.id,
            novel_id: self.novel_id,
            name: self.name,
            description: self.description,
            characteristics: self.characteristics,
            role_type: self.role_type.parse::<RoleType>().unwrap_or_default(),
            status: self.status.parse::<CharacterStatus>().unwrap_or_default(),
            first_appearance: self.first_appearance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

async fn fetch_character(
    conn: &mut SqliteConnection,
    character_id: CharacterId,
) -> PortResult<Character> {
    sqlx::query_as::<_, CharacterRecord>(&format!(
        "SELECT {} FROM characters WHERE id = ?",
        CHARACTER_COLUMNS
    ))
    .bind(character_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage_error)?
    .map(CharacterRecord::to_domain)
    .ok_or_else(|| PortError::NotFound(format!("Character {} not found", character_id)))
}

/// Rejects blank names and names already used by another character of the novel.
async fn check_name(
    conn: &mut SqliteConnection,
    novel_id: NovelId,
    name: &str,
    except: Option<CharacterId>,
) -> PortResult<()> {
    if name.is_empty() {
        return Err(PortError::ConstraintViolation(
            "Character name must not be empty".to_string(),
        ));
    }
    let owner = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM characters WHERE novel_id = ? AND name = ?",
    )
    .bind(novel_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage_error)?;

    match owner {
        Some(id) if Some(id) != except => Err(PortError::ConstraintViolation(format!(
            "A character named '{}' already exists in novel {}",
            name, novel_id
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl CharacterRepository for SqliteCharacterRepository {
    async fn create(&self, character: NewCharacter) -> PortResult<Character> {
        let name = character.name.trim();

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        ensure_novel(&mut *tx, character.novel_id).await?;
        check_name(&mut *tx, character.novel_id, name, None).await?;
        if let Some(chapter_id) = character.first_appearance {
            ensure_chapter_in_novel(&mut *tx, character.novel_id, chapter_id).await?;
        }

        let timestamp = now();
        let record = sqlx::query_as::<_, CharacterRecord>(&format!(
            "INSERT INTO characters (novel_id, name, description, characteristics, role_type, status, \
             first_appearance, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            CHARACTER_COLUMNS
        ))
        .bind(character.novel_id)
        .bind(name)
        .bind(&character.description)
        .bind(&character.characteristics)
        .bind(character.role_type.label())
        .bind(character.status.label())
        .bind(character.first_appearance)
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(character_id = record.id, name = %record.name, "Created character");
        Ok(record.to_domain())
    }

    async fn get(&self, character_id: CharacterId) -> PortResult<Character> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        fetch_character(&mut *conn, character_id).await
    }

    async fn find_by_name(&self, novel_id: NovelId, name: &str) -> PortResult<Option<Character>> {
        let record = sqlx::query_as::<_, CharacterRecord>(&format!(
            "SELECT {} FROM characters WHERE novel_id = ? AND name = ?",
            CHARACTER_COLUMNS
        ))
        .bind(novel_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(record.map(CharacterRecord::to_domain))
    }

    async fn list_by_novel(&self, novel_id: NovelId) -> PortResult<Vec<Character>> {
        let records = sqlx::query_as::<_, CharacterRecord>(&format!(
            "SELECT {} FROM characters WHERE novel_id = ? ORDER BY id",
            CHARACTER_COLUMNS
        ))
        .bind(novel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(records.into_iter().map(CharacterRecord::to_domain).collect())
    }

    async fn update(
        &self,
        character_id: CharacterId,
        update: CharacterUpdate,
    ) -> PortResult<Character> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let current = fetch_character(&mut *tx, character_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let name = match update.name {
            Some(name) => {
                let name = name.trim().to_string();
                check_name(&mut *tx, current.novel_id, &name, Some(character_id)).await?;
                name
            }
            None => current.name,
        };
        let first_appearance = update.first_appearance.unwrap_or(current.first_appearance);
        if let Some(chapter_id) = first_appearance {
            ensure_chapter_in_novel(&mut *tx, current.novel_id, chapter_id).await?;
        }

        let record = sqlx::query_as::<_, CharacterRecord>(&format!(
            "UPDATE characters SET name = ?, description = ?, characteristics = ?, role_type = ?, \
             status = ?, first_appearance = ?, updated_at = ? WHERE id = ? RETURNING {}",
            CHARACTER_COLUMNS
        ))
        .bind(&name)
        .bind(update.description.unwrap_or(current.description))
        .bind(update.characteristics.unwrap_or(current.characteristics))
        .bind(update.role_type.unwrap_or(current.role_type).label())
        .bind(update.status.unwrap_or(current.status).label())
        .bind(first_appearance)
        .bind(now())
        .bind(character_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(character_id, "Updated character");
        Ok(record.to_domain())
    }

    async fn delete(&self, character_id: CharacterId) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        fetch_character(&mut *tx, character_id).await?;

        let removed = sqlx::query(
            "DELETE FROM character_relationships WHERE character1_id = ?1 OR character2_id = ?1",
        )
        .bind(character_id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?
        .rows_affected();

        sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(character_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(character_id, relationships = removed, "Deleted character");
        Ok(())
    }
}
