//! services/studio/src/adapters/db/relationships.rs
//!
//! SQLite implementation of the `RelationshipRepository` port and the
//! read-only relationship-type catalog.

use super::{ensure_chapter_in_novel, now, storage_error};
use async_trait::async_trait;
use novel_assistant_core::domain::{
    CharacterId, CharacterRelationship, NewRelationship, NovelId, NovelRelationship, Relationship,
    RelationshipId, RelationshipTypeEntry, RelationshipUpdate,
};
use novel_assistant_core::ports::{PortError, PortResult, RelationshipRepository};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::info;

const RELATIONSHIP_COLUMNS: &str =
    "id, novel_id, character1_id, character2_id, relationship_type, description, start_chapter";

#[derive(Clone)]
pub struct SqliteRelationshipRepository {
    pool: SqlitePool,
}

impl SqliteRelationshipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

//=========================================================================================
// Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RelationshipRecord {
    id: i64,
    novel_id: i64,
    character1_id: i64,
    character2_id: i64,
    relationship_type: String,
    description: String,
    start_chapter: Option<i64>,
}

impl RelationshipRecord {
    fn to_domain(self) -> Relationship {
        Relationship {
            id: self.id,
            novel_id: self.novel_id,
            character1_id: self.character1_id,
            character2_id: self.character2_id,
            relationship_type: self.relationship_type,
            description: self.description,
            start_chapter: self.start_chapter,
        }
    }
}

#[derive(FromRow)]
struct EndpointRecord {
    id: i64,
    relationship_type: String,
    description: String,
    start_chapter: Option<i64>,
    character1_id: i64,
    character1_name: String,
    character2_id: i64,
    character2_name: String,
}

impl EndpointRecord {
    /// Orients the row so that `viewer` ends up in the `self` position.
    fn seen_from(self, viewer: CharacterId) -> CharacterRelationship {
        let ((self_id, self_name), (other_id, other_name)) = if self.character1_id == viewer {
            (
                (self.character1_id, self.character1_name),
                (self.character2_id, self.character2_name),
            )
        } else {
            (
                (self.character2_id, self.character2_name),
                (self.character1_id, self.character1_name),
            )
        };
        CharacterRelationship {
            id: self.id,
            relationship_type: self.relationship_type,
            description: self.description,
            start_chapter: self.start_chapter,
            self_id,
            self_name,
            other_id,
            other_name,
        }
    }
}

#[derive(FromRow)]
struct NovelRelationshipRecord {
    id: i64,
    character1_name: String,
    character2_name: String,
    relationship_type: String,
    description: String,
    start_chapter_number: Option<i64>,
}

#[derive(FromRow)]
struct RelationshipTypeRecord {
    id: i64,
    category: String,
    type_name: String,
    description: String,
}

//=========================================================================================
// Connection-level Helpers
//=========================================================================================

async fn fetch_relationship(
    conn: &mut SqliteConnection,
    relationship_id: RelationshipId,
) -> PortResult<Relationship> {
    sqlx::query_as::<_, RelationshipRecord>(&format!(
        "SELECT {} FROM character_relationships WHERE id = ?",
        RELATIONSHIP_COLUMNS
    ))
    .bind(relationship_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage_error)?
    .map(RelationshipRecord::to_domain)
    .ok_or_else(|| PortError::NotFound(format!("Relationship {} not found", relationship_id)))
}

/// Returns the novel a character belongs to.
async fn character_novel(
    conn: &mut SqliteConnection,
    character_id: CharacterId,
) -> PortResult<NovelId> {
    sqlx::query_scalar::<_, i64>("SELECT novel_id FROM characters WHERE id = ?")
        .bind(character_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| PortError::NotFound(format!("Character {} not found", character_id)))
}

//=========================================================================================
// `RelationshipRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl RelationshipRepository for SqliteRelationshipRepository {
    async fn create(&self, relationship: NewRelationship) -> PortResult<Relationship> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let first_novel = character_novel(&mut *tx, relationship.character1_id).await?;
        let second_novel = character_novel(&mut *tx, relationship.character2_id).await?;

        if relationship.character1_id == relationship.character2_id {
            return Err(PortError::ConstraintViolation(
                "A character cannot have a relationship with itself".to_string(),
            ));
        }
        if first_novel != relationship.novel_id || second_novel != relationship.novel_id {
            return Err(PortError::ConstraintViolation(format!(
                "Both characters must belong to novel {}",
                relationship.novel_id
            )));
        }
        if let Some(chapter_id) = relationship.start_chapter {
            ensure_chapter_in_novel(&mut *tx, relationship.novel_id, chapter_id).await?;
        }

        let timestamp = now();
        let record = sqlx::query_as::<_, RelationshipRecord>(&format!(
            "INSERT INTO character_relationships (novel_id, character1_id, character2_id, \
             relationship_type, description, start_chapter, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            RELATIONSHIP_COLUMNS
        ))
        .bind(relationship.novel_id)
        .bind(relationship.character1_id)
        .bind(relationship.character2_id)
        .bind(relationship.relationship_type.trim())
        .bind(&relationship.description)
        .bind(relationship.start_chapter)
        .bind(timestamp)
        .bind(timestamp)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(
            relationship_id = record.id,
            character1_id = record.character1_id,
            character2_id = record.character2_id,
            "Created relationship"
        );
        Ok(record.to_domain())
    }

    async fn get(&self, relationship_id: RelationshipId) -> PortResult<Relationship> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        fetch_relationship(&mut *conn, relationship_id).await
    }

    async fn update(
        &self,
        relationship_id: RelationshipId,
        update: RelationshipUpdate,
    ) -> PortResult<Relationship> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let current = fetch_relationship(&mut *tx, relationship_id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let start_chapter = update.start_chapter.unwrap_or(current.start_chapter);
        if let Some(chapter_id) = start_chapter {
            ensure_chapter_in_novel(&mut *tx, current.novel_id, chapter_id).await?;
        }
        let relationship_type = update
            .relationship_type
            .map(|kind| kind.trim().to_string())
            .unwrap_or(current.relationship_type);

        let record = sqlx::query_as::<_, RelationshipRecord>(&format!(
            "UPDATE character_relationships SET relationship_type = ?, description = ?, \
             start_chapter = ?, updated_at = ? WHERE id = ? RETURNING {}",
            RELATIONSHIP_COLUMNS
        ))
        .bind(&relationship_type)
        .bind(update.description.unwrap_or(current.description))
        .bind(start_chapter)
        .bind(now())
        .bind(relationship_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        info!(relationship_id, "Updated relationship");
        Ok(record.to_domain())
    }

    async fn delete(&self, relationship_id: RelationshipId) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM character_relationships WHERE id = ?")
            .bind(relationship_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Relationship {} not found",
                relationship_id
            )));
        }
        info!(relationship_id, "Deleted relationship");
        Ok(())
    }

    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> PortResult<Vec<CharacterRelationship>> {
        let mut conn = self.pool.acquire().await.map_err(storage_error)?;
        character_novel(&mut *conn, character_id).await?;

        let records = sqlx::query_as::<_, EndpointRecord>(
            "SELECT r.id, r.relationship_type, r.description, r.start_chapter, \
                    c1.id AS character1_id, c1.name AS character1_name, \
                    c2.id AS character2_id, c2.name AS character2_name \
             FROM character_relationships r \
             JOIN characters c1 ON c1.id = r.character1_id \
             JOIN characters c2 ON c2.id = r.character2_id \
             WHERE r.character1_id = ?1 OR r.character2_id = ?1 \
             ORDER BY r.id",
        )
        .bind(character_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_error)?;

        Ok(records
            .into_iter()
            .map(|record| record.seen_from(character_id))
            .collect())
    }

    async fn list_by_novel(&self, novel_id: NovelId) -> PortResult<Vec<NovelRelationship>> {
        let records = sqlx::query_as::<_, NovelRelationshipRecord>(
            "SELECT r.id, c1.name AS character1_name, c2.name AS character2_name, \
                    r.relationship_type, r.description, ch.chapter_number AS start_chapter_number \
             FROM character_relationships r \
             JOIN characters c1 ON c1.id = r.character1_id \
             JOIN characters c2 ON c2.id = r.character2_id \
             LEFT JOIN chapters ch ON ch.id = r.start_chapter \
             WHERE r.novel_id = ? \
             ORDER BY r.id",
        )
        .bind(novel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(records
            .into_iter()
            .map(|r| NovelRelationship {
                id: r.id,
                character1_name: r.character1_name,
                character2_name: r.character2_name,
                relationship_type: r.relationship_type,
                description: r.description,
                start_chapter_number: r.start_chapter_number,
            })
            .collect())
    }

    async fn relationship_types(&self) -> PortResult<Vec<RelationshipTypeEntry>> {
        let records = sqlx::query_as::<_, RelationshipTypeRecord>(
            "SELECT id, category, type AS type_name, description FROM relationship_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(records
            .into_iter()
            .map(|r| RelationshipTypeEntry {
                id: r.id,
                category: r.category,
                type_name: r.type_name,
                description: r.description,
            })
            .collect())
    }
}
