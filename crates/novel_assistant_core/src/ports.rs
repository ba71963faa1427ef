//! crates/novel_assistant_core/src/ports.rs
//!
//! The traits the narrative core talks through: one repository per entity and
//! the text-generation service. The SQLite and chat-completion adapters live in
//! the studio service.

use crate::domain::{
    Chapter, ChapterId, ChapterQuery, ChapterUpdate, ChapterVersion, Character, CharacterId,
    CharacterRelationship, CharacterUpdate, Extraction, GenerationContext, NewChapter,
    NewCharacter, NewNovel, NewRelationship, Novel, NovelId, NovelRelationship, NovelUpdate,
    OutlineTarget, Relationship, RelationshipId, RelationshipTypeEntry, RelationshipUpdate,
    VersionId,
};
use async_trait::async_trait;
use std::sync::Arc;

//=========================================================================================
// Errors
//=========================================================================================

/// How a port call failed. Adapters translate their driver errors into these
/// variants, and the HTTP layer picks a status code from them.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("Generation service failed: {0}")]
    Upstream(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Repository Ports
//=========================================================================================

#[async_trait]
pub trait NovelRepository: Send + Sync {
    async fn create(&self, novel: NewNovel) -> PortResult<Novel>;

    async fn get(&self, novel_id: NovelId) -> PortResult<Novel>;

    async fn find_by_title(&self, title: &str) -> PortResult<Option<Novel>>;

    /// All novels, most recently created first.
    async fn list_all(&self) -> PortResult<Vec<Novel>>;

    async fn update(&self, novel_id: NovelId, update: NovelUpdate) -> PortResult<Novel>;

    /// Removes the novel together with its chapters, versions, characters and
    /// relationships.
    async fn delete(&self, novel_id: NovelId) -> PortResult<()>;
}

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Creates the chapter and its initial version.
    async fn create(&self, chapter: NewChapter) -> PortResult<Chapter>;

    async fn get(&self, chapter_id: ChapterId) -> PortResult<Chapter>;

    async fn find_by_number(
        &self,
        novel_id: NovelId,
        chapter_number: i64,
    ) -> PortResult<Option<Chapter>>;

    /// Chapters of a novel in ascending chapter order.
    async fn list_by_novel(&self, novel_id: NovelId, query: ChapterQuery)
        -> PortResult<Vec<Chapter>>;

    async fn next_chapter_number(&self, novel_id: NovelId) -> PortResult<i64>;

    /// Applies the update. A new `content` is written only after the old one
    /// has been stored as a version.
    async fn update(&self, chapter_id: ChapterId, update: ChapterUpdate) -> PortResult<Chapter>;

    async fn delete(&self, chapter_id: ChapterId) -> PortResult<()>;

    /// Version history, newest first.
    async fn versions(&self, chapter_id: ChapterId) -> PortResult<Vec<ChapterVersion>>;

    async fn restore_version(&self, version_id: VersionId) -> PortResult<Chapter>;
}

#[async_trait]
pub trait CharacterRepository: Send + Sync {
    async fn create(&self, character: NewCharacter) -> PortResult<Character>;

    async fn get(&self, character_id: CharacterId) -> PortResult<Character>;

    async fn find_by_name(&self, novel_id: NovelId, name: &str) -> PortResult<Option<Character>>;

    async fn list_by_novel(&self, novel_id: NovelId) -> PortResult<Vec<Character>>;

    async fn update(
        &self,
        character_id: CharacterId,
        update: CharacterUpdate,
    ) -> PortResult<Character>;

    /// Removes the character and every relationship it takes part in.
    async fn delete(&self, character_id: CharacterId) -> PortResult<()>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    async fn create(&self, relationship: NewRelationship) -> PortResult<Relationship>;

    async fn get(&self, relationship_id: RelationshipId) -> PortResult<Relationship>;

    async fn update(
        &self,
        relationship_id: RelationshipId,
        update: RelationshipUpdate,
    ) -> PortResult<Relationship>;

    async fn delete(&self, relationship_id: RelationshipId) -> PortResult<()>;

    /// Relationships touching a character, with that character in the `self` position.
    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> PortResult<Vec<CharacterRelationship>>;

    async fn list_by_novel(&self, novel_id: NovelId) -> PortResult<Vec<NovelRelationship>>;

    async fn relationship_types(&self) -> PortResult<Vec<RelationshipTypeEntry>>;
}

/// The full set of repositories, shared by the context assembler and the
/// orchestrator.
#[derive(Clone)]
pub struct Repositories {
    pub novels: Arc<dyn NovelRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub characters: Arc<dyn CharacterRepository>,
    pub relationships: Arc<dyn RelationshipRepository>,
}

//=========================================================================================
// Generation Port
//=========================================================================================

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Writes new story text following `instruction`, informed by the context.
    async fn generate(&self, instruction: &str, context: &GenerationContext) -> PortResult<String>;

    /// Summarizes a passage, keeping the key plot points.
    async fn summarize(&self, text: &str) -> PortResult<String>;

    async fn outline(&self, target: &OutlineTarget) -> PortResult<String>;

    /// Sends a prompt as-is and returns the completion.
    async fn complete(&self, prompt: &str) -> PortResult<String>;

    /// Recognizes the characters introduced or mentioned in a passage.
    async fn extract_characters(&self, text: &str) -> PortResult<Extraction>;
}
