//! services/studio/src/web/dto.rs
//!
//! Request and response payloads of the REST API. The core types stay free of
//! serialization concerns; everything crossing the wire is converted here.

use chrono::{DateTime, Utc};
use novel_assistant_core::domain::{
    Chapter, ChapterVersion, Character, CharacterContext, CharacterProfile,
    CharacterRelationship, Novel, NovelContext, NovelRelationship, Relationship,
    RelationshipTypeEntry, RosterEntry,
};
use novel_assistant_core::workflow::{GenerationOutcome, SaveReport};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Novels
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NovelResponse {
    pub id: i64,
    pub title: String,
    pub outline: String,
    pub current_chapter: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Novel> for NovelResponse {
    fn from(novel: Novel) -> Self {
        Self {
            id: novel.id,
            title: novel.title,
            outline: novel.outline,
            current_chapter: novel.current_chapter,
            created_at: novel.created_at,
            updated_at: novel.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateNovelRequest {
    pub title: String,
    #[serde(default)]
    pub outline: String,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateNovelRequest {
    pub title: Option<String>,
    pub outline: Option<String>,
    pub current_chapter: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RosterEntryResponse {
    pub name: String,
    pub description: String,
    pub characteristics: String,
}

impl From<RosterEntry> for RosterEntryResponse {
    fn from(entry: RosterEntry) -> Self {
        Self {
            name: entry.name,
            description: entry.description,
            characteristics: entry.characteristics,
        }
    }
}

/// The narrative context of a novel. Keys without data are omitted.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NovelContextResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<RosterEntryResponse>,
}

impl From<NovelContext> for NovelContextResponse {
    fn from(context: NovelContext) -> Self {
        Self {
            outline: context.outline,
            previous_summary: context.previous_summary,
            characters: context.characters.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// Chapters
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChapterResponse {
    pub id: i64,
    pub novel_id: i64,
    pub chapter_number: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub outline: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Chapter> for ChapterResponse {
    fn from(chapter: Chapter) -> Self {
        Self {
            id: chapter.id,
            novel_id: chapter.novel_id,
            chapter_number: chapter.chapter_number,
            title: chapter.title,
            content: chapter.content,
            summary: chapter.summary,
            outline: chapter.outline,
            created_at: chapter.created_at,
            updated_at: chapter.updated_at,
        }
    }
}

/// Without a `chapter_number` the chapter is appended after the last one.
#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct CreateChapterRequest {
    pub chapter_number: Option<i64>,
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub outline: Option<String>,
}

#[derive(Deserialize, IntoParams, Default)]
pub struct ChapterListParams {
    /// Only chapters numbered strictly below this one.
    pub before_chapter: Option<i64>,
    /// Keep the N chapters closest to the cut-off.
    pub limit: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub id: i64,
    pub chapter_id: i64,
    pub content: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChapterVersion> for VersionResponse {
    fn from(version: ChapterVersion) -> Self {
        Self {
            id: version.id,
            chapter_id: version.chapter_id,
            content: version.content,
            comment: version.comment,
            created_at: version.created_at,
        }
    }
}

/// Omitted flags fall back to the server defaults.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SaveChapterRequest {
    pub content: String,
    pub extract_characters: Option<bool>,
    pub auto_summary: Option<bool>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SaveChapterResponse {
    pub chapter: ChapterResponse,
    pub added_characters: Vec<CharacterResponse>,
    pub extraction_error: Option<String>,
    pub summary_error: Option<String>,
}

impl From<SaveReport> for SaveChapterResponse {
    fn from(report: SaveReport) -> Self {
        Self {
            chapter: report.chapter.into(),
            added_characters: report.added_characters.into_iter().map(Into::into).collect(),
            extraction_error: report.extraction_error,
            summary_error: report.summary_error,
        }
    }
}

//=========================================================================================
// Characters
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CharacterResponse {
    pub id: i64,
    pub novel_id: i64,
    pub name: String,
    pub description: String,
    pub characteristics: String,
    /// One of `主角`, `配角`, `反派`.
    pub role_type: String,
    /// One of `活跃`, `已退场`, `已死亡`.
    pub status: String,
    pub first_appearance: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Character> for CharacterResponse {
    fn from(character: Character) -> Self {
        Self {
            id: character.id,
            novel_id: character.novel_id,
            name: character.name,
            description: character.description,
            characteristics: character.characteristics,
            role_type: character.role_type.label().to_string(),
            status: character.status.label().to_string(),
            first_appearance: character.first_appearance,
            created_at: character.created_at,
            updated_at: character.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub characteristics: String,
    pub role_type: Option<String>,
    pub status: Option<String>,
    pub first_appearance: Option<i64>,
}

/// `first_appearance: null` clears the reference; leaving it out keeps it.
#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateCharacterRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub characteristics: Option<String>,
    pub role_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub first_appearance: Option<Option<i64>>,
}

#[derive(Deserialize, IntoParams, Default)]
pub struct CharacterContextParams {
    /// Restrict the context to this character.
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CharacterProfileResponse {
    pub name: String,
    pub description: String,
    pub characteristics: String,
    pub role_type: String,
    pub status: String,
}

impl From<CharacterProfile> for CharacterProfileResponse {
    fn from(profile: CharacterProfile) -> Self {
        Self {
            name: profile.name,
            description: profile.description,
            characteristics: profile.characteristics,
            role_type: profile.role_type.label().to_string(),
            status: profile.status.label().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CharacterContextResponse {
    pub characters: Vec<CharacterProfileResponse>,
    pub relationships: Vec<NovelRelationshipResponse>,
}

impl From<CharacterContext> for CharacterContextResponse {
    fn from(context: CharacterContext) -> Self {
        Self {
            characters: context.characters.into_iter().map(Into::into).collect(),
            relationships: context.relationships.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// Relationships
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RelationshipResponse {
    pub id: i64,
    pub novel_id: i64,
    pub character1_id: i64,
    pub character2_id: i64,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter: Option<i64>,
}

impl From<Relationship> for RelationshipResponse {
    fn from(relationship: Relationship) -> Self {
        Self {
            id: relationship.id,
            novel_id: relationship.novel_id,
            character1_id: relationship.character1_id,
            character2_id: relationship.character2_id,
            relationship_type: relationship.relationship_type,
            description: relationship.description,
            start_chapter: relationship.start_chapter,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateRelationshipRequest {
    pub character1_id: i64,
    pub character2_id: i64,
    pub relationship_type: String,
    #[serde(default)]
    pub description: String,
    pub start_chapter: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateRelationshipRequest {
    pub relationship_type: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub start_chapter: Option<Option<i64>>,
}

/// A relationship seen from one character: `self_*` is always that character.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CharacterRelationshipResponse {
    pub id: i64,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter: Option<i64>,
    pub self_id: i64,
    pub self_name: String,
    pub other_id: i64,
    pub other_name: String,
}

impl From<CharacterRelationship> for CharacterRelationshipResponse {
    fn from(r: CharacterRelationship) -> Self {
        Self {
            id: r.id,
            relationship_type: r.relationship_type,
            description: r.description,
            start_chapter: r.start_chapter,
            self_id: r.self_id,
            self_name: r.self_name,
            other_id: r.other_id,
            other_name: r.other_name,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NovelRelationshipResponse {
    pub id: i64,
    pub character1_name: String,
    pub character2_name: String,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter_number: Option<i64>,
}

impl From<NovelRelationship> for NovelRelationshipResponse {
    fn from(r: NovelRelationship) -> Self {
        Self {
            id: r.id,
            character1_name: r.character1_name,
            character2_name: r.character2_name,
            relationship_type: r.relationship_type,
            description: r.description,
            start_chapter_number: r.start_chapter_number,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RelationshipTypeResponse {
    pub id: i64,
    pub category: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
}

impl From<RelationshipTypeEntry> for RelationshipTypeResponse {
    fn from(entry: RelationshipTypeEntry) -> Self {
        Self {
            id: entry.id,
            category: entry.category,
            type_name: entry.type_name,
            description: entry.description,
        }
    }
}

//=========================================================================================
// Generation
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub instruction: String,
    /// The chapter being written; its characters are merged into the roster.
    pub chapter_id: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub text: String,
    pub added_characters: Vec<CharacterResponse>,
    pub extraction_error: Option<String>,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            text: outcome.text,
            added_characters: outcome.added_characters.into_iter().map(Into::into).collect(),
            extraction_error: outcome.extraction_error,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct GenerateOutlineRequest {
    /// Outline this chapter instead of the whole novel.
    pub chapter_id: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct OutlineResponse {
    pub outline: String,
}

/// `novel` is null when no chapter had a summary to build from.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RefreshOutlineResponse {
    pub novel: Option<NovelResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct KeyPointsResponse {
    pub points: Vec<String>,
}
