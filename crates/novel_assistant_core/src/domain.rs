//! crates/novel_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

pub type NovelId = i64;
pub type ChapterId = i64;
pub type VersionId = i64;
pub type CharacterId = i64;
pub type RelationshipId = i64;

/// Comment attached to the snapshot written when a chapter is created.
pub const INITIAL_VERSION_COMMENT: &str = "初始版本";
/// Comment attached to the snapshot written before every content overwrite.
pub const AUTO_SAVE_COMMENT: &str = "自动保存";

//=========================================================================================
// Novels
//=========================================================================================

/// A novel and its working state.
#[derive(Debug, Clone, PartialEq)]
pub struct Novel {
    pub id: NovelId,
    pub title: String,
    pub outline: String,
    /// The chapter number the author is currently working on.
    pub current_chapter: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewNovel {
    pub title: String,
    pub outline: String,
}

/// The mutable fields of a novel. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct NovelUpdate {
    pub title: Option<String>,
    pub outline: Option<String>,
    pub current_chapter: Option<i64>,
}

impl NovelUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.outline.is_none() && self.current_chapter.is_none()
    }
}

//=========================================================================================
// Chapters and their version history
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: ChapterId,
    pub novel_id: NovelId,
    pub chapter_number: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub outline: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewChapter {
    pub novel_id: NovelId,
    pub chapter_number: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub outline: String,
}

/// The mutable fields of a chapter. Setting `content` snapshots the previous
/// content as a new version before it is overwritten.
#[derive(Debug, Clone, Default)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub outline: Option<String>,
}

impl ChapterUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.summary.is_none()
            && self.outline.is_none()
    }
}

/// Filters for listing the chapters of a novel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterQuery {
    /// Only chapters whose number is strictly smaller than this one.
    pub before_chapter: Option<i64>,
    /// At most this many chapters, taken from the end closest to the cut-off.
    pub limit: Option<i64>,
}

/// An immutable snapshot of a chapter's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterVersion {
    pub id: VersionId,
    pub chapter_id: ChapterId,
    pub content: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Characters
//=========================================================================================

/// The narrative role a character plays. Stored with the labels the
/// generation prompts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoleType {
    Protagonist,
    #[default]
    Supporting,
    Antagonist,
}

impl RoleType {
    pub const ALL: [RoleType; 3] = [
        RoleType::Protagonist,
        RoleType::Supporting,
        RoleType::Antagonist,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoleType::Protagonist => "主角",
            RoleType::Supporting => "配角",
            RoleType::Antagonist => "反派",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a role or status label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for RoleType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "主角" | "protagonist" => Ok(RoleType::Protagonist),
            "配角" | "supporting" => Ok(RoleType::Supporting),
            "反派" | "antagonist" => Ok(RoleType::Antagonist),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Where a character stands in the story. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharacterStatus {
    #[default]
    Active,
    Exited,
    Deceased,
}

impl CharacterStatus {
    pub const ALL: [CharacterStatus; 3] = [
        CharacterStatus::Active,
        CharacterStatus::Exited,
        CharacterStatus::Deceased,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CharacterStatus::Active => "活跃",
            CharacterStatus::Exited => "已退场",
            CharacterStatus::Deceased => "已死亡",
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CharacterStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "活跃" | "active" => Ok(CharacterStatus::Active),
            "已退场" | "exited" => Ok(CharacterStatus::Exited),
            "已死亡" | "deceased" => Ok(CharacterStatus::Deceased),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: CharacterId,
    pub novel_id: NovelId,
    pub name: String,
    pub description: String,
    pub characteristics: String,
    pub role_type: RoleType,
    pub status: CharacterStatus,
    /// The chapter in which the character is introduced.
    pub first_appearance: Option<ChapterId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCharacter {
    pub novel_id: NovelId,
    pub name: String,
    pub description: String,
    pub characteristics: String,
    pub role_type: RoleType,
    pub status: CharacterStatus,
    pub first_appearance: Option<ChapterId>,
}

/// The mutable fields of a character. `first_appearance: Some(None)` clears
/// the reference.
#[derive(Debug, Clone, Default)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub characteristics: Option<String>,
    pub role_type: Option<RoleType>,
    pub status: Option<CharacterStatus>,
    pub first_appearance: Option<Option<ChapterId>>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.characteristics.is_none()
            && self.role_type.is_none()
            && self.status.is_none()
            && self.first_appearance.is_none()
    }
}

//=========================================================================================
// Relationships
//=========================================================================================

/// A relationship between two characters, stored with a fixed orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub novel_id: NovelId,
    pub character1_id: CharacterId,
    pub character2_id: CharacterId,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter: Option<ChapterId>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRelationship {
    pub novel_id: NovelId,
    pub character1_id: CharacterId,
    pub character2_id: CharacterId,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter: Option<ChapterId>,
}

#[derive(Debug, Clone, Default)]
pub struct RelationshipUpdate {
    pub relationship_type: Option<String>,
    pub description: Option<String>,
    pub start_chapter: Option<Option<ChapterId>>,
}

impl RelationshipUpdate {
    pub fn is_empty(&self) -> bool {
        self.relationship_type.is_none()
            && self.description.is_none()
            && self.start_chapter.is_none()
    }
}

/// A relationship seen from one of its endpoints: the queried character is
/// always `self_*`, whichever column it was stored in.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRelationship {
    pub id: RelationshipId,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter: Option<ChapterId>,
    pub self_id: CharacterId,
    pub self_name: String,
    pub other_id: CharacterId,
    pub other_name: String,
}

/// A relationship with its endpoint names and start chapter number resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NovelRelationship {
    pub id: RelationshipId,
    pub character1_name: String,
    pub character2_name: String,
    pub relationship_type: String,
    pub description: String,
    pub start_chapter_number: Option<i64>,
}

/// An entry of the static relationship-type catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTypeEntry {
    pub id: i64,
    pub category: String,
    pub type_name: String,
    pub description: String,
}

//=========================================================================================
// Narrative context
//=========================================================================================

/// The slice of a character handed to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub description: String,
    pub characteristics: String,
}

impl From<&Character> for RosterEntry {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            description: character.description.clone(),
            characteristics: character.characteristics.clone(),
        }
    }
}

/// The narrative context of a novel. Empty data is represented as `None`
/// (or an empty roster), never as an empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovelContext {
    pub outline: Option<String>,
    pub previous_summary: Option<String>,
    pub characters: Vec<RosterEntry>,
}

/// Where the author currently is in the novel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterPosition {
    pub chapter_number: i64,
    pub title: String,
    pub outline: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterSummary {
    pub chapter_number: i64,
    pub summary: String,
}

/// Everything the generation service is given alongside an instruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationContext {
    pub novel_outline: Option<String>,
    pub current_chapter: Option<ChapterPosition>,
    pub previous_summaries: Vec<ChapterSummary>,
    pub characters: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterProfile {
    pub name: String,
    pub description: String,
    pub characteristics: String,
    pub role_type: RoleType,
    pub status: CharacterStatus,
}

/// The cast of a novel together with the relationships between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterContext {
    pub characters: Vec<CharacterProfile>,
    pub relationships: Vec<NovelRelationship>,
}

//=========================================================================================
// Generation
//=========================================================================================

/// A character recognized in generated or authored text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCharacter {
    pub name: String,
    pub description: String,
    pub characteristics: String,
    pub role_type: RoleType,
}

/// The outcome of a character extraction: the accepted entries and how many
/// were thrown away as incomplete or unrecognized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub characters: Vec<ExtractedCharacter>,
    pub rejected: usize,
}

/// What an outline should be written for.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineTarget {
    Novel { title: String },
    Chapter { content: String },
}
