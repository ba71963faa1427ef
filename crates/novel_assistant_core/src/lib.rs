pub mod context;
pub mod domain;
pub mod extraction;
pub mod ports;
pub mod prompt;
pub mod workflow;

pub use context::ContextAssembler;
pub use domain::{
    Chapter, ChapterVersion, Character, CharacterRelationship, CharacterStatus, Novel,
    NovelContext, Relationship, RoleType,
};
pub use ports::{
    ChapterRepository, CharacterRepository, GenerationService, NovelRepository, PortError,
    PortResult, RelationshipRepository, Repositories,
};
pub use workflow::{NarrativeOrchestrator, SaveOptions, SaveReport};
