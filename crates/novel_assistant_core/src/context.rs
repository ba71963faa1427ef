//! crates/novel_assistant_core/src/context.rs
//!
//! Builds the narrative context handed to the generation service from what the
//! repositories hold. Every function here is a pure read.

use crate::domain::{
    ChapterId, ChapterPosition, ChapterQuery, ChapterSummary, CharacterContext, CharacterProfile,
    GenerationContext, NovelContext, NovelId, RosterEntry,
};
use crate::ports::{PortError, PortResult, Repositories};
use tracing::debug;

/// Reads across the repositories to assemble narrative context.
///
/// Nothing is truncated: the whole outline and the whole roster are included,
/// so callers must not assume the output is small.
#[derive(Clone)]
pub struct ContextAssembler {
    repos: Repositories,
}

impl ContextAssembler {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// The outline, the summary of the chapter before the active one, and the
    /// roster of a novel.
    pub async fn assemble(&self, novel_id: NovelId) -> PortResult<NovelContext> {
        let novel = self.repos.novels.get(novel_id).await?;

        let mut context = NovelContext {
            outline: non_empty(&novel.outline),
            ..NovelContext::default()
        };

        if novel.current_chapter > 1 {
            let previous = self
                .repos
                .chapters
                .find_by_number(novel_id, novel.current_chapter - 1)
                .await?;
            context.previous_summary = previous.and_then(|chapter| non_empty(&chapter.summary));
        }

        context.characters = self
            .repos
            .characters
            .list_by_novel(novel_id)
            .await?
            .iter()
            .map(RosterEntry::from)
            .collect();

        debug!(
            novel_id,
            has_outline = context.outline.is_some(),
            has_previous_summary = context.previous_summary.is_some(),
            characters = context.characters.len(),
            "Assembled novel context"
        );
        Ok(context)
    }

    /// The context serialized into a generation prompt: the novel outline, the
    /// chapter being written, the summaries of every earlier chapter and the
    /// roster.
    pub async fn generation_context(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
    ) -> PortResult<GenerationContext> {
        let novel = self.repos.novels.get(novel_id).await?;

        let mut context = GenerationContext {
            novel_outline: non_empty(&novel.outline),
            ..GenerationContext::default()
        };

        if let Some(chapter_id) = chapter_id {
            let chapter = self.repos.chapters.get(chapter_id).await?;
            if chapter.novel_id != novel_id {
                return Err(PortError::ConstraintViolation(format!(
                    "Chapter {} does not belong to novel {}",
                    chapter_id, novel_id
                )));
            }

            let earlier = self
                .repos
                .chapters
                .list_by_novel(
                    novel_id,
                    ChapterQuery {
                        before_chapter: Some(chapter.chapter_number),
                        limit: None,
                    },
                )
                .await?;
            context.previous_summaries = earlier
                .into_iter()
                .filter(|c| !c.summary.trim().is_empty())
                .map(|c| ChapterSummary {
                    chapter_number: c.chapter_number,
                    summary: c.summary,
                })
                .collect();

            context.current_chapter = Some(ChapterPosition {
                chapter_number: chapter.chapter_number,
                title: chapter.title,
                outline: chapter.outline,
            });
        }

        context.characters = self
            .repos
            .characters
            .list_by_novel(novel_id)
            .await?
            .iter()
            .map(RosterEntry::from)
            .collect();

        Ok(context)
    }

    /// The cast and their relationships; with `name`, only that character and
    /// the relationships it takes part in.
    pub async fn character_context(
        &self,
        novel_id: NovelId,
        name: Option<&str>,
    ) -> PortResult<CharacterContext> {
        self.repos.novels.get(novel_id).await?;

        let characters = match name {
            Some(name) => self
                .repos
                .characters
                .find_by_name(novel_id, name)
                .await?
                .into_iter()
                .collect(),
            None => self.repos.characters.list_by_novel(novel_id).await?,
        };

        let mut relationships = self.repos.relationships.list_by_novel(novel_id).await?;
        if let Some(name) = name {
            relationships.retain(|r| r.character1_name == name || r.character2_name == name);
        }

        Ok(CharacterContext {
            characters: characters
                .into_iter()
                .map(|c| CharacterProfile {
                    name: c.name,
                    description: c.description,
                    characteristics: c.characteristics,
                    role_type: c.role_type,
                    status: c.status,
                })
                .collect(),
            relationships,
        })
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
