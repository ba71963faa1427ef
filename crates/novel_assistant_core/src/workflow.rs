//! crates/novel_assistant_core/src/workflow.rs
//!
//! The narrative orchestrator: the user-facing actions (save a chapter, ask for
//! new text, refresh summaries and outlines) expressed over the ports.

use crate::context::ContextAssembler;
use crate::domain::{
    Chapter, ChapterId, ChapterQuery, ChapterSummary, ChapterUpdate, Character, CharacterStatus,
    NewChapter, NewCharacter, Novel, NovelId, NovelUpdate, OutlineTarget,
};
use crate::ports::{GenerationService, PortError, PortResult, Repositories};
use crate::prompt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Which follow-up steps run after a chapter's content is saved.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    pub extract_characters: bool,
    pub auto_summary: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            extract_characters: true,
            auto_summary: true,
        }
    }
}

/// The result of saving a chapter. Once the content is stored, failures of the
/// follow-up steps are reported here instead of failing the save.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub chapter: Chapter,
    pub added_characters: Vec<Character>,
    pub extraction_error: Option<String>,
    pub summary_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub text: String,
    pub added_characters: Vec<Character>,
    pub extraction_error: Option<String>,
}

pub struct NarrativeOrchestrator {
    repos: Repositories,
    assembler: ContextAssembler,
    generator: Arc<dyn GenerationService>,
}

impl NarrativeOrchestrator {
    pub fn new(repos: Repositories, generator: Arc<dyn GenerationService>) -> Self {
        let assembler = ContextAssembler::new(repos.clone());
        Self {
            repos,
            assembler,
            generator,
        }
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Stores new chapter content (versioning the old one), then optionally
    /// merges the characters found in it and refreshes the summary.
    pub async fn save_chapter(
        &self,
        chapter_id: ChapterId,
        content: String,
        options: SaveOptions,
    ) -> PortResult<SaveReport> {
        let mut chapter = self
            .repos
            .chapters
            .update(
                chapter_id,
                ChapterUpdate {
                    content: Some(content),
                    ..ChapterUpdate::default()
                },
            )
            .await?;
        info!(chapter_id, "Chapter content saved");

        let has_content = !chapter.content.trim().is_empty();
        let mut report_added = Vec::new();
        let mut extraction_error = None;
        let mut summary_error = None;

        if options.extract_characters && has_content {
            match self
                .auto_update_characters(chapter.novel_id, chapter.id, &chapter.content)
                .await
            {
                Ok(added) => report_added = added,
                Err(e) => {
                    warn!(chapter_id, error = %e, "Character update after save failed");
                    extraction_error = Some(e.to_string());
                }
            }
        }

        if options.auto_summary && has_content {
            match self.generator.summarize(&chapter.content).await {
                Ok(summary) => {
                    chapter = self
                        .repos
                        .chapters
                        .update(
                            chapter_id,
                            ChapterUpdate {
                                summary: Some(summary),
                                ..ChapterUpdate::default()
                            },
                        )
                        .await?;
                }
                Err(e) => {
                    warn!(chapter_id, error = %e, "Automatic summary failed");
                    summary_error = Some(e.to_string());
                }
            }
        }

        Ok(SaveReport {
            chapter,
            added_characters: report_added,
            extraction_error,
            summary_error,
        })
    }

    /// Generates text for a novel. With a chapter, the text is written for
    /// that position and the characters it introduces join the roster.
    pub async fn generate_for_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        instruction: &str,
    ) -> PortResult<GenerationOutcome> {
        let context = self
            .assembler
            .generation_context(novel_id, chapter_id)
            .await?;
        let text = self.generator.generate(instruction, &context).await?;
        info!(novel_id, length = text.chars().count(), "Content generated");

        let mut outcome = GenerationOutcome {
            text,
            added_characters: Vec::new(),
            extraction_error: None,
        };

        if let Some(chapter_id) = chapter_id {
            match self
                .auto_update_characters(novel_id, chapter_id, &outcome.text)
                .await
            {
                Ok(added) => outcome.added_characters = added,
                Err(e) => {
                    warn!(novel_id, error = %e, "Character update after generation failed");
                    outcome.extraction_error = Some(e.to_string());
                }
            }
        }

        Ok(outcome)
    }

    /// Extracts the characters of `text` and creates those whose name is not
    /// yet in the novel's roster, introduced in `chapter_id`.
    pub async fn auto_update_characters(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        text: &str,
    ) -> PortResult<Vec<Character>> {
        let extraction = self.generator.extract_characters(text).await?;
        if extraction.rejected > 0 {
            warn!(novel_id, rejected = extraction.rejected, "Discarded malformed character entries");
        }

        let mut known: HashSet<String> = self
            .repos
            .characters
            .list_by_novel(novel_id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let mut added = Vec::new();
        for candidate in extraction.characters {
            if !known.insert(candidate.name.clone()) {
                continue;
            }
            let character = self
                .repos
                .characters
                .create(NewCharacter {
                    novel_id,
                    name: candidate.name,
                    description: candidate.description,
                    characteristics: candidate.characteristics,
                    role_type: candidate.role_type,
                    status: CharacterStatus::Active,
                    first_appearance: Some(chapter_id),
                })
                .await?;
            info!(novel_id, name = %character.name, "Added character");
            added.push(character);
        }

        if added.is_empty() {
            info!(novel_id, "No new characters to add");
        }
        Ok(added)
    }

    /// Replaces a chapter's summary with a freshly generated one.
    pub async fn regenerate_summary(&self, chapter_id: ChapterId) -> PortResult<Chapter> {
        let chapter = self.repos.chapters.get(chapter_id).await?;
        if chapter.content.trim().is_empty() {
            return Err(PortError::ConstraintViolation(format!(
                "Chapter {} has no content to summarize",
                chapter_id
            )));
        }

        let summary = self.generator.summarize(&chapter.content).await?;
        self.repos
            .chapters
            .update(
                chapter_id,
                ChapterUpdate {
                    summary: Some(summary),
                    ..ChapterUpdate::default()
                },
            )
            .await
    }

    /// Rewrites the novel outline from the chapter summaries. Returns `None`
    /// without contacting the generation service when no chapter has a summary.
    pub async fn update_novel_outline(&self, novel_id: NovelId) -> PortResult<Option<Novel>> {
        self.repos.novels.get(novel_id).await?;

        let summaries: Vec<ChapterSummary> = self
            .repos
            .chapters
            .list_by_novel(novel_id, ChapterQuery::default())
            .await?
            .into_iter()
            .filter(|c| !c.summary.trim().is_empty())
            .map(|c| ChapterSummary {
                chapter_number: c.chapter_number,
                summary: c.summary,
            })
            .collect();

        if summaries.is_empty() {
            info!(novel_id, "No chapter summaries, outline left unchanged");
            return Ok(None);
        }

        let outline = self
            .generator
            .complete(&prompt::novel_outline_prompt(&summaries))
            .await?;
        let novel = self
            .repos
            .novels
            .update(
                novel_id,
                NovelUpdate {
                    outline: Some(outline),
                    ..NovelUpdate::default()
                },
            )
            .await?;
        info!(novel_id, "Novel outline rebuilt from summaries");
        Ok(Some(novel))
    }

    /// Generates and stores an outline: the chapter's when `chapter_id` is
    /// given (from its content), the novel's otherwise (from its title).
    pub async fn generate_outline(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
    ) -> PortResult<String> {
        let novel = self.repos.novels.get(novel_id).await?;

        match chapter_id {
            Some(chapter_id) => {
                let chapter = self.owned_chapter(novel_id, chapter_id).await?;
                if chapter.content.trim().is_empty() {
                    return Err(PortError::ConstraintViolation(format!(
                        "Chapter {} has no content to outline",
                        chapter_id
                    )));
                }
                let outline = self
                    .generator
                    .outline(&OutlineTarget::Chapter {
                        content: chapter.content,
                    })
                    .await?;
                self.repos
                    .chapters
                    .update(
                        chapter_id,
                        ChapterUpdate {
                            outline: Some(outline.clone()),
                            ..ChapterUpdate::default()
                        },
                    )
                    .await?;
                Ok(outline)
            }
            None => {
                let outline = self
                    .generator
                    .outline(&OutlineTarget::Novel { title: novel.title })
                    .await?;
                self.repos
                    .novels
                    .update(
                        novel_id,
                        NovelUpdate {
                            outline: Some(outline.clone()),
                            ..NovelUpdate::default()
                        },
                    )
                    .await?;
                Ok(outline)
            }
        }
    }

    /// Three to five one-line plot points of a chapter.
    pub async fn extract_key_points(&self, chapter_id: ChapterId) -> PortResult<Vec<String>> {
        let chapter = self.repos.chapters.get(chapter_id).await?;
        if chapter.content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let answer = self
            .generator
            .complete(&prompt::key_points_prompt(&chapter.content))
            .await?;
        Ok(answer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Makes `chapter_id` the active chapter of its novel.
    pub async fn select_chapter(&self, novel_id: NovelId, chapter_id: ChapterId) -> PortResult<Novel> {
        let chapter = self.owned_chapter(novel_id, chapter_id).await?;
        self.repos
            .novels
            .update(
                novel_id,
                NovelUpdate {
                    current_chapter: Some(chapter.chapter_number),
                    ..NovelUpdate::default()
                },
            )
            .await
    }

    /// Appends a chapter after the last one, titled `第N章` unless a title is given.
    pub async fn new_chapter(&self, novel_id: NovelId, title: Option<String>) -> PortResult<Chapter> {
        let chapter_number = self.repos.chapters.next_chapter_number(novel_id).await?;
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("第{}章", chapter_number));

        self.repos
            .chapters
            .create(NewChapter {
                novel_id,
                chapter_number,
                title,
                ..NewChapter::default()
            })
            .await
    }

    async fn owned_chapter(&self, novel_id: NovelId, chapter_id: ChapterId) -> PortResult<Chapter> {
        let chapter = self.repos.chapters.get(chapter_id).await?;
        if chapter.novel_id != novel_id {
            return Err(PortError::ConstraintViolation(format!(
                "Chapter {} does not belong to novel {}",
                chapter_id, novel_id
            )));
        }
        Ok(chapter)
    }
}
