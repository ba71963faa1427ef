//! Shared fixtures: an in-memory store and a scripted generation service.

#![allow(dead_code)]

use async_trait::async_trait;
use novel_assistant_core::domain::{
    Chapter, Character, Extraction, GenerationContext, NewChapter, NewCharacter, NewNovel, Novel,
    OutlineTarget, RoleType,
};
use novel_assistant_core::extraction::parse_extraction;
use novel_assistant_core::ports::{GenerationService, PortError, PortResult, Repositories};
use novel_assistant_core::NarrativeOrchestrator;
use std::sync::{Arc, Mutex};
use studio_lib::adapters::SqliteStore;

pub async fn store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    store.run_migrations().await.unwrap();
    store
}

pub async fn seed_novel(repos: &Repositories, title: &str, outline: &str) -> Novel {
    repos
        .novels
        .create(NewNovel {
            title: title.to_string(),
            outline: outline.to_string(),
        })
        .await
        .unwrap()
}

pub async fn seed_chapter(repos: &Repositories, novel_id: i64, number: i64, content: &str) -> Chapter {
    repos
        .chapters
        .create(NewChapter {
            novel_id,
            chapter_number: number,
            title: format!("第{}章", number),
            content: content.to_string(),
            ..NewChapter::default()
        })
        .await
        .unwrap()
}

pub async fn seed_character(repos: &Repositories, novel_id: i64, name: &str) -> Character {
    repos
        .characters
        .create(NewCharacter {
            novel_id,
            name: name.to_string(),
            description: format!("{}的描述", name),
            characteristics: "沉稳".to_string(),
            role_type: RoleType::Supporting,
            ..NewCharacter::default()
        })
        .await
        .unwrap()
}

/// A `GenerationService` whose answers are set by the test. An `Err` reply
/// surfaces as `PortError::Upstream`.
pub struct ScriptedGenerator {
    pub text: Mutex<Result<String, String>>,
    pub summary: Mutex<Result<String, String>>,
    pub outline: Mutex<Result<String, String>>,
    pub completion: Mutex<Result<String, String>>,
    /// The raw extraction answer, run through the real parser.
    pub extraction: Mutex<Result<String, String>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub last_context: Mutex<Option<GenerationContext>>,
    pub last_prompt: Mutex<Option<String>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            text: Mutex::new(Ok("生成的内容".to_string())),
            summary: Mutex::new(Ok("本章摘要".to_string())),
            outline: Mutex::new(Ok("生成的大纲".to_string())),
            completion: Mutex::new(Ok("要点一".to_string())),
            extraction: Mutex::new(Ok("[]".to_string())),
            calls: Mutex::new(Vec::new()),
            last_context: Mutex::new(None),
            last_prompt: Mutex::new(None),
        }
    }
}

impl ScriptedGenerator {
    pub fn set(slot: &Mutex<Result<String, String>>, reply: Result<&str, &str>) {
        *slot.lock().unwrap() = reply.map(str::to_string).map_err(str::to_string);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn reply(&self, call: &'static str, slot: &Mutex<Result<String, String>>) -> PortResult<String> {
        self.calls.lock().unwrap().push(call);
        slot.lock().unwrap().clone().map_err(PortError::Upstream)
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, instruction: &str, context: &GenerationContext) -> PortResult<String> {
        *self.last_context.lock().unwrap() = Some(context.clone());
        *self.last_prompt.lock().unwrap() = Some(instruction.to_string());
        self.reply("generate", &self.text)
    }

    async fn summarize(&self, _text: &str) -> PortResult<String> {
        self.reply("summarize", &self.summary)
    }

    async fn outline(&self, _target: &OutlineTarget) -> PortResult<String> {
        self.reply("outline", &self.outline)
    }

    async fn complete(&self, prompt: &str) -> PortResult<String> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply("complete", &self.completion)
    }

    async fn extract_characters(&self, _text: &str) -> PortResult<Extraction> {
        let answer = self.reply("extract_characters", &self.extraction)?;
        Ok(parse_extraction(&answer))
    }
}

/// A migrated in-memory store with an orchestrator over the scripted generator.
pub struct Studio {
    pub store: SqliteStore,
    pub repos: Repositories,
    pub generator: Arc<ScriptedGenerator>,
    pub orchestrator: NarrativeOrchestrator,
}

pub async fn studio() -> Studio {
    let store = store().await;
    let repos = store.repositories();
    let generator = Arc::new(ScriptedGenerator::default());
    let orchestrator = NarrativeOrchestrator::new(repos.clone(), generator.clone());
    Studio {
        store,
        repos,
        generator,
        orchestrator,
    }
}
