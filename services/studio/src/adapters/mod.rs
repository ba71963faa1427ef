pub mod db;
pub mod generation_llm;

pub use db::SqliteStore;
pub use generation_llm::OpenAiGenerationAdapter;
