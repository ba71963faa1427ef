//! services/studio/src/web/state.rs
//!
//! What every handler can reach: the repositories, the orchestrator built on
//! top of them, and the loaded settings.

use crate::config::Config;
use novel_assistant_core::ports::{GenerationService, Repositories};
use novel_assistant_core::NarrativeOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub orchestrator: Arc<NarrativeOrchestrator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        generator: Arc<dyn GenerationService>,
        config: Arc<Config>,
    ) -> Self {
        let orchestrator = Arc::new(NarrativeOrchestrator::new(repos.clone(), generator));
        Self {
            repos,
            orchestrator,
            config,
        }
    }
}
