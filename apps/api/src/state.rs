use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::store::Store;
use crate::triage::ChatPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Default: `LlmClient`. Handler tests swap in a scripted completer.
    pub llm: Arc<dyn CompletionService>,
    /// Safety gate, knowledge router and prompt assembly. Immutable after startup.
    pub pipeline: Arc<ChatPipeline>,
    // The pipeline copies its limits at startup; handlers do not read this yet
    #[allow(dead_code)]
    pub config: Config,
}
