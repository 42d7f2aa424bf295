//! Shared fixtures for handler and service tests.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;

use crate::auth::hash_token;
use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::models::user::User;
use crate::store::memory::MemoryStore;
use crate::store::Store;
use crate::state::AppState;
use crate::triage::domains::DOMAINS;
use crate::triage::knowledge::{DomainTag, KnowledgeBase};
use crate::triage::pipeline::PipelineSettings;
use crate::triage::router::DEFAULT_MIN_SCORE;
use crate::triage::{ChatPipeline, KnowledgeRouter, SafetyGate};

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        anthropic_api_key: "test-key".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        knowledge_dir: PathBuf::from("knowledge"),
        domain_score_threshold: DEFAULT_MIN_SCORE,
        max_message_chars: 4000,
        max_completion_tokens: 1024,
    }
}

/// Pipeline over the built-in domain table with short inline reference texts.
pub fn test_pipeline(config: &Config) -> ChatPipeline {
    let tags = DOMAINS
        .iter()
        .map(|spec| {
            DomainTag::from_spec(spec, Some(Arc::from(format!("{} reference notes.", spec.label))))
        })
        .collect();
    ChatPipeline::new(
        SafetyGate::with_default_phrases(),
        KnowledgeRouter::new(KnowledgeBase::from_tags(tags), config.domain_score_threshold),
        PipelineSettings {
            max_message_chars: config.max_message_chars,
            max_tokens: config.max_completion_tokens,
        },
    )
}

pub fn test_state(store: Arc<dyn Store>, llm: Arc<dyn CompletionService>) -> AppState {
    let config = test_config();
    AppState {
        store,
        llm,
        pipeline: Arc::new(test_pipeline(&config)),
        config,
    }
}

/// Adds a user with a live session and returns it with its bearer token.
pub fn signed_in(store: &MemoryStore, email: &str, role: &str, tier: &str) -> (User, String) {
    let user = store.add_user(email, role, tier);
    let token = format!("token-{}", user.id);
    store.add_session(user.id, hash_token(&token).to_vec(), Duration::hours(1));
    (user, token)
}
