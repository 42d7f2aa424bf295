//! Chat-turn pipeline: validate → screen (Safety Gate) → prepare (Router + Prompt Assembly).
//!
//! `screen` and `prepare` are split so the chat service can run the quota check
//! between them: emergency replies never consume model calls and are always
//! delivered. The router only runs inside `prepare`, so a flagged utterance is
//! never routed.

use serde::Serialize;

use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::models::conversation::{Role, TurnRow};
use crate::triage::prompt_assembly::{
    build_system_prompt, cap_chars, recent, ProfileSummary, TURN_CHAR_LIMIT,
};
use crate::triage::prompts::BASE_INSTRUCTIONS;
use crate::triage::router::KnowledgeRouter;
use crate::triage::safety_gate::{emergency_response, SafetyGate};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub max_message_chars: usize,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screening {
    Emergency { content: String, matched: Vec<String> },
    Clear,
}

/// Everything the model call needs. A plain value: retrying the model call
/// reuses it without re-running detection.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPayload {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub specialized_domain: Option<String>,
}

pub struct ChatPipeline {
    gate: SafetyGate,
    router: KnowledgeRouter,
    settings: PipelineSettings,
}

impl ChatPipeline {
    pub fn new(gate: SafetyGate, router: KnowledgeRouter, settings: PipelineSettings) -> Self {
        Self {
            gate,
            router,
            settings,
        }
    }

    pub fn router(&self) -> &KnowledgeRouter {
        &self.router
    }

    /// Rejects empty or overlong utterances. Returns the trimmed text.
    /// Overlong input is refused, never truncated.
    pub fn validate<'a>(&self, utterance: &'a str) -> Result<&'a str, AppError> {
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("Message cannot be empty".to_string()));
        }
        let limit = self.settings.max_message_chars;
        if trimmed.chars().count() > limit {
            return Err(AppError::InvalidInput(format!(
                "Message too long (max {limit} characters)"
            )));
        }
        Ok(trimmed)
    }

    pub fn screen(&self, utterance: &str) -> Screening {
        let result = self.gate.check(utterance);
        if result.triggered {
            Screening::Emergency {
                content: emergency_response(&result.matched),
                matched: result.matched,
            }
        } else {
            Screening::Clear
        }
    }

    /// Routes the utterance and assembles the model payload.
    /// `history` must be chronological; only its tail is used.
    pub fn prepare(
        &self,
        utterance: &str,
        profile: &ProfileSummary,
        history: &[TurnRow],
    ) -> PromptPayload {
        let selection = self.router.select(utterance);
        let system = build_system_prompt(BASE_INSTRUCTIONS, profile, history, selection.as_ref());

        let mut messages = history_messages(history);
        messages.push(ChatMessage {
            role: Role::User,
            content: utterance.to_string(),
        });

        PromptPayload {
            system,
            messages,
            max_tokens: self.settings.max_tokens,
            specialized_domain: selection.map(|s| s.domain_id),
        }
    }
}

/// Recent turns as model messages. The list must open with a user turn, so
/// leading assistant turns in the window are dropped.
fn history_messages(history: &[TurnRow]) -> Vec<ChatMessage> {
    recent(history)
        .iter()
        .skip_while(|t| t.role() != Role::User)
        .map(|t| ChatMessage {
            role: t.role(),
            content: cap_chars(t.content.trim(), TURN_CHAR_LIMIT),
        })
        .collect()
}
