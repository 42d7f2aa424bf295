//! Safety Gate: flags utterances that describe a possible medical emergency.
//!
//! A flagged utterance is never forwarded to the language model. The caller
//! replies with [`emergency_response`] instead.

use serde::Serialize;

use crate::triage::fold;

/// Emergency phrases, lowercase. Order is significant: `matched` is reported
/// in this order. Spelling variants that folding cannot reconcile (dropped
/// apostrophes, split words) are listed explicitly.
pub const EMERGENCY_PHRASES: &[&str] = &[
    "chest pain",
    "heart attack",
    "can't breathe",
    "cannot breathe",
    "cant breathe",
    "can not breathe",
    "difficulty breathing",
    "shortness of breath",
    "stroke",
    "face drooping",
    "slurred speech",
    "unconscious",
    "passed out",
    "seizure",
    "severe bleeding",
    "coughing up blood",
    "vomiting blood",
    "suicide",
    "suicidal",
    "kill myself",
    "want to die",
    "self harm",
    "overdose",
    "poisoning",
    "anaphylaxis",
    "severe allergic reaction",
    "severe burn",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResult {
    pub triggered: bool,
    pub matched: Vec<String>,
}

pub struct SafetyGate {
    phrases: Vec<String>,
}

impl SafetyGate {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| fold(p.as_ref()))
                .filter(|p| !p.trim().is_empty())
                .collect(),
        }
    }

    pub fn with_default_phrases() -> Self {
        Self::new(EMERGENCY_PHRASES)
    }

    /// Scans `utterance` for every configured phrase (case-insensitive substring).
    pub fn check(&self, utterance: &str) -> GateResult {
        let folded = fold(utterance);
        let matched: Vec<String> = self
            .phrases
            .iter()
            .filter(|phrase| folded.contains(phrase.as_str()))
            .cloned()
            .collect();

        GateResult {
            triggered: !matched.is_empty(),
            matched,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

/// Fixed reply substituted for the model's answer when the gate triggers.
pub fn emergency_response(matched: &[String]) -> String {
    format!(
        "Your message mentions symptoms that can signal a medical emergency ({}). \
         Please call your local emergency number (such as 911, 112 or 108) or go to the \
         nearest emergency department now. Do not wait for an online answer, and do not \
         rely on home remedies for these symptoms. If you are thinking about harming \
         yourself, contact a crisis line or someone you trust immediately.",
        matched.join(", ")
    )
}
