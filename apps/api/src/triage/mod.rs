//! Chat-turn triage: emergency screening, domain routing and prompt assembly.
//! Pure computation over static configuration; nothing here touches the
//! network or the database. The chat service owns all I/O around it.

pub mod domains;
pub mod knowledge;
pub mod pipeline;
pub mod prompt_assembly;
pub mod prompts;
pub mod router;
pub mod safety_gate;

pub use knowledge::KnowledgeBase;
pub use pipeline::{ChatPipeline, PromptPayload, Screening};
pub use prompt_assembly::ProfileSummary;
pub use router::KnowledgeRouter;
pub use safety_gate::SafetyGate;

/// Case-folds text for phrase matching.
///
/// Lowercases, maps typographic apostrophes to `'`, turns hyphens, dashes and
/// other punctuation into spaces, and collapses whitespace runs. "Self-harm",
/// "chest  pain," and "can’t" therefore match "self harm", "chest pain" and
/// "can't". Apostrophes are kept so contractions stay intact.
pub fn fold(text: &str) -> String {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            '\'' => '\'',
            '\u{2010}'..='\u{2015}' => ' ',
            c if c.is_ascii_punctuation() => ' ',
            c => c,
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
