//! Prompt Assembly: builds the system-instruction string for one chat turn.
//!
//! Sections, in order: base instructions, health profile, recent conversation,
//! specialized reference. Absent sections are omitted. Every variable-length
//! section is capped so the prompt cannot grow with conversation length:
//! see [`profile_render_bound`] and [`history_render_bound`].

use crate::models::conversation::{Role, TurnRow};
use crate::triage::prompts::{
    HISTORY_HEADING, PROFILE_HEADING, SPECIALIZED_HEADING_PREFIX,
};
use crate::triage::router::Selection;

/// Number of most recent turns rendered into the prompt.
pub const HISTORY_TURNS: usize = 5;
/// Max characters kept from each rendered turn.
pub const TURN_CHAR_LIMIT: usize = 500;
/// Max characters kept from each profile value.
pub const PROFILE_VALUE_CHAR_LIMIT: usize = 120;

const TRUNCATION_MARKER: char = '…';
const SECTION_SEPARATOR: &str = "\n\n";
const USER_LABEL: &str = "User: ";
const ASSISTANT_LABEL: &str = "Assistant: ";

/// (label, max items) for each profile line, in render order.
const PROFILE_FIELDS: [(&str, usize); 7] = [
    ("Name", 1),
    ("Age", 1),
    ("Constitution", 1),
    ("Active conditions", 5),
    ("Allergies", 5),
    ("Current medications", 5),
    ("Preferred approaches", 3),
];

/// The subset of a health profile that is ever shown to the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSummary {
    pub display_name: Option<String>,
    pub age_band: Option<String>,
    pub constitution: Option<String>,
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub preferred_domains: Vec<String>,
}

impl ProfileSummary {
    fn values(&self) -> [Vec<&str>; 7] {
        [
            self.display_name.as_deref().into_iter().collect(),
            self.age_band.as_deref().into_iter().collect(),
            self.constitution.as_deref().into_iter().collect(),
            self.conditions.iter().map(String::as_str).collect(),
            self.allergies.iter().map(String::as_str).collect(),
            self.medications.iter().map(String::as_str).collect(),
            self.preferred_domains.iter().map(String::as_str).collect(),
        ]
    }
}

/// Assembles the full system prompt. Deterministic for identical inputs.
pub fn build_system_prompt(
    base: &str,
    profile: &ProfileSummary,
    history: &[TurnRow],
    specialized: Option<&Selection>,
) -> String {
    let sections = [
        base.trim().to_string(),
        render_profile(profile),
        render_history(history),
        specialized.map(render_specialized).unwrap_or_default(),
    ];

    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

/// Upper bound (in chars) of [`build_system_prompt`] output for the given fixed parts.
pub fn system_prompt_bound(base: &str, specialized: Option<&Selection>) -> usize {
    let specialized_len = specialized
        .map(|s| render_specialized(s).chars().count())
        .unwrap_or(0);
    base.trim().chars().count()
        + profile_render_bound()
        + history_render_bound()
        + specialized_len
        + 3 * SECTION_SEPARATOR.len()
}

/// Renders the profile section, or an empty string when no field is present.
pub fn render_profile(profile: &ProfileSummary) -> String {
    let mut lines = Vec::new();
    for ((label, max_items), values) in PROFILE_FIELDS.iter().zip(profile.values()) {
        let items: Vec<String> = values
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .take(*max_items)
            .map(|v| cap_chars(v, PROFILE_VALUE_CHAR_LIMIT))
            .collect();
        if items.is_empty() {
            continue;
        }
        lines.push(format!("- {label}: {}", items.join(", ")));
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("{PROFILE_HEADING}\n{}", lines.join("\n"))
}

pub fn profile_render_bound() -> usize {
    let per_field: usize = PROFILE_FIELDS
        .iter()
        .map(|(label, max_items)| {
            // "\n- {label}: " + items joined by ", "
            1 + 2
                + label.chars().count()
                + 2
                + max_items * (PROFILE_VALUE_CHAR_LIMIT + 1)
                + max_items.saturating_sub(1) * 2
        })
        .sum();
    PROFILE_HEADING.chars().count() + per_field
}

/// Renders the last [`HISTORY_TURNS`] turns, oldest first, each capped at
/// [`TURN_CHAR_LIMIT`] characters. `history` must be in chronological order.
pub fn render_history(history: &[TurnRow]) -> String {
    let lines: Vec<String> = recent(history)
        .iter()
        .map(|turn| {
            let label = match turn.role() {
                Role::User => USER_LABEL,
                Role::Assistant => ASSISTANT_LABEL,
            };
            format!("{label}{}", cap_chars(turn.content.trim(), TURN_CHAR_LIMIT))
        })
        .collect();

    if lines.is_empty() {
        return String::new();
    }
    format!("{HISTORY_HEADING}\n{}", lines.join("\n"))
}

pub fn history_render_bound() -> usize {
    let longest_label = USER_LABEL.len().max(ASSISTANT_LABEL.len());
    HISTORY_HEADING.chars().count() + HISTORY_TURNS * (1 + longest_label + TURN_CHAR_LIMIT + 1)
}

/// The tail of `history` that is eligible for rendering.
pub fn recent(history: &[TurnRow]) -> &[TurnRow] {
    let start = history.len().saturating_sub(HISTORY_TURNS);
    &history[start..]
}

fn render_specialized(selection: &Selection) -> String {
    format!(
        "{SPECIALIZED_HEADING_PREFIX}{}\n{}",
        selection.label, selection.content
    )
}

/// Keeps at most `limit` chars, appending a marker when something was cut.
pub fn cap_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut capped: String = text.chars().take(limit).collect();
    capped.push(TRUNCATION_MARKER);
    capped
}
