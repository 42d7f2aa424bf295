//! Knowledge Router: picks at most one specialized domain for an utterance.
//!
//! Algorithm:
//! 1. Case-fold the utterance.
//! 2. For each tag, score = Σ word_count(keyword) over keywords found as a substring.
//!    Multi-word phrases therefore outweigh single words.
//! 3. Keep the first tag reaching the maximum score (configuration order breaks ties).
//! 4. Select it only if score ≥ `min_score`, and only if its content is available.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::triage::fold;
use crate::triage::knowledge::{DomainInfo, DomainTag, KnowledgeBase};

pub const DEFAULT_MIN_SCORE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub domain_id: String,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub domain_id: String,
    pub label: String,
    pub score: u32,
    pub content: Arc<str>,
}

pub struct KnowledgeRouter {
    knowledge: KnowledgeBase,
    min_score: u32,
}

impl KnowledgeRouter {
    pub fn new(knowledge: KnowledgeBase, min_score: u32) -> Self {
        Self {
            knowledge,
            min_score,
        }
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    pub fn domains(&self) -> Vec<DomainInfo> {
        self.knowledge.describe()
    }

    /// Per-tag tallies in configuration order.
    pub fn scores(&self, utterance: &str) -> Vec<MatchScore> {
        let folded = fold(utterance);
        self.knowledge
            .tags()
            .iter()
            .map(|tag| MatchScore {
                domain_id: tag.id.clone(),
                score: score_tag(tag, &folded),
            })
            .collect()
    }

    pub fn select(&self, utterance: &str) -> Option<Selection> {
        let folded = fold(utterance);

        let mut best: Option<(&DomainTag, u32)> = None;
        for tag in self.knowledge.tags() {
            let score = score_tag(tag, &folded);
            // strictly greater: the earlier tag keeps a tie
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((tag, score));
            }
        }

        let (tag, score) = best?;
        if score < self.min_score || score == 0 {
            debug!(
                "No domain reached threshold {} (best: {} = {score})",
                self.min_score, tag.id
            );
            return None;
        }

        match &tag.content {
            Some(content) => {
                debug!("Routed utterance to domain '{}' (score {score})", tag.id);
                Some(Selection {
                    domain_id: tag.id.clone(),
                    label: tag.label.clone(),
                    score,
                    content: Arc::clone(content),
                })
            }
            None => {
                warn!(
                    "Domain '{}' selected (score {score}) but its reference content is unavailable; \
                     continuing with general instructions",
                    tag.id
                );
                None
            }
        }
    }
}

fn score_tag(tag: &DomainTag, folded: &str) -> u32 {
    tag.keywords
        .iter()
        .filter(|kw| !kw.is_empty() && folded.contains(kw.as_str()))
        .map(|kw| kw.split_whitespace().count() as u32)
        .sum()
}
