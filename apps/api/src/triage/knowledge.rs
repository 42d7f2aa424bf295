//! Domain reference content, loaded once at startup.
//!
//! A tag whose content cannot be read stays configured (it still scores) but
//! carries no content; the router then degrades to "no specialized block".

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::triage::domains::DomainSpec;

#[derive(Debug, Clone)]
pub struct DomainTag {
    pub id: String,
    pub label: String,
    pub keywords: Vec<String>,
    pub content: Option<Arc<str>>,
}

impl DomainTag {
    pub fn from_spec(spec: &DomainSpec, content: Option<Arc<str>>) -> Self {
        Self {
            id: spec.id.to_string(),
            label: spec.label.to_string(),
            keywords: spec.keywords.iter().map(|k| k.to_string()).collect(),
            content,
        }
    }
}

/// Public view of a configured tag, returned by the knowledge endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DomainInfo {
    pub id: String,
    pub label: String,
    pub keyword_count: usize,
    pub content_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    tags: Vec<DomainTag>,
}

impl KnowledgeBase {
    pub fn from_tags(tags: Vec<DomainTag>) -> Self {
        Self { tags }
    }

    /// Reads each spec's content file from `dir`. Never fails: unreadable or
    /// empty files are logged and the tag is kept without content.
    pub fn load(dir: &Path, specs: &[DomainSpec]) -> Self {
        let tags: Vec<DomainTag> = specs
            .iter()
            .map(|spec| {
                let path = dir.join(spec.content_file);
                let content = match std::fs::read_to_string(&path) {
                    Ok(text) if text.trim().is_empty() => {
                        warn!(
                            "Knowledge content for '{}' at {} is empty; domain will route without content",
                            spec.id,
                            path.display()
                        );
                        None
                    }
                    Ok(text) => Some(Arc::from(text.trim())),
                    Err(e) => {
                        warn!(
                            "Could not read knowledge content for '{}' at {}: {e}",
                            spec.id,
                            path.display()
                        );
                        None
                    }
                };
                DomainTag::from_spec(spec, content)
            })
            .collect();

        let loaded = tags.iter().filter(|t| t.content.is_some()).count();
        info!(
            "Knowledge base loaded: {loaded}/{} domains with content from {}",
            tags.len(),
            dir.display()
        );

        Self { tags }
    }

    pub fn tags(&self) -> &[DomainTag] {
        &self.tags
    }

    pub fn describe(&self) -> Vec<DomainInfo> {
        self.tags
            .iter()
            .map(|t| DomainInfo {
                id: t.id.clone(),
                label: t.label.clone(),
                keyword_count: t.keywords.len(),
                content_available: t.content.is_some(),
            })
            .collect()
    }
}
