//! Moderation gate consulted before anything is rendered.

use std::collections::HashSet;

use notecard_core::config::ModerationConfig;

use crate::source::ContentDocument;

/// Content references and author ids that must never be rendered.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    references: HashSet<String>,
    authors: HashSet<String>,
}

impl Denylist {
    pub fn from_config(config: &ModerationConfig) -> Self {
        Self {
            references: config.banned_references.iter().cloned().collect(),
            authors: config.banned_authors.iter().cloned().collect(),
        }
    }

    pub fn is_reference_banned(&self, reference: &str) -> bool {
        self.references.contains(reference)
    }

    pub fn allows(&self, reference: &str, document: &ContentDocument) -> bool {
        !self.is_reference_banned(reference) && !self.authors.contains(&document.author.id)
    }
}
