//! Static FAQ knowledge base.
//!
//! The entire knowledge source is one flat text file, loaded once at startup
//! and held in memory, immutable after load. There is no index and no
//! ranking: a "search" is a linear scan that returns lines containing any
//! word of the query. Headings are lines starting with `SECTION`.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

/// Prefix marking a heading line in the FAQ file.
const SECTION_PREFIX: &str = "SECTION";

/// Counts and headings reported by [`KnowledgeBase::summary`].
#[derive(Debug, Clone)]
pub struct KbSummary {
    pub total_sections: usize,
    /// Size of the loaded buffer in bytes.
    pub total_size: usize,
    pub sections: Vec<String>,
}

/// A single loaded FAQ document.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    content: String,
    max_matches: usize,
}

impl KnowledgeBase {
    /// Load the FAQ file at `path`.
    ///
    /// A missing or unreadable file is a warning, not a fatal error: the bot
    /// runs with an empty knowledge base and every scan returns nothing.
    pub fn load(path: &Path, max_matches: usize) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => {
                info!(path = %path.display(), bytes = text.len(), "knowledge base loaded");
                text
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "knowledge base not loaded — running empty");
                String::new()
            }
        };
        Self { content, max_matches }
    }

    /// Build a knowledge base directly from text. Used by tests and callers
    /// that already hold the document in memory.
    pub fn from_content(content: impl Into<String>, max_matches: usize) -> Self {
        Self { content: content.into(), max_matches }
    }

    /// The full document, as loaded.
    pub fn context(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Return up to `max_matches` lines of the document containing any
    /// whitespace-separated word of `query`, case-insensitively.
    ///
    /// An empty or whitespace-only query matches nothing.
    pub fn relevant_lines(&self, query: &str) -> String {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();
        if words.is_empty() {
            return String::new();
        }

        let mut matches = Vec::new();
        for line in self.content.lines() {
            let line_lower = line.to_lowercase();
            if words.iter().any(|w| line_lower.contains(w.as_str())) {
                matches.push(line);
                if matches.len() >= self.max_matches {
                    break;
                }
            }
        }
        matches.join("\n")
    }

    /// Count `SECTION` headings and report the document size.
    pub fn summary(&self) -> KbSummary {
        let sections: Vec<String> = self
            .content
            .lines()
            .filter(|line| line.starts_with(SECTION_PREFIX))
            .map(|line| line.to_string())
            .collect();
        KbSummary {
            total_sections: sections.len(),
            total_size: self.content.len(),
            sections,
        }
    }
}
