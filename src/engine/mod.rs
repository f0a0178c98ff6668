//! Query-understanding and response-generation engine.
//!
//! Every interesting decision is delegated to the configured LLM provider:
//! classification, extraction, and the final reply are each one
//! prompt-completion round-trip. The engine's own job is prompt assembly,
//! the knowledge scan, and collapsing provider failures into fixed
//! fallback values so a dead endpoint never reaches the caller as an error.

mod analyzer;
mod responder;

pub use analyzer::{FALLBACK_ENTITIES, FALLBACK_INTENT, QueryAnalysis};
pub use responder::Reply;

use std::fs;
use std::path::PathBuf;

use crate::config::{BusinessConfig, Config, SupportConfig};
use crate::knowledge::KnowledgeBase;
use crate::llm::LlmProvider;

pub struct SupportEngine {
    provider: LlmProvider,
    kb: KnowledgeBase,
    prompts_dir: PathBuf,
    business: BusinessConfig,
    support: SupportConfig,
}

impl SupportEngine {
    pub fn new(provider: LlmProvider, kb: KnowledgeBase, config: &Config) -> Self {
        Self {
            provider,
            kb,
            prompts_dir: config.prompts_dir.clone(),
            business: config.business.clone(),
            support: config.support.clone(),
        }
    }

    /// The loaded knowledge base (console `/kb` view).
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Full round-trip: analyze the query, then generate the reply.
    pub async fn handle(&self, query: &str) -> Reply {
        let analysis = self.analyze(query).await;
        self.respond(&analysis).await
    }

    /// Load a prompt template body from the prompts directory, falling back
    /// to the built-in default when the file is absent.
    fn template(&self, filename: &str, fallback: &str) -> String {
        fs::read_to_string(self.prompts_dir.join(filename))
            .unwrap_or_else(|_| fallback.to_string())
    }
}
