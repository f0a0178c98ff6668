//! Query analysis — intent classification, entity extraction, knowledge scan.
//!
//! Classification and extraction are unconstrained free-text completions.
//! The category list only shapes the classifier prompt: whatever string the
//! model returns is used verbatim (trimmed, lowercased), even when it matches
//! no configured category. Provider failures collapse to fixed fallbacks.

use tracing::{debug, info, warn};

use crate::prompt::PromptBuilder;

use super::SupportEngine;

const CLASSIFY_MAX_TOKENS: u32 = 50;
const EXTRACT_MAX_TOKENS: u32 = 100;

/// Intent substituted when classification fails.
pub const FALLBACK_INTENT: &str = "general_inquiry";
/// Entity text substituted when extraction fails.
pub const FALLBACK_ENTITIES: &str = "unable to extract";

const DEFAULT_CLASSIFIER_TEMPLATE: &str = "\
You are a customer service classifier.
Classify the customer's question into ONE of these categories:
{{categories}}

Return ONLY the category name, nothing else.";

const DEFAULT_EXTRACTOR_TEMPLATE: &str = "\
Extract key entities from the customer query.
Return one per line in the format: entity_name: value
Common entities: product, order_id, issue_type, urgency";

/// The product of one analysis pass, handed to the responder.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub query: String,
    /// Category label from the model, or [`FALLBACK_INTENT`].
    pub intent: String,
    /// Free-text entity listing from the model, or [`FALLBACK_ENTITIES`].
    pub entities: String,
    /// Knowledge base lines loosely related to the query.
    pub context: String,
}

impl SupportEngine {
    /// Classify what the customer is asking about.
    pub async fn classify_intent(&self, query: &str) -> String {
        let body = self.template("classifier.md", DEFAULT_CLASSIFIER_TEMPLATE);
        let system = PromptBuilder::new(&self.prompts_dir)
            .append(body)
            .with_categories(&self.support.categories)
            .build();

        match self
            .provider
            .complete(query, Some(&system), Some(CLASSIFY_MAX_TOKENS))
            .await
        {
            Ok(resp) => {
                let intent = resp.text.trim().to_lowercase();
                debug!(%intent, "intent classified");
                intent
            }
            Err(e) => {
                warn!(error = %e, "intent classification failed — using fallback");
                FALLBACK_INTENT.to_string()
            }
        }
    }

    /// Extract important information from the query as free text.
    pub async fn extract_entities(&self, query: &str) -> String {
        let body = self.template("extractor.md", DEFAULT_EXTRACTOR_TEMPLATE);
        let system = PromptBuilder::new(&self.prompts_dir).append(body).build();

        match self
            .provider
            .complete(query, Some(&system), Some(EXTRACT_MAX_TOKENS))
            .await
        {
            Ok(resp) => resp.text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "entity extraction failed — using fallback");
                FALLBACK_ENTITIES.to_string()
            }
        }
    }

    /// Complete analysis of a customer query: intent, entities, and the
    /// knowledge scan, in that order, each awaited before the next.
    pub async fn analyze(&self, query: &str) -> QueryAnalysis {
        let intent = self.classify_intent(query).await;
        let entities = self.extract_entities(query).await;
        let context = self.kb.relevant_lines(query);

        info!(%intent, context_len = context.len(), "query analyzed");

        QueryAnalysis {
            query: query.to_string(),
            intent,
            entities,
            context,
        }
    }
}
