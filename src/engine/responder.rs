//! Response generation and escalation scoring.
//!
//! One completion call per reply. A successful completion is assigned a
//! fixed confidence of 0.95; a failed one scores 0.0 and substitutes the
//! apology text naming the human-support contact. The escalation flag is
//! a pure threshold comparison — it is surfaced to the user but not wired
//! to any notification mechanism.

use tracing::{debug, warn};

use crate::prompt::PromptBuilder;

use super::{QueryAnalysis, SupportEngine};

const RESPOND_MAX_TOKENS: u32 = 200;

/// Confidence assigned to any successful completion; failures score 0.0.
const SUCCESS_CONFIDENCE: f32 = 0.95;

const DEFAULT_RESPONDER_TEMPLATE: &str = "\
You are {{business_name}}'s professional customer service AI.
{{business_description}}

IMPORTANT RULES:
1. Be friendly but professional
2. Keep responses concise (under {{max_chars}} characters)
3. If you do not have the information, suggest contacting {{support_email}}
4. Always be honest - never make up information
5. Reference the knowledge base information provided

Customer query: {{query}}
Query type: {{intent}}
Customer info: {{entities}}

Here is relevant information from our knowledge base:
{{context}}

Generate a helpful, natural response based on this information.";

/// The finished reply handed back to the channel.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub intent: String,
    pub confidence: f32,
    pub needs_escalation: bool,
}

impl SupportEngine {
    /// Generate the customer-facing reply for an analyzed query.
    pub async fn respond(&self, analysis: &QueryAnalysis) -> Reply {
        let body = self.template("responder.md", DEFAULT_RESPONDER_TEMPLATE);
        let system = PromptBuilder::new(&self.prompts_dir)
            .layer("persona.md")
            .append(body)
            .var("business_name", &self.business.name)
            .var("business_description", &self.business.description)
            .var("support_email", &self.business.support_email)
            .var("max_chars", self.support.max_response_chars.to_string())
            .var("query", &analysis.query)
            .var("intent", &analysis.intent)
            .var("entities", &analysis.entities)
            .var("context", &analysis.context)
            .build();

        let (text, confidence) = match self
            .provider
            .complete(&analysis.query, Some(&system), Some(RESPOND_MAX_TOKENS))
            .await
        {
            Ok(resp) => {
                if let Some(u) = &resp.usage {
                    debug!(
                        input_tokens = u.input_tokens,
                        output_tokens = u.output_tokens,
                        cached_tokens = u.cached_input_tokens,
                        "llm usage"
                    );
                }
                (resp.text, SUCCESS_CONFIDENCE)
            }
            Err(e) => {
                warn!(error = %e, "response generation failed — using fallback");
                (
                    format!(
                        "I'm having trouble processing your request. Please contact {}",
                        self.business.support_email
                    ),
                    0.0,
                )
            }
        };

        let needs_escalation =
            self.support.enable_escalation && confidence < self.support.confidence_threshold;

        Reply {
            text,
            intent: analysis.intent.clone(),
            confidence,
            needs_escalation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::knowledge::KnowledgeBase;
    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;

    fn engine_with(provider: DummyProvider, config: &Config) -> SupportEngine {
        SupportEngine::new(
            LlmProvider::Dummy(provider),
            KnowledgeBase::from_content("Standard shipping takes 3-5 business days.\n", 10),
            config,
        )
    }

    fn analysis() -> QueryAnalysis {
        QueryAnalysis {
            query: "How long does shipping take?".into(),
            intent: "shipping_delivery".into(),
            entities: "issue_type: delivery time".into(),
            context: "Standard shipping takes 3-5 business days.".into(),
        }
    }

    #[tokio::test]
    async fn successful_reply_scores_high_confidence() {
        let config = Config::test_default();
        let e = engine_with(DummyProvider::new(), &config);
        let reply = e.respond(&analysis()).await;

        assert!(reply.text.starts_with("[echo]"));
        assert_eq!(reply.confidence, SUCCESS_CONFIDENCE);
        assert_eq!(reply.intent, "shipping_delivery");
        assert!(!reply.needs_escalation);
    }

    #[tokio::test]
    async fn failed_reply_falls_back_with_support_contact() {
        let config = Config::test_default();
        let e = engine_with(DummyProvider::failing(), &config);
        let reply = e.respond(&analysis()).await;

        assert!(reply.text.contains("I'm having trouble processing your request"));
        assert!(reply.text.contains(&config.business.support_email));
        assert_eq!(reply.confidence, 0.0);
        assert!(reply.needs_escalation);
        // intent from the analysis is carried through unchanged
        assert_eq!(reply.intent, "shipping_delivery");
    }

    #[tokio::test]
    async fn escalation_disabled_suppresses_flag() {
        let mut config = Config::test_default();
        config.support.enable_escalation = false;
        let e = engine_with(DummyProvider::failing(), &config);
        let reply = e.respond(&analysis()).await;

        assert_eq!(reply.confidence, 0.0);
        assert!(!reply.needs_escalation);
    }

    #[tokio::test]
    async fn threshold_above_success_confidence_escalates() {
        let mut config = Config::test_default();
        config.support.confidence_threshold = 1.0;
        let e = engine_with(DummyProvider::new(), &config);
        let reply = e.respond(&analysis()).await;

        assert_eq!(reply.confidence, SUCCESS_CONFIDENCE);
        assert!(reply.needs_escalation);
    }
}
