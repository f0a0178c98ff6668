//! Integration tests for the full query → analysis → reply pipeline.
//!
//! Everything runs on the dummy provider — no network, no API key.

use std::io::Write;

use tempfile::NamedTempFile;

use techhub_bot::config::{self, Config};
use techhub_bot::engine::{FALLBACK_ENTITIES, FALLBACK_INTENT, SupportEngine};
use techhub_bot::knowledge::KnowledgeBase;
use techhub_bot::llm::LlmProvider;
use techhub_bot::llm::providers::dummy::DummyProvider;
use techhub_bot::session::{Conversation, Role};

// ── helpers ──────────────────────────────────────────────────────────────────

const TEST_TOML: &str = r#"
[bot]
name = "test-bot"

[llm]
default = "dummy"
"#;

const FAQS: &str = "\
SECTION 1: SHIPPING & DELIVERY
Q: How long does shipping take?
A: Standard shipping takes 3-5 business days.

SECTION 2: ACCOUNT & LOGIN
Q: I forgot my password. What do I do?
A: Use the reset link on the login page.
";

fn test_config() -> Config {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(TEST_TOML.as_bytes()).unwrap();
    config::load_from(f.path(), None, None).unwrap()
}

fn engine(provider: DummyProvider) -> SupportEngine {
    SupportEngine::new(
        LlmProvider::Dummy(provider),
        KnowledgeBase::from_content(FAQS, 10),
        &test_config(),
    )
}

// ── end-to-end pipeline ──────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_reply_on_dummy_provider() {
    let e = engine(DummyProvider::new());
    let reply = e.handle("How long does shipping take?").await;

    // The responder forwards the raw query as the user message.
    assert_eq!(reply.text, "[echo] How long does shipping take?");
    assert!(!reply.needs_escalation);

    // The classifier reply matches no configured category and is still
    // carried through verbatim (lowercased).
    assert_eq!(reply.intent, "[echo] how long does shipping take?");
}

#[tokio::test]
async fn analysis_carries_knowledge_context() {
    let e = engine(DummyProvider::new());
    let analysis = e.analyze("How long does shipping take?").await;

    assert!(analysis.context.contains("Standard shipping takes 3-5 business days."));
    assert!(!analysis.context.contains("password"));
    assert_ne!(analysis.entities, FALLBACK_ENTITIES);
}

#[tokio::test]
async fn dead_provider_never_propagates_failure() {
    let e = engine(DummyProvider::failing());
    let reply = e.handle("Where is my order?").await;

    assert_eq!(reply.intent, FALLBACK_INTENT);
    assert!(reply.text.contains("I'm having trouble processing your request"));
    assert!(reply.text.contains("support@techhub.com"));
    assert_eq!(reply.confidence, 0.0);
    assert!(reply.needs_escalation);
}

#[tokio::test]
async fn dead_provider_analysis_uses_fallbacks() {
    let e = engine(DummyProvider::failing());
    let analysis = e.analyze("I want to return my laptop").await;

    assert_eq!(analysis.intent, FALLBACK_INTENT);
    assert_eq!(analysis.entities, FALLBACK_ENTITIES);
}

// ── knowledge scan ───────────────────────────────────────────────────────────

#[test]
fn knowledge_scan_returns_matching_lines_only() {
    let kb = KnowledgeBase::from_content(FAQS, 10);

    let hits = kb.relevant_lines("shipping");
    assert!(hits.contains("How long does shipping take?"));
    assert!(!hits.contains("password"));

    assert_eq!(kb.relevant_lines(""), "");
    assert_eq!(kb.relevant_lines("quantum"), "");
}

#[test]
fn knowledge_scan_is_capped() {
    let doc: String = (0..50).map(|i| format!("shipping note {i}\n")).collect();
    let kb = KnowledgeBase::from_content(doc, 10);
    assert_eq!(kb.relevant_lines("shipping").lines().count(), 10);
}

// ── conversation history ─────────────────────────────────────────────────────

#[test]
fn clearing_history_resets_turn_count() {
    let mut c = Conversation::new(None);
    c.push(Role::User, "How long does shipping take?");
    c.push(Role::Assistant, "3-5 business days.");
    c.push(Role::User, "Thanks!");
    c.push(Role::Assistant, "Anytime.");
    assert_eq!(c.len(), 4);

    c.clear();
    assert_eq!(c.len(), 0);
    assert!(c.is_empty());
}

#[test]
fn history_order_equals_arrival_order() {
    let mut c = Conversation::new(None);
    c.push(Role::User, "first");
    c.push(Role::Assistant, "second");
    c.push(Role::User, "third");

    let contents: Vec<&str> = c.turns().iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert_eq!(c.turns()[0].role, Role::User);
    assert_eq!(c.turns()[1].role, Role::Assistant);
}

// ── configuration ────────────────────────────────────────────────────────────

#[test]
fn config_defaults_cover_standard_categories() {
    let cfg = test_config();
    assert_eq!(cfg.support.categories.len(), 9);
    assert!(cfg.support.categories.contains(&"general_inquiry".to_string()));
    assert!((cfg.support.confidence_threshold - 0.7).abs() < f32::EPSILON);
    assert_eq!(cfg.knowledge.max_matches, 10);
}

#[test]
fn kb_path_override_is_applied() {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(TEST_TOML.as_bytes()).unwrap();
    let cfg = config::load_from(f.path(), None, Some("/tmp/faqs_override.txt")).unwrap();
    assert_eq!(cfg.knowledge.path, std::path::PathBuf::from("/tmp/faqs_override.txt"));
}
