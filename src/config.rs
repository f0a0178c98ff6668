//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the `-f` path) relative to the current
//! working directory, then applies `TECHHUB_LOG_LEVEL` and `TECHHUB_KB_PATH`
//! env overrides. The API key is only ever sourced from the `LLM_API_KEY`
//! env var, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Business identity injected into prompts and user-facing messages.
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub name: String,
    pub description: String,
    /// Human-support contact shown on fallback and escalation.
    pub support_email: String,
    pub support_phone: String,
}

/// Response and escalation policy.
#[derive(Debug, Clone)]
pub struct SupportConfig {
    /// Replies below this confidence are flagged for escalation.
    pub confidence_threshold: f32,
    /// Soft cap passed to the responder prompt, not enforced on the reply.
    pub max_response_chars: usize,
    pub enable_escalation: bool,
    /// Category labels offered to the classifier prompt.
    pub categories: Vec<String>,
}

/// Knowledge base source configuration.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// FAQ text file (already expanded, no `~`).
    pub path: PathBuf,
    /// Max lines returned by a knowledge scan.
    pub max_matches: usize,
}

/// In-memory conversation configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Optional FIFO cap on retained turns. `None` = unbounded.
    pub transcript_cap: Option<usize>,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (e.g. `"dummy"`, `"openai"`).
    /// Maps to `default` in `[llm]` TOML — named `default` there to signal
    /// that other provider sections can coexist without being loaded.
    pub provider: String,
    /// Config for the OpenAI / OpenAI-compatible provider (`[llm.openai]`).
    pub openai: OpenAiConfig,
}

/// Fully-resolved bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    /// Directory holding prompt template fragments.
    pub prompts_dir: PathBuf,
    pub business: BusinessConfig,
    pub support: SupportConfig,
    pub knowledge: KnowledgeConfig,
    pub session: SessionConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var — `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    bot: RawBot,
    #[serde(default)]
    business: RawBusiness,
    #[serde(default)]
    support: RawSupport,
    #[serde(default)]
    knowledge: RawKnowledge,
    #[serde(default)]
    session: RawSession,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawBot {
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
}

#[derive(Deserialize)]
struct RawBusiness {
    #[serde(default = "default_business_name")]
    name: String,
    #[serde(default = "default_business_description")]
    description: String,
    #[serde(default = "default_support_email")]
    support_email: String,
    #[serde(default = "default_support_phone")]
    support_phone: String,
}

impl Default for RawBusiness {
    fn default() -> Self {
        Self {
            name: default_business_name(),
            description: default_business_description(),
            support_email: default_support_email(),
            support_phone: default_support_phone(),
        }
    }
}

#[derive(Deserialize)]
struct RawSupport {
    #[serde(default = "default_confidence_threshold")]
    confidence_threshold: f32,
    #[serde(default = "default_max_response_chars")]
    max_response_chars: usize,
    #[serde(default = "default_true")]
    enable_escalation: bool,
    #[serde(default = "default_categories")]
    categories: Vec<String>,
}

impl Default for RawSupport {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_response_chars: default_max_response_chars(),
            enable_escalation: true,
            categories: default_categories(),
        }
    }
}

#[derive(Deserialize)]
struct RawKnowledge {
    #[serde(default = "default_kb_path")]
    path: String,
    #[serde(default = "default_kb_max_matches")]
    max_matches: usize,
}

impl Default for RawKnowledge {
    fn default() -> Self {
        Self { path: default_kb_path(), max_matches: default_kb_max_matches() }
    }
}

#[derive(Deserialize, Default)]
struct RawSession {
    transcript_cap: Option<usize>,
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_business_name() -> String { "TechHub Electronics".to_string() }
fn default_business_description() -> String {
    "Your trusted source for quality electronics and gadgets".to_string()
}
fn default_support_email() -> String { "support@techhub.com".to_string() }
fn default_support_phone() -> String { "1-800-TECHHUB".to_string() }
fn default_confidence_threshold() -> f32 { 0.7 }
fn default_max_response_chars() -> usize { 500 }
fn default_kb_path() -> String { "data/knowledge_base/techhub_faqs.txt".to_string() }
fn default_kb_max_matches() -> usize { 10 }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }

/// The standard category labels offered to the classifier.
fn default_categories() -> Vec<String> {
    [
        "shipping_delivery",
        "returns_refunds",
        "product_availability",
        "account_login",
        "product_info",
        "pricing",
        "warranty",
        "technical_support",
        "general_inquiry",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

/// Load config from `path` (or `config/default.toml`), then apply env-var
/// overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("TECHHUB_LOG_LEVEL").ok();
    let kb_path_override = env::var("TECHHUB_KB_PATH").ok();
    load_from(
        Path::new(path.unwrap_or("config/default.toml")),
        log_level_override.as_deref(),
        kb_path_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    kb_path_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let log_level = log_level_override.unwrap_or(&parsed.bot.log_level).to_string();
    let kb_path = expand_home(kb_path_override.unwrap_or(&parsed.knowledge.path));

    Ok(Config {
        bot_name: parsed.bot.name,
        log_level,
        prompts_dir: PathBuf::from(parsed.bot.prompts_dir),
        business: BusinessConfig {
            name: parsed.business.name,
            description: parsed.business.description,
            support_email: parsed.business.support_email,
            support_phone: parsed.business.support_phone,
        },
        support: SupportConfig {
            confidence_threshold: parsed.support.confidence_threshold,
            max_response_chars: parsed.support.max_response_chars,
            enable_escalation: parsed.support.enable_escalation,
            categories: parsed.support.categories,
        },
        knowledge: KnowledgeConfig {
            path: kb_path,
            max_matches: parsed.knowledge.max_matches,
        },
        session: SessionConfig {
            transcript_cap: parsed.session.transcript_cap,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — dummy LLM, no API keys, no external calls.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            prompts_dir: PathBuf::from("/nonexistent/prompts"),
            business: BusinessConfig {
                name: default_business_name(),
                description: default_business_description(),
                support_email: default_support_email(),
                support_phone: default_support_phone(),
            },
            support: SupportConfig {
                confidence_threshold: default_confidence_threshold(),
                max_response_chars: default_max_response_chars(),
                enable_escalation: true,
                categories: default_categories(),
            },
            knowledge: KnowledgeConfig {
                path: PathBuf::from("/nonexistent/faqs.txt"),
                max_matches: default_kb_max_matches(),
            },
            session: SessionConfig { transcript_cap: None },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[bot]
name = "test-bot"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_minimal_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.bot_name, "test-bot");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.knowledge.max_matches, 10);
        assert!(cfg.support.enable_escalation);
    }

    #[test]
    fn default_categories_present() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.support.categories.len(), 9);
        assert!(cfg.support.categories.contains(&"general_inquiry".to_string()));
        assert!(cfg.support.categories.contains(&"shipping_delivery".to_string()));
    }

    #[test]
    fn explicit_categories_override_defaults() {
        let f = write_toml(
            r#"
[bot]
name = "test-bot"

[support]
categories = ["billing", "other"]
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.support.categories, vec!["billing", "other"]);
    }

    #[test]
    fn openai_section_parses() {
        let f = write_toml(
            r#"
[bot]
name = "test-bot"

[llm]
default = "openai"

[llm.openai]
model = "gpt-4-turbo"
timeout_seconds = 30
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.openai.model, "gpt-4-turbo");
        assert_eq!(cfg.llm.openai.timeout_seconds, 30);
        // untouched fields keep their defaults
        assert!(cfg.llm.openai.api_base_url.ends_with("/v1/chat/completions"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("debug"), None).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn env_kb_path_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, Some("/tmp/other_faqs.txt")).unwrap();
        assert_eq!(cfg.knowledge.path, PathBuf::from("/tmp/other_faqs.txt"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/faqs.txt");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("faqs.txt"));
    }

    #[test]
    fn absolute_path_unchanged() {
        let p = expand_home("/absolute/path");
        assert_eq!(p, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn session_cap_parses() {
        let f = write_toml(
            r#"
[bot]
name = "test-bot"

[session]
transcript_cap = 50
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.session.transcript_cap, Some(50));

        let f2 = write_toml(MINIMAL_TOML);
        let cfg2 = load_from(f2.path(), None, None).unwrap();
        assert_eq!(cfg2.session.transcript_cap, None);
    }
}
