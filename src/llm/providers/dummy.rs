//! Dummy LLM provider — echoes input back prefixed with `[echo]`.
//! Used for testing the full query pipeline without a real API key.
//! The failing variant errors on every call so fallback paths can be
//! exercised offline.

use crate::llm::{LlmResponse, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    fail: bool,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that fails every request.
    pub fn failing() -> Self {
        Self { fail: true }
    }

    pub async fn complete(
        &self,
        content: &str,
        _system: Option<&str>,
        _max_tokens: Option<u32>,
    ) -> Result<LlmResponse, ProviderError> {
        if self.fail {
            return Err(ProviderError::Request("dummy provider configured to fail".into()));
        }
        Ok(LlmResponse {
            text: format!("[echo] {content}"),
            usage: None,
        })
    }
}
