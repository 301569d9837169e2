//! Generator port - interface for LLM backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Per-call generation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Request the backend's JSON-output mode when available.
    pub json_mode: bool,
}

impl GenerateOptions {
    /// Options requesting a JSON object response.
    pub fn json() -> Self {
        Self { json_mode: true }
    }
}

/// Trait for generation (LLM) backends.
///
/// One chat-style call per invocation; the returned string is the raw
/// model output and must be treated as untrusted free text by callers.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name (e.g., "openai", "azure", "mock").
    fn name(&self) -> &'static str;

    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> DomainResult<String>;
}
