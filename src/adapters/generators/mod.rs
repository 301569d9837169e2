//! Generator adapters and their constructor registry.

pub mod mock;
pub mod openai;

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::LlmConfig;
use crate::domain::ports::Generator;

pub use mock::MockGenerator;
pub use openai::OpenAiGenerator;

/// Resolve the configured LLM variant to a concrete adapter.
///
/// Called exactly once at startup; a missing credential is a fatal
/// configuration-time failure.
pub fn build(config: &LlmConfig) -> DomainResult<Arc<dyn Generator>> {
    match config {
        LlmConfig::Openai {
            model,
            api_key,
            base_url,
        } => Ok(Arc::new(OpenAiGenerator::openai(
            model,
            api_key.as_deref(),
            base_url.as_deref(),
        )?)),
        LlmConfig::Azure {
            model,
            api_key,
            endpoint,
            api_version,
        } => Ok(Arc::new(OpenAiGenerator::azure(
            model,
            api_key.as_deref(),
            endpoint,
            api_version,
        )?)),
        LlmConfig::Custom {
            model,
            api_key,
            base_url,
        } => Ok(Arc::new(OpenAiGenerator::custom(model, api_key, base_url)?)),
        LlmConfig::Mock { reply } => Ok(Arc::new(match reply {
            Some(reply) => MockGenerator::with_default_reply(reply),
            None => MockGenerator::new(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mock() {
        let generator = build(&LlmConfig::Mock { reply: None }).unwrap();
        assert_eq!(generator.name(), "mock");
    }

    #[test]
    fn test_build_custom_without_key_fails() {
        let config = LlmConfig::Custom {
            model: "m".to_string(),
            api_key: String::new(),
            base_url: "https://example.com/v1".to_string(),
        };
        assert!(build(&config).is_err());
    }
}
