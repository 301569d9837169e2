//! OpenAI-compatible chat completion adapter.
//!
//! Covers the OpenAI API, Azure OpenAI deployments, and any
//! OpenAI-compatible endpoint. One chat-style call per invocation,
//! requesting the JSON-output mode when the caller asks for it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{GenerateOptions, Generator};

const SYSTEM_PROMPT: &str =
    "You are an intelligent multimodal assistant. Answer using the context information the user provides.";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
enum Auth {
    Bearer(String),
    ApiKey(String),
}

/// Chat completion generator for OpenAI-compatible backends.
pub struct OpenAiGenerator {
    name: &'static str,
    url: String,
    model: String,
    auth: Auth,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// OpenAI API. Key falls back to `OPENAI_API_KEY`, base URL to
    /// `OPENAI_BASE_URL`, then the public endpoint.
    pub fn openai(
        model: &str,
        api_key: Option<&str>,
        base_url: Option<&str>,
    ) -> DomainResult<Self> {
        let key = non_empty(api_key)
            .map(str::to_string)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DomainError::Config(
                    "OpenAI API key not set. Set OPENAI_API_KEY or configure llm.api_key."
                        .to_string(),
                )
            })?;
        let base = non_empty(base_url)
            .map(str::to_string)
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        Self::build(
            "openai",
            format!("{}/chat/completions", base.trim_end_matches('/')),
            model,
            Auth::Bearer(key),
        )
    }

    /// Azure OpenAI deployment. Key falls back to `AZURE_OPENAI_KEY`.
    pub fn azure(
        model: &str,
        api_key: Option<&str>,
        endpoint: &str,
        api_version: &str,
    ) -> DomainResult<Self> {
        let key = non_empty(api_key)
            .map(str::to_string)
            .or_else(|| std::env::var("AZURE_OPENAI_KEY").ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DomainError::Config(
                    "Azure OpenAI key not set. Set AZURE_OPENAI_KEY or configure llm.api_key."
                        .to_string(),
                )
            })?;
        if endpoint.is_empty() {
            return Err(DomainError::Config(
                "Azure OpenAI requires a non-empty endpoint.".to_string(),
            ));
        }

        Self::build(
            "azure",
            format!(
                "{}/openai/deployments/{model}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
            model,
            Auth::ApiKey(key),
        )
    }

    /// Any OpenAI-compatible endpoint; key and base URL are required.
    pub fn custom(model: &str, api_key: &str, base_url: &str) -> DomainResult<Self> {
        if api_key.is_empty() || base_url.is_empty() {
            return Err(DomainError::Config(
                "A custom LLM endpoint requires both base_url and api_key.".to_string(),
            ));
        }

        Self::build(
            "custom",
            format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            Auth::Bearer(api_key.to_string()),
        )
    }

    fn build(name: &'static str, url: String, model: &str, auth: Auth) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DomainError::Backend(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            name,
            url,
            model: model.to_string(),
            auth,
            client,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, prompt: &str, options: GenerateOptions) -> DomainResult<String> {
        let request = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                RequestMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            response_format: options.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let mut builder = self.client.post(&self.url).json(&request);
        builder = match &self.auth {
            Auth::Bearer(key) => builder.header("Authorization", format!("Bearer {key}")),
            Auth::ApiKey(key) => builder.header("api-key", key),
        };

        let response = builder.send().await.map_err(|e| {
            DomainError::Backend(format!("Completion API request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::Backend(format!(
                "Completion API returned {status}: {body}"
            )));
        }

        let parsed: ChatCompletionsResponse = response.json().await.map_err(|e| {
            DomainError::Serialization(format!("Failed to parse completion response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DomainError::Backend("Completion response contained no choices".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}

// -- Chat Completions request/response types --

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
