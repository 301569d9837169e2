//! Mock generator for tests and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{GenerateOptions, Generator};

const DEFAULT_REPLY: &str =
    r#"{"recommended_index": null, "answer_text": "Mock generator reply."}"#;

/// A recorded `generate` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The full prompt text passed in.
    pub prompt: String,
    /// Whether JSON mode was requested.
    pub json_mode: bool,
}

/// Mock generator with a scripted reply queue.
///
/// Scripted replies are consumed in order; once the queue is empty the
/// default reply is returned. Every call is recorded for assertions.
pub struct MockGenerator {
    replies: Mutex<VecDeque<DomainResult<String>>>,
    default_reply: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::with_default_reply(DEFAULT_REPLY)
    }

    /// Mock whose unscripted calls return the given reply.
    pub fn with_default_reply(reply: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply for the next call.
    pub async fn enqueue(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(reply.into()));
    }

    /// Queue a backend failure for the next call.
    pub async fn enqueue_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .await
            .push_back(Err(DomainError::Backend(message.into())));
    }

    /// All calls recorded so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Number of `generate` invocations so far.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, prompt: &str, options: GenerateOptions) -> DomainResult<String> {
        self.calls.lock().await.push(RecordedCall {
            prompt: prompt.to_string(),
            json_mode: options.json_mode,
        });

        match self.replies.lock().await.pop_front() {
            Some(reply) => reply,
            None => Ok(self.default_reply.clone()),
        }
    }
}
