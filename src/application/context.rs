//! Application context: owns the configured backends for a run.
//!
//! Built once from a validated configuration and passed explicitly to
//! command handlers; components live for the duration of the process
//! and are released at shutdown.

use std::sync::Arc;

use crate::adapters;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Answer, Config};
use crate::domain::ports::{effective_text, Encoder, VectorStore};
use crate::services::{Assistant, Indexer};

/// Instruction used when a turn carries an image but no text.
const DEFAULT_INSTRUCTION: &str = "Describe this image and find similar items.";

/// The wired-up application: encoder, store, and assistant.
pub struct AppContext {
    encoder: Arc<dyn Encoder>,
    store: Arc<dyn VectorStore>,
    assistant: Assistant,
    config: Config,
}

impl AppContext {
    /// Resolve every configured backend. Fails fast: an unusable
    /// backend halts startup before any index or query work.
    pub async fn from_config(config: Config) -> DomainResult<Self> {
        let encoder = adapters::encoders::build(&config.encoder)?;
        let store = adapters::stores::build(&config.store).await?;
        let generator = adapters::generators::build(&config.llm)?;
        let assistant = Assistant::with_top_k(generator, config.query.rerank_top_k);

        tracing::info!(
            "Backends ready: encoder={}, store={}",
            encoder.name(),
            store.name()
        );

        Ok(Self {
            encoder,
            store,
            assistant,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Indexing driver over this context's encoder and store.
    pub fn indexer(&self) -> Indexer {
        Indexer::new(
            self.encoder.clone(),
            self.store.clone(),
            self.config.indexing.batch_size,
        )
    }

    /// Run one question-answering turn: encode, search, answer.
    ///
    /// At least one of `image` / `text` is required; backend failures
    /// propagate as errors.
    pub async fn query(&self, image: Option<&str>, text: Option<&str>) -> DomainResult<Answer> {
        let vector = self.encoder.encode(image, text).await?;
        let candidates = self
            .store
            .search(&vector, self.config.query.search_top_k)
            .await?;

        tracing::debug!("Retrieved {} candidates", candidates.len());

        let instruction = effective_text(text).unwrap_or(DEFAULT_INSTRUCTION);
        self.assistant
            .answer(instruction, candidates, image, text)
            .await
    }

    /// Release backend resources at shutdown.
    pub async fn shutdown(&self) -> DomainResult<()> {
        self.store.release().await
    }
}
