//! Mrag - Multimodal Retrieval-Augmented Product QA
//!
//! Mrag encodes catalog images and text into vectors with CLIP, stores
//! them in a pluggable vector index, and answers queries by retrieving
//! nearest neighbors, reranking them with an LLM, and synthesizing a
//! grounded answer.
//!
//! # Architecture
//!
//! This crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Adapters** (`adapters`): encoder, vector store, and generator backends
//! - **Service Layer** (`services`): prompt building, rerank/answer orchestration, indexing
//! - **Application Layer** (`application`): context wiring and the per-turn query flow
//! - **Infrastructure Layer** (`infrastructure`): configuration loading
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use mrag::application::AppContext;
//! use mrag::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let context = AppContext::from_config(config).await?;
//!     let answer = context.query(None, Some("a safe toy sword")).await?;
//!     println!("{}", answer.answer_text);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::AppContext;
pub use domain::models::{
    Answer, Candidate, Config, EncoderConfig, LlmConfig, Metadata, StoreConfig,
};
pub use domain::ports::{Encoder, GenerateOptions, Generator, VectorStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Assistant, Indexer};
