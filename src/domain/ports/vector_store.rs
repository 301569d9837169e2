//! Vector store port - interface for similarity-search backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Candidate, Metadata};

/// Trait for vector store backends.
///
/// Capabilities are uniform across backends. Vectors and metadata are
/// always written as parallel, equal-length sequences so every
/// persisted vector has exactly one metadata record.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store backend name (e.g., "flat", "http").
    fn name(&self) -> &'static str;

    /// Append vectors and their metadata records.
    ///
    /// Fails if the two sequences differ in length or any vector does
    /// not match the store's configured dimension.
    async fn add(&self, vectors: &[Vec<f32>], metadata: &[Metadata]) -> DomainResult<()>;

    /// Return up to `top_k` nearest neighbors, nearest first.
    ///
    /// Returns an empty sequence when the store is empty, and fewer
    /// than `top_k` results when the store holds fewer items.
    async fn search(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<Candidate>>;

    /// Irreversibly clear all vectors and metadata, then reinitialize
    /// an empty, searchable collection.
    async fn delete_collection(&self) -> DomainResult<()>;

    /// Finalize/persist after a batch of additions. May be a no-op for
    /// backends that index incrementally.
    async fn build_index(&self) -> DomainResult<()>;

    /// Best-effort memory reclamation. Safe to call even if nothing
    /// was loaded.
    async fn release(&self) -> DomainResult<()>;
}
