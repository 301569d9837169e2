//! File-backed flat vector store.
//!
//! Brute-force squared-Euclidean scan over an in-memory table,
//! persisted as a binary index artifact plus a JSON-array metadata
//! sidecar. The two files are positionally aligned: row `i` of the
//! artifact pairs with element `i` of the sidecar.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, Metadata};
use crate::domain::ports::VectorStore;

use async_trait::async_trait;

/// Serialized index artifact.
#[derive(Debug, Serialize, Deserialize)]
struct IndexArtifact {
    dimension: usize,
    /// Row-major vector table, `rows * dimension` values.
    vectors: Vec<f32>,
}

/// In-memory state, lazily reloaded from disk after `release`.
#[derive(Debug, Default)]
struct FlatState {
    vectors: Vec<f32>,
    metadata: Vec<Metadata>,
}

impl FlatState {
    fn rows(&self) -> usize {
        self.metadata.len()
    }
}

/// Flat file-backed vector store.
pub struct FlatStore {
    index_path: PathBuf,
    metadata_path: PathBuf,
    dimension: usize,
    state: RwLock<Option<FlatState>>,
}

impl FlatStore {
    /// Open (or create) the store at the given paths.
    pub fn open(
        index_path: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
        dimension: usize,
    ) -> DomainResult<Self> {
        let mut store = Self {
            index_path: index_path.into(),
            metadata_path: metadata_path.into(),
            dimension,
            state: RwLock::new(None),
        };
        let state = store.load_or_create()?;
        store.state = RwLock::new(Some(state));
        Ok(store)
    }

    /// Load both files, creating a fresh empty collection when the
    /// artifact is missing or its dimension does not match.
    fn load_or_create(&self) -> DomainResult<FlatState> {
        if self.index_path.exists() {
            let bytes = std::fs::read(&self.index_path)?;
            let artifact: IndexArtifact = bincode::deserialize(&bytes)
                .map_err(|e| DomainError::Serialization(format!("Corrupt index artifact: {e}")))?;

            if artifact.dimension == self.dimension {
                let metadata = if self.metadata_path.exists() {
                    serde_json::from_slice(&std::fs::read(&self.metadata_path)?)?
                } else {
                    Vec::new()
                };
                return Ok(FlatState {
                    vectors: artifact.vectors,
                    metadata,
                });
            }

            tracing::warn!(
                "Index dimension ({}) does not match configuration ({}); creating a new index",
                artifact.dimension,
                self.dimension
            );
        }

        let state = FlatState::default();
        self.persist(&state)?;
        Ok(state)
    }

    /// Write both files, creating parent directories as needed.
    fn persist(&self, state: &FlatState) -> DomainResult<()> {
        create_parent_dir(&self.index_path)?;
        create_parent_dir(&self.metadata_path)?;

        let artifact = IndexArtifact {
            dimension: self.dimension,
            vectors: state.vectors.clone(),
        };
        let bytes = bincode::serialize(&artifact)
            .map_err(|e| DomainError::Serialization(format!("Failed to encode index: {e}")))?;
        std::fs::write(&self.index_path, bytes)?;
        std::fs::write(
            &self.metadata_path,
            serde_json::to_vec_pretty(&state.metadata)?,
        )?;
        Ok(())
    }

    /// Reload from disk if `release` dropped the in-memory copy.
    async fn ensure_loaded(&self) -> DomainResult<()> {
        let mut guard = self.state.write().await;
        if guard.is_none() {
            *guard = Some(self.load_or_create()?);
        }
        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> DomainResult<()> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(DomainError::InvalidInput(format!(
                "Vector dimension {} does not match store dimension {}",
                vector.len(),
                self.dimension
            )))
        }
    }
}

fn create_parent_dir(path: &Path) -> DomainResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[async_trait]
impl VectorStore for FlatStore {
    fn name(&self) -> &'static str {
        "flat"
    }

    async fn add(&self, vectors: &[Vec<f32>], metadata: &[Metadata]) -> DomainResult<()> {
        if vectors.len() != metadata.len() {
            return Err(DomainError::InvalidInput(format!(
                "Vectors ({}) and metadata ({}) must be equal-length parallel sequences",
                vectors.len(),
                metadata.len()
            )));
        }
        for vector in vectors {
            self.check_dimension(vector)?;
        }
        if vectors.is_empty() {
            return Ok(());
        }

        self.ensure_loaded().await?;
        let mut guard = self.state.write().await;
        let state = guard.get_or_insert_with(FlatState::default);
        for (vector, meta) in vectors.iter().zip(metadata.iter()) {
            state.vectors.extend_from_slice(vector);
            state.metadata.push(meta.clone());
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<Candidate>> {
        self.check_dimension(vector)?;
        self.ensure_loaded().await?;

        let guard = self.state.read().await;
        let Some(state) = guard.as_ref() else {
            return Ok(Vec::new());
        };
        if state.rows() == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = (0..state.rows())
            .map(|row| {
                let start = row * self.dimension;
                let candidate = &state.vectors[start..start + self.dimension];
                (row, squared_l2(vector, candidate))
            })
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(top_k);

        // Distances stay internal: this backend reports metadata only,
        // ordered nearest first.
        Ok(scored
            .into_iter()
            .map(|(row, _)| Candidate::new(state.metadata[row].clone()))
            .collect())
    }

    async fn delete_collection(&self) -> DomainResult<()> {
        let mut guard = self.state.write().await;

        if self.index_path.exists() {
            std::fs::remove_file(&self.index_path)?;
        }
        if self.metadata_path.exists() {
            std::fs::remove_file(&self.metadata_path)?;
        }

        let state = FlatState::default();
        self.persist(&state)?;
        *guard = Some(state);

        tracing::info!("Flat index cleared and reinitialized");
        Ok(())
    }

    async fn build_index(&self) -> DomainResult<()> {
        self.ensure_loaded().await?;
        let guard = self.state.read().await;
        if let Some(state) = guard.as_ref() {
            self.persist(state)?;
            tracing::info!("Flat index persisted ({} items)", state.rows());
        }
        Ok(())
    }

    async fn release(&self) -> DomainResult<()> {
        let mut guard = self.state.write().await;
        *guard = None;
        tracing::debug!("Flat index released from memory");
        Ok(())
    }
}
