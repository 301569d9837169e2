//! Vector store adapters and their constructor registry.

pub mod flat;
pub mod http;

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::StoreConfig;
use crate::domain::ports::VectorStore;

pub use flat::FlatStore;
pub use http::HttpStore;

/// Resolve the configured store variant to a concrete adapter.
///
/// Called exactly once at startup. The remote backend is probed here so
/// an unreachable service fails before any index/query work.
pub async fn build(config: &StoreConfig) -> DomainResult<Arc<dyn VectorStore>> {
    match config {
        StoreConfig::Flat {
            index_path,
            metadata_path,
            dimension,
        } => Ok(Arc::new(FlatStore::open(
            index_path,
            metadata_path,
            *dimension,
        )?)),
        StoreConfig::Http {
            url,
            collection,
            dimension,
            timeout_secs,
        } => Ok(Arc::new(
            HttpStore::connect(url, collection, *dimension, *timeout_secs).await?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_flat() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::Flat {
            index_path: dir.path().join("i.bin").display().to_string(),
            metadata_path: dir.path().join("m.json").display().to_string(),
            dimension: 4,
        };

        let store = build(&config).await.unwrap();
        assert_eq!(store.name(), "flat");
    }
}
