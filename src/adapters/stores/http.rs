//! Remote vector store adapter speaking the Qdrant REST API.
//!
//! Metadata rides along as the point payload, so vectors and their
//! records stay paired on the server side. Distances reported by the
//! backend (Euclidean metric) are attached to returned candidates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, Metadata};
use crate::domain::ports::VectorStore;

/// Remote HTTP vector store.
pub struct HttpStore {
    base_url: String,
    collection: String,
    dimension: usize,
    client: reqwest::Client,
}

impl HttpStore {
    /// Connect to the service and ensure the collection exists.
    pub async fn connect(
        url: &str,
        collection: &str,
        dimension: usize,
        timeout_secs: u64,
    ) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DomainError::Backend(format!("Failed to build HTTP client: {e}")))?;

        let store = Self {
            base_url: url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            dimension,
            client,
        };
        store.ensure_collection().await?;
        Ok(store)
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{suffix}", self.base_url, self.collection)
    }

    async fn ensure_collection(&self) -> DomainResult<()> {
        let response = self.client.get(self.collection_url("")).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => self.create_collection().await,
            status => {
                let body = read_body(response).await;
                Err(DomainError::Backend(format!(
                    "Vector store returned {status}: {body}"
                )))
            }
        }
    }

    async fn create_collection(&self) -> DomainResult<()> {
        let request = CreateCollectionRequest {
            vectors: VectorParams {
                size: self.dimension,
                distance: "Euclid".to_string(),
            },
        };
        let response = self
            .client
            .put(self.collection_url(""))
            .json(&request)
            .send()
            .await?;
        expect_success(response).await?;
        tracing::info!(
            "Created collection '{}' (dimension {})",
            self.collection,
            self.dimension
        );
        Ok(())
    }

    async fn point_count(&self) -> DomainResult<u64> {
        let response = self
            .client
            .post(self.collection_url("/points/count"))
            .json(&CountRequest { exact: true })
            .send()
            .await?;
        let response = expect_success(response).await?;
        let parsed: CountResponse = response.json().await?;
        Ok(parsed.result.count)
    }
}

#[async_trait]
impl VectorStore for HttpStore {
    fn name(&self) -> &'static str {
        "http"
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
            if vector.len() != self.dimension {
                return Err(DomainError::InvalidInput(format!(
                    "Vector dimension {} does not match store dimension {}",
                    vector.len(),
                    self.dimension
                )));
            }
        }
        if vectors.is_empty() {
            return Ok(());
        }

        // Sequential ids continue from the current collection size;
        // the single-writer model makes this race-free.
        let next_id = self.point_count().await?;
        let points: Vec<PointStruct> = vectors
            .iter()
            .zip(metadata.iter())
            .enumerate()
            .map(|(offset, (vector, meta))| PointStruct {
                id: next_id + offset as u64,
                vector: vector.clone(),
                payload: meta.clone(),
            })
            .collect();

        let response = self
            .client
            .put(format!("{}?wait=true", self.collection_url("/points")))
            .json(&UpsertPointsRequest { points })
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<Candidate>> {
        let request = SearchRequest {
            vector: vector.to_vec(),
            limit: top_k,
            with_payload: true,
        };
        let response = self
            .client
            .post(self.collection_url("/points/search"))
            .json(&request)
            .send()
            .await?;
        let response = expect_success(response).await?;
        let parsed: SearchResponse = response.json().await?;

        Ok(parsed
            .result
            .into_iter()
            .map(|point| Candidate::with_distance(point.payload.unwrap_or_default(), point.score))
            .collect())
    }

    async fn delete_collection(&self) -> DomainResult<()> {
        let response = self
            .client
            .delete(self.collection_url(""))
            .send()
            .await?;
        // A missing collection is already deleted
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            let status = response.status();
            let body = read_body(response).await;
            return Err(DomainError::Backend(format!(
                "Vector store returned {status}: {body}"
            )));
        }

        self.create_collection().await
    }

    async fn build_index(&self) -> DomainResult<()> {
        // The server indexes incrementally
        Ok(())
    }

    async fn release(&self) -> DomainResult<()> {
        tracing::debug!("Collection '{}' left to the server's cache", self.collection);
        Ok(())
    }
}

async fn expect_success(response: reqwest::Response) -> DomainResult<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = read_body(response).await;
        Err(DomainError::Backend(format!(
            "Vector store returned {status}: {body}"
        )))
    }
}

async fn read_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string())
}

// -- REST request/response types --

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Serialize)]
struct CountRequest {
    exact: bool,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Debug, Serialize)]
struct UpsertPointsRequest {
    points: Vec<PointStruct>,
}

#[derive(Debug, Serialize)]
struct PointStruct {
    id: u64,
    vector: Vec<f32>,
    payload: Metadata,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Metadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn connect_with_existing_collection(server: &mockito::ServerGuard) -> HttpStore {
        HttpStore::connect(&server.url(), "items", 2, 5).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_creates_missing_collection() {
        let mut server = mockito::Server::new_async().await;
        let probe = server
            .mock("GET", "/collections/items")
            .with_status(404)
            .create_async()
            .await;
        let create = server
            .mock("PUT", "/collections/items")
            .with_status(200)
            .with_body(r#"{"result": true}"#)
            .create_async()
            .await;

        let store = HttpStore::connect(&server.url(), "items", 2, 5).await.unwrap();
        assert_eq!(store.name(), "http");

        probe.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_attaches_distances() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/items")
            .with_status(200)
            .with_body(r#"{"result": {}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/collections/items/points/search")
            .with_status(200)
            .with_body(
                json!({
                    "result": [
                        {"id": 0, "score": 0.12, "payload": {"url": "https://x/a.jpg", "desc": "near"}},
                        {"id": 1, "score": 0.57, "payload": {"url": "https://x/b.jpg", "desc": "far"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = connect_with_existing_collection(&server).await;
        let results = store.search(&[1.0, 0.0], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].field_str("desc"), Some("near"));
        assert!((results[0].distance.unwrap() - 0.12).abs() < 1e-6);
        assert!((results[1].distance.unwrap() - 0.57).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_add_length_mismatch_fails_before_any_call() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/items")
            .with_status(200)
            .with_body(r#"{"result": {}}"#)
            .create_async()
            .await;

        let store = connect_with_existing_collection(&server).await;
        let mut meta = Metadata::new();
        meta.insert("url".to_string(), json!("https://x/a.jpg"));

        let result = store.add(&[vec![0.0, 1.0]], &[meta.clone(), meta]).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_backend_error_status_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/collections/items")
            .with_status(200)
            .with_body(r#"{"result": {}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/collections/items/points/search")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let store = connect_with_existing_collection(&server).await;
        let result = store.search(&[1.0, 0.0], 2).await;
        assert!(matches!(result, Err(DomainError::Backend(_))));
    }
}
