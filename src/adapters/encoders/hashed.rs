//! Deterministic hash-based encoder for development and tests.
//!
//! Generates content-derived pseudo-embeddings: same input, same unit
//! vector, no model weights required. Not semantically meaningful.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::encoder::{effective_text, fuse_normalized, l2_normalize, Encoder};

/// Hash-based multimodal encoder.
///
/// The image and text inputs are embedded from distinct namespaces so
/// `encode(image=X)` and `encode(text=X)` do not collide.
pub struct HashedEncoder {
    dimension: usize,
}

impl HashedEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Deterministic unit vector derived from the source string.
    fn embed_source(&self, source: &str) -> Vec<f32> {
        let bytes = source.as_bytes();
        let mut embedding = vec![0.0f32; self.dimension];

        for (i, value) in embedding.iter_mut().enumerate() {
            let byte = if bytes.is_empty() {
                0
            } else {
                bytes[i % bytes.len()]
            };
            #[allow(clippy::cast_precision_loss)]
            {
                *value = ((byte as usize * 31 + i * 17) % 256) as f32 / 255.0 - 0.5;
            }
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl Encoder for HashedEncoder {
    fn name(&self) -> &'static str {
        "hashed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, image: Option<&str>, text: Option<&str>) -> DomainResult<Vec<f32>> {
        let image = image.filter(|s| !s.is_empty());
        let text = effective_text(text);

        match (image, text) {
            (Some(img), Some(txt)) => Ok(fuse_normalized(
                &self.embed_source(&format!("image:{img}")),
                &self.embed_source(&format!("text:{txt}")),
            )),
            (Some(img), None) => Ok(self.embed_source(&format!("image:{img}"))),
            (None, Some(txt)) => Ok(self.embed_source(&format!("text:{txt}"))),
            (None, None) => Err(DomainError::InvalidInput(
                "An image or non-blank text is required for encoding".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_deterministic() {
        let encoder = HashedEncoder::new(64);
        let a = encoder.encode(None, Some("kettle")).await.unwrap();
        let b = encoder.encode(None, Some("kettle")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unit_length_for_all_modes() {
        let encoder = HashedEncoder::new(64);

        let image_only = encoder.encode(Some("a.jpg"), None).await.unwrap();
        let text_only = encoder.encode(None, Some("a kettle")).await.unwrap();
        let fused = encoder.encode(Some("a.jpg"), Some("a kettle")).await.unwrap();

        for vector in [&image_only, &text_only, &fused] {
            assert_eq!(vector.len(), 64);
            assert!((norm(vector) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_image_and_text_namespaces_differ() {
        let encoder = HashedEncoder::new(64);
        let as_image = encoder.encode(Some("kettle"), None).await.unwrap();
        let as_text = encoder.encode(None, Some("kettle")).await.unwrap();
        assert_ne!(as_image, as_text);
    }

    #[tokio::test]
    async fn test_rejects_missing_inputs() {
        let encoder = HashedEncoder::new(64);
        assert!(matches!(
            encoder.encode(None, None).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            encoder.encode(Some(""), Some("  ")).await,
            Err(DomainError::InvalidInput(_))
        ));
    }
}
