//! Encoder port for multimodal embedding generation.
//!
//! Defines the trait for encoders that map an image reference and/or a
//! text snippet to an L2-normalized dense vector, plus the pure fusion
//! helpers shared by all implementations.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for multimodal encoders.
///
/// At least one of `image` / `text` must be provided; blank text (empty
/// after trimming) counts as absent. When both are given, the two
/// embeddings are fused by elementwise addition and renormalization.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encoder name (e.g., "clip", "hashed").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this encoder.
    fn dimension(&self) -> usize;

    /// Encode an image reference (URL or path) and/or a text snippet
    /// into a unit-length vector.
    async fn encode(&self, image: Option<&str>, text: Option<&str>) -> DomainResult<Vec<f32>>;
}

/// Text that survives trimming, or `None`.
pub fn effective_text(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Normalize a vector to unit L2 length in place.
///
/// Degenerate (near-zero) vectors are left untouched rather than
/// divided by ~0.
pub fn l2_normalize(vector: &mut [f32]) {
    // f64 accumulation avoids precision loss over many dimensions
    let norm = vector
        .iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt();
    #[allow(clippy::cast_possible_truncation)]
    let norm = norm as f32;
    if norm > 1e-10 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Fuse two embeddings by elementwise sum, then renormalize to unit
/// length.
///
/// This is the fixed image+text fusion rule: sum-then-renormalize, not
/// an average or weighted combination.
pub fn fuse_normalized(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut fused: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| x + y).collect();
    l2_normalize(&mut fused);
    fused
}
