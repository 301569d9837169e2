//! Property-based tests for embedding invariants.
//!
//! 1. Normalization: ||l2_normalize(v)|| = 1 for non-degenerate v
//! 2. Fusion law: fuse(a, b) has unit norm and equals normalize(a + b)
//! 3. Encoder law: every encode() mode yields a unit vector

use mrag::adapters::encoders::HashedEncoder;
use mrag::domain::ports::{fuse_normalized, l2_normalize, Encoder};
use proptest::prelude::*;

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

/// Vectors with a norm safely away from zero.
fn non_degenerate_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0f32, dim..=dim)
        .prop_filter("vector must be non-degenerate", |v| norm(v) > 1e-3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_normalize_yields_unit_norm(mut v in non_degenerate_vector(32)) {
        l2_normalize(&mut v);
        prop_assert!((norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn prop_fusion_yields_unit_norm(
        a in non_degenerate_vector(32),
        b in non_degenerate_vector(32),
    ) {
        // Skip near-cancelling pairs where the sum is degenerate
        let sum: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| x + y).collect();
        prop_assume!(norm(&sum) > 1e-3);

        let fused = fuse_normalized(&a, &b);
        prop_assert!((norm(&fused) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn prop_fusion_matches_normalized_sum(
        a in non_degenerate_vector(16),
        b in non_degenerate_vector(16),
    ) {
        let mut sum: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| x + y).collect();
        prop_assume!(norm(&sum) > 1e-3);
        l2_normalize(&mut sum);

        let fused = fuse_normalized(&a, &b);
        for (x, y) in fused.iter().zip(sum.iter()) {
            prop_assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn prop_hashed_encoder_always_unit_norm(
        image in "[a-z0-9/._-]{1,40}",
        text in "[a-zA-Z0-9 ]{1,60}",
    ) {
        prop_assume!(!text.trim().is_empty());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let encoder = HashedEncoder::new(48);

        let image_only = runtime
            .block_on(encoder.encode(Some(&image), None))
            .expect("image-only encode");
        let text_only = runtime
            .block_on(encoder.encode(None, Some(&text)))
            .expect("text-only encode");
        let fused = runtime
            .block_on(encoder.encode(Some(&image), Some(&text)))
            .expect("fused encode");

        for vector in [&image_only, &text_only, &fused] {
            prop_assert_eq!(vector.len(), 48);
            prop_assert!((norm(vector) - 1.0).abs() < 1e-4);
        }
    }
}
