//! Encoder adapters and their constructor registry.

pub mod clip;
pub mod hashed;

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::EncoderConfig;
use crate::domain::ports::Encoder;

pub use clip::ClipEncoder;
pub use hashed::HashedEncoder;

/// Resolve the configured encoder variant to a concrete adapter.
///
/// Called exactly once at startup; an unloadable backend is a fatal
/// configuration-time failure.
pub fn build(config: &EncoderConfig) -> DomainResult<Arc<dyn Encoder>> {
    match config {
        EncoderConfig::Clip {
            model_id,
            revision,
            dimension,
        } => Ok(Arc::new(ClipEncoder::new(model_id, revision, *dimension)?)),
        EncoderConfig::Hashed { dimension } => Ok(Arc::new(HashedEncoder::new(*dimension))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hashed() {
        let encoder = build(&EncoderConfig::Hashed { dimension: 32 }).unwrap();
        assert_eq!(encoder.name(), "hashed");
        assert_eq!(encoder.dimension(), 32);
    }
}
