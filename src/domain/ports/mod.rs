//! Ports: trait seams between the domain and adapter implementations.

pub mod encoder;
pub mod generator;
pub mod vector_store;

pub use encoder::{effective_text, fuse_normalized, l2_normalize, Encoder};
pub use generator::{GenerateOptions, Generator};
pub use vector_store::VectorStore;
