//! Adapter implementations of the domain ports.

pub mod encoders;
pub mod generators;
pub mod stores;
