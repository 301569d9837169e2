//! Application layer: context wiring and the per-turn query flow.

pub mod context;

pub use context::AppContext;
