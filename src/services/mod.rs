//! Service layer: prompt building, rerank/answer orchestration, and
//! the indexing pipeline.

pub mod assistant;
pub mod indexer;
pub mod json_extract;
pub mod prompts;

pub use assistant::{Assistant, DEFAULT_RERANK_TOP_K};
pub use indexer::{dataset_stats, read_dataset, DatasetStats, Indexer, DEFAULT_BATCH_SIZE};
pub use json_extract::extract_json_object;
pub use prompts::{answer_prompt, rerank_prompt};
