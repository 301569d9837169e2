use serde::{Deserialize, Serialize};

/// Main configuration structure for mrag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Encoder backend selection and parameters
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Vector store backend selection and parameters
    #[serde(default)]
    pub store: StoreConfig,

    /// Generation (LLM) backend selection and credentials
    #[serde(default)]
    pub llm: LlmConfig,

    /// Indexing pipeline configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Query pipeline configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
            indexing: IndexingConfig::default(),
            query: QueryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Encoder backend, resolved once at startup.
///
/// The `type` tag selects the variant; unknown tags fail configuration
/// loading before any index or query work runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderConfig {
    /// CLIP vision+text towers running locally via candle.
    Clip {
        /// HuggingFace model repository
        #[serde(default = "default_clip_model")]
        model_id: String,

        /// Repository revision carrying safetensors weights
        #[serde(default = "default_clip_revision")]
        revision: String,

        /// Embedding dimension of the projection head
        #[serde(default = "default_clip_dimension")]
        dimension: usize,
    },

    /// Deterministic hash-based vectors for development and tests.
    Hashed {
        /// Embedding dimension
        #[serde(default = "default_hashed_dimension")]
        dimension: usize,
    },
}

fn default_clip_model() -> String {
    "openai/clip-vit-base-patch32".to_string()
}

fn default_clip_revision() -> String {
    // Upstream revision that ships model.safetensors
    "refs/pr/15".to_string()
}

const fn default_clip_dimension() -> usize {
    512
}

const fn default_hashed_dimension() -> usize {
    384
}

impl EncoderConfig {
    /// Configured embedding dimension.
    pub fn dimension(&self) -> usize {
        match self {
            Self::Clip { dimension, .. } | Self::Hashed { dimension } => *dimension,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::Clip {
            model_id: default_clip_model(),
            revision: default_clip_revision(),
            dimension: default_clip_dimension(),
        }
    }
}

/// Vector store backend, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-backed flat index: artifact file plus JSON metadata sidecar.
    Flat {
        /// Path of the serialized index artifact
        #[serde(default = "default_index_path")]
        index_path: String,

        /// Path of the JSON metadata sidecar
        #[serde(default = "default_metadata_path")]
        metadata_path: String,

        /// Vector dimension all entries must share
        #[serde(default = "default_clip_dimension")]
        dimension: usize,
    },

    /// Remote store speaking the Qdrant REST API.
    Http {
        /// Base URL of the service
        #[serde(default = "default_store_url")]
        url: String,

        /// Collection name
        #[serde(default = "default_collection")]
        collection: String,

        /// Vector dimension all entries must share
        #[serde(default = "default_clip_dimension")]
        dimension: usize,

        /// Request timeout in seconds
        #[serde(default = "default_store_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_index_path() -> String {
    ".mrag/index.bin".to_string()
}

fn default_metadata_path() -> String {
    ".mrag/metadata.json".to_string()
}

fn default_store_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "mrag_items".to_string()
}

const fn default_store_timeout_secs() -> u64 {
    30
}

impl StoreConfig {
    /// Configured vector dimension.
    pub fn dimension(&self) -> usize {
        match self {
            Self::Flat { dimension, .. } | Self::Http { dimension, .. } => *dimension,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Flat {
            index_path: default_index_path(),
            metadata_path: default_metadata_path(),
            dimension: default_clip_dimension(),
        }
    }
}

/// Generation backend, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmConfig {
    /// OpenAI Chat Completions API.
    Openai {
        /// Model name
        #[serde(default = "default_openai_model")]
        model: String,

        /// API key (falls back to OPENAI_API_KEY)
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,

        /// Base URL override (falls back to OPENAI_BASE_URL, then the
        /// public endpoint)
        #[serde(skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },

    /// Azure OpenAI deployment.
    Azure {
        /// Deployment/model name
        model: String,

        /// API key (falls back to AZURE_OPENAI_KEY)
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,

        /// Resource endpoint, e.g. `https://myresource.openai.azure.com`
        endpoint: String,

        /// API version query parameter
        #[serde(default = "default_azure_api_version")]
        api_version: String,
    },

    /// Any OpenAI-compatible endpoint (self-hosted, gateway, ...).
    Custom {
        /// Model name
        model: String,

        /// API key
        api_key: String,

        /// Base URL, e.g. `https://api.groq.com/openai/v1`
        base_url: String,
    },

    /// Canned responses, for offline runs and tests.
    Mock {
        /// Fixed reply returned for every call
        #[serde(skip_serializing_if = "Option::is_none")]
        reply: Option<String>,
    },
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_azure_api_version() -> String {
    "2024-02-01".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::Openai {
            model: default_openai_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Indexing pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexingConfig {
    /// Rows encoded and written per sequential batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

const fn default_batch_size() -> usize {
    32
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Query pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryConfig {
    /// Nearest neighbors retrieved per query
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// Reranked candidates forwarded to final answer generation
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: usize,
}

const fn default_search_top_k() -> usize {
    5
}

const fn default_rerank_top_k() -> usize {
    3
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            search_top_k: default_search_top_k(),
            rerank_top_k: default_rerank_top_k(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
