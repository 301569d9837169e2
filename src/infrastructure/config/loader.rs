use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, LlmConfig, StoreConfig};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid search_top_k: {0}. Must be at least 1")]
    InvalidSearchTopK(usize),

    #[error("Invalid rerank_top_k: {0}. Must be at least 1")]
    InvalidRerankTopK(usize),

    #[error("Invalid vector dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Flat store paths cannot be empty")]
    EmptyStorePath,

    #[error("HTTP store url and collection cannot be empty")]
    EmptyStoreLocation,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .mrag/config.yaml (project config, created by init)
    /// 3. .mrag/local.yaml (project local overrides, optional)
    /// 4. Environment variables (`MRAG_`* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".mrag/config.yaml"))
            .merge(Yaml::file(".mrag/local.yaml"))
            .merge(Env::prefixed("MRAG_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        // Validate pipeline sizes
        if config.indexing.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(config.indexing.batch_size));
        }
        if config.query.search_top_k == 0 {
            return Err(ConfigError::InvalidSearchTopK(config.query.search_top_k));
        }
        if config.query.rerank_top_k == 0 {
            return Err(ConfigError::InvalidRerankTopK(config.query.rerank_top_k));
        }

        // Validate encoder/store dimensions
        if config.encoder.dimension() == 0 {
            return Err(ConfigError::InvalidDimension(config.encoder.dimension()));
        }
        match &config.store {
            StoreConfig::Flat {
                index_path,
                metadata_path,
                dimension,
            } => {
                if *dimension == 0 {
                    return Err(ConfigError::InvalidDimension(*dimension));
                }
                if index_path.is_empty() || metadata_path.is_empty() {
                    return Err(ConfigError::EmptyStorePath);
                }
            }
            StoreConfig::Http {
                url,
                collection,
                dimension,
                ..
            } => {
                if *dimension == 0 {
                    return Err(ConfigError::InvalidDimension(*dimension));
                }
                if url.is_empty() || collection.is_empty() {
                    return Err(ConfigError::EmptyStoreLocation);
                }
            }
        }

        if config.store.dimension() != config.encoder.dimension() {
            return Err(ConfigError::ValidationFailed(format!(
                "Store dimension ({}) must match encoder dimension ({})",
                config.store.dimension(),
                config.encoder.dimension()
            )));
        }

        // Validate LLM config
        if let LlmConfig::Azure { endpoint, .. } = &config.llm {
            if endpoint.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Azure LLM endpoint cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::EncoderConfig;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.indexing.batch_size, 32);
        assert_eq!(config.query.search_top_k, 5);
        assert_eq!(config.query.rerank_top_k, 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.encoder.dimension(), 512);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
encoder:
  type: hashed
  dimension: 128
store:
  type: flat
  index_path: /custom/index.bin
  metadata_path: /custom/metadata.json
  dimension: 128
llm:
  type: custom
  model: llama-3.1-8b
  api_key: secret
  base_url: https://api.example.com/v1
indexing:
  batch_size: 16
query:
  search_top_k: 10
  rerank_top_k: 5
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert!(matches!(
            config.encoder,
            EncoderConfig::Hashed { dimension: 128 }
        ));
        assert!(matches!(config.store, StoreConfig::Flat { .. }));
        assert!(matches!(config.llm, LlmConfig::Custom { .. }));
        assert_eq!(config.indexing.batch_size, 16);
        assert_eq!(config.query.search_top_k, 10);
        assert_eq!(config.query.rerank_top_k, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_unsupported_backend_type_fails_to_parse() {
        let yaml = r"
encoder:
  type: resnet
";
        let result: Result<Config, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let mut config = Config::default();
        config.indexing.batch_size = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidBatchSize(0))));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.query.search_top_k = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSearchTopK(0))
        ));

        let mut config = Config::default();
        config.query.rerank_top_k = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRerankTopK(0))
        ));
    }

    #[test]
    fn test_validate_empty_flat_store_paths() {
        let mut config = Config::default();
        config.store = StoreConfig::Flat {
            index_path: String::new(),
            metadata_path: String::new(),
            dimension: 512,
        };

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::EmptyStorePath)));
    }

    #[test]
    fn test_validate_dimension_mismatch() {
        let mut config = Config::default();
        config.encoder = EncoderConfig::Hashed { dimension: 384 };
        // store stays at the 512 default

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_empty_azure_endpoint() {
        let mut config = Config::default();
        config.llm = LlmConfig::Azure {
            model: "gpt-4o".to_string(),
            api_key: Some("key".to_string()),
            endpoint: String::new(),
            api_version: "2024-02-01".to_string(),
        };

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "indexing:\n  batch_size: 8\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "indexing:\n  batch_size: 64\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.indexing.batch_size, 64, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
