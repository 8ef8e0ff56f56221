//! Configuration system for rfp-distill
//!
//! Supports loading configuration from:
//! 1. CLI --config argument
//! 2. ~/.config/rfp-distill/config.{DISTILL_ENV}.json
//! 3. Default values
//!
//! Where DISTILL_ENV can be: production (default), development, test
//!
//! # Examples
//!
//! ```no_run
//! use rfp_distill::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! println!("edge percentile: {}", config.summarizer.edge_percentile);
//!
//! let config = AppConfig::load(Some("./distill.json".as_ref()))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variables
//!
//! Environment variables override config file values:
//! - DISTILL_EDGE_PERCENTILE
//! - DISTILL_ASPECT_PERCENTILE
//! - DISTILL_CENTRALITY_PERCENTILE
//! - DISTILL_PRICING_PERCENTILE
//! - DISTILL_ASPECT_STORE
//! - DISTILL_OUTPUT_DIR

use crate::summarizer::aspects::ScoringWeights;
use crate::summarizer::segmenter::SegmentationStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// How passages are chosen from the main stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStrategy {
    /// Similarity graph, communities, aspect-scored clusters
    #[default]
    Clustered,
    /// Per-aspect percentile over passages, no graph
    AspectDirect,
}

impl std::fmt::Display for SummaryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clustered => write!(f, "clustered"),
            Self::AspectDirect => write!(f, "aspect_direct"),
        }
    }
}

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    FastEmbed,
    Hashing,
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FastEmbed => write!(f, "fastembed"),
            Self::Hashing => write!(f, "hashing"),
        }
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastembed" => Ok(Self::FastEmbed),
            "hashing" => Ok(Self::Hashing),
            _ => Err(ConfigError::ValidationError(format!(
                "Unknown embedding backend: {}",
                s
            ))),
        }
    }
}

/// Algorithm knobs for one summarization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Segmentation (and matching normalization)
    #[serde(default)]
    pub segmentation: SegmentationStrategy,

    /// Shortest paragraph-aware passage, in characters
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    /// Longest paragraph-aware passage before windowing, in characters
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Window length for fixed-width segmentation
    #[serde(default = "default_chunk_len")]
    pub chunk_len: usize,

    /// Percentile of pairwise similarity required for a graph edge
    #[serde(default = "default_edge_percentile")]
    pub edge_percentile: f32,

    /// Percentile of cluster scores required for a cluster to be kept
    #[serde(default = "default_aspect_percentile")]
    pub aspect_percentile: f32,

    /// Percentile of centroid similarity required inside a cluster
    #[serde(default = "default_centrality_percentile")]
    pub centrality_percentile: f32,

    /// Percentile of centroid similarity required for money passages
    #[serde(default)]
    pub pricing_percentile: f32,

    /// Clusters this small keep all their passages
    #[serde(default = "default_tiny_cluster_size")]
    pub tiny_cluster_size: usize,

    /// A passage is isolated if every in-cluster similarity is below this
    #[serde(default = "default_mmr_isolation_threshold")]
    pub mmr_isolation_threshold: f32,

    /// Cluster scoring blend used when a description is supplied
    #[serde(default)]
    pub weights: ScoringWeights,

    #[serde(default)]
    pub strategy: SummaryStrategy,

    /// Per-aspect percentile for the direct strategy
    #[serde(default = "default_aspect_percentile")]
    pub aspect_direct_percentile: f32,

    /// Cap per aspect for the direct strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_direct_top_k: Option<usize>,

    /// Shuffle seed for community detection
    #[serde(default = "default_partition_seed")]
    pub partition_seed: u64,
}

fn default_min_len() -> usize {
    200
}

fn default_max_len() -> usize {
    500
}

fn default_chunk_len() -> usize {
    300
}

fn default_edge_percentile() -> f32 {
    75.0
}

fn default_aspect_percentile() -> f32 {
    90.0
}

fn default_centrality_percentile() -> f32 {
    80.0
}

fn default_tiny_cluster_size() -> usize {
    1
}

fn default_mmr_isolation_threshold() -> f32 {
    0.1
}

fn default_partition_seed() -> u64 {
    42
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationStrategy::default(),
            min_len: default_min_len(),
            max_len: default_max_len(),
            chunk_len: default_chunk_len(),
            edge_percentile: default_edge_percentile(),
            aspect_percentile: default_aspect_percentile(),
            centrality_percentile: default_centrality_percentile(),
            pricing_percentile: 0.0,
            tiny_cluster_size: default_tiny_cluster_size(),
            mmr_isolation_threshold: default_mmr_isolation_threshold(),
            weights: ScoringWeights::default(),
            strategy: SummaryStrategy::default(),
            aspect_direct_percentile: default_aspect_percentile(),
            aspect_direct_top_k: None,
            partition_seed: default_partition_seed(),
        }
    }
}

fn check_percentile(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be between 0 and 100, got {}",
            name, value
        )));
    }
    Ok(())
}

impl SummarizerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_percentile("edge_percentile", self.edge_percentile)?;
        check_percentile("aspect_percentile", self.aspect_percentile)?;
        check_percentile("centrality_percentile", self.centrality_percentile)?;
        check_percentile("pricing_percentile", self.pricing_percentile)?;
        check_percentile("aspect_direct_percentile", self.aspect_direct_percentile)?;

        if self.min_len == 0 || self.min_len > self.max_len {
            return Err(ConfigError::ValidationError(format!(
                "min_len must be in 1..=max_len, got min_len={} max_len={}",
                self.min_len, self.max_len
            )));
        }

        if self.chunk_len == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_len must be greater than 0".to_string(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.mmr_isolation_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "mmr_isolation_threshold must be between -1 and 1, got {}",
                self.mmr_isolation_threshold
            )));
        }

        let w = self.weights;
        for (name, value) in [("title", w.title), ("description", w.description), ("aspect", w.aspect)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "weights.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.aspect_direct_top_k == Some(0) {
            return Err(ConfigError::ValidationError(
                "aspect_direct_top_k must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Timeout for one embedding batch, in seconds
    #[serde(default = "default_embed_timeout")]
    pub timeout_secs: u64,

    /// Vector size for the hashing backend
    #[serde(default = "default_hashing_dimension")]
    pub hashing_dimension: usize,
}

fn default_embed_timeout() -> u64 {
    120
}

fn default_hashing_dimension() -> usize {
    crate::embedding::DEFAULT_HASHING_DIMENSION
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            timeout_secs: default_embed_timeout(),
            hashing_dimension: default_hashing_dimension(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Aspect store file (defaults to the data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_store_path: Option<PathBuf>,

    /// Where summaries are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("summaries")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            summarizer: SummarizerConfig::default(),
            embedding: EmbeddingConfig::default(),
            aspect_store_path: None,
            output_dir: default_output_dir(),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration with standard priority:
    /// 1. Explicit path
    /// 2. ~/.config/rfp-distill/config.{DISTILL_ENV}.json
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if path.exists() {
                tracing::info!("Loading config from: {:?}", path);
                return Self::from_file(path);
            } else {
                return Err(ConfigError::ValidationError(format!(
                    "Config file not found: {:?}",
                    path
                )));
            }
        }

        let env = std::env::var("DISTILL_ENV").unwrap_or_else(|_| "production".to_string());

        if let Some(config_dir) = Self::config_dir() {
            let config_path = config_dir.join(format!("config.{}.json", env));
            if config_path.exists() {
                tracing::info!("Loading config from: {:?}", config_path);
                return Self::from_file(&config_path);
            }
        }

        tracing::info!("Using default configuration with environment overrides");
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        let s = &mut self.summarizer;
        override_f32("DISTILL_EDGE_PERCENTILE", &mut s.edge_percentile);
        override_f32("DISTILL_ASPECT_PERCENTILE", &mut s.aspect_percentile);
        override_f32("DISTILL_CENTRALITY_PERCENTILE", &mut s.centrality_percentile);
        override_f32("DISTILL_PRICING_PERCENTILE", &mut s.pricing_percentile);

        if let Ok(path) = std::env::var("DISTILL_ASPECT_STORE") {
            self.aspect_store_path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("DISTILL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.summarizer.validate()?;

        if self.embedding.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.embedding.hashing_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.hashing_dimension must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rfp-distill"))
    }

    /// Aspect store location: configured path or `<data_dir>/rfp-distill/aspects.bin`
    pub fn aspect_store_path(&self) -> PathBuf {
        self.aspect_store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("rfp-distill"))
                .unwrap_or_else(|| PathBuf::from("."))
                .join("aspects.bin")
        })
    }

    /// Embedding call timeout
    pub fn embed_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.embedding.timeout_secs)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn override_f32(var: &str, target: &mut f32) {
    if let Ok(raw) = std::env::var(var) {
        match raw.trim().parse::<f32>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", var, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.summarizer.strategy, SummaryStrategy::Clustered);
        assert_eq!(config.summarizer.segmentation, SegmentationStrategy::Paragraph);
        assert_eq!(config.embedding.backend, EmbeddingBackend::FastEmbed);
    }

    #[test]
    fn test_summarizer_validation() {
        let mut config = SummarizerConfig::default();
        assert!(config.validate().is_ok());

        config.edge_percentile = 101.0;
        assert!(config.validate().is_err());

        config.edge_percentile = 75.0;
        config.min_len = 600;
        assert!(config.validate().is_err());

        config.min_len = 200;
        config.weights.description = -1.0;
        assert!(config.validate().is_err());

        config.weights.description = 4.0;
        config.mmr_isolation_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("fastembed".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::FastEmbed);
        assert_eq!("HASHING".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Hashing);
        assert!("invalid".parse::<EmbeddingBackend>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "summarizer": { "edge_percentile": 90, "segmentation": "fixed_width" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.summarizer.edge_percentile, 90.0);
        assert_eq!(config.summarizer.segmentation, SegmentationStrategy::FixedWidth);
        assert_eq!(config.summarizer.min_len, 200);
        assert_eq!(config.summarizer.weights, ScoringWeights::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.summarizer.strategy = SummaryStrategy::AspectDirect;
        config.summarizer.aspect_direct_top_k = Some(5);
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.summarizer.strategy, SummaryStrategy::AspectDirect);
        assert_eq!(loaded.summarizer.aspect_direct_top_k, Some(5));
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/distill.json"))).is_err());
    }
}
