//! TOML-based configuration for ragline
//!
//! Every pipeline stage reads its knobs from `ragline.toml`. All sections are
//! optional; a missing section falls back to the defaults below, which match
//! the constants the pipeline has always used (400-word chunks, top-2
//! retrieval, 500-character context per chunk, 100 answer tokens).

use ragline_vector::DistanceMetric;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ragline.toml";

/// Root configuration structure loaded from ragline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Normalization Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Regex patterns for page artifacts removed before whitespace cleanup
    #[serde(default = "default_page_marker_patterns")]
    pub page_marker_patterns: Vec<String>,
}

fn default_page_marker_patterns() -> Vec<String> {
    vec![
        r"---\s*Page\s*\d+\s*---".to_string(),
        r"\bPage\s+\d+\b".to_string(),
    ]
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            page_marker_patterns: default_page_marker_patterns(),
        }
    }
}

// ============= Chunking Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Word budget per chunk (a single longer sentence may exceed it)
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Unpunctuated lines with at most this many words are headings
    #[serde(default = "default_heading_max_words")]
    pub heading_max_words: usize,

    /// Label used before the first heading is seen
    #[serde(default = "default_heading")]
    pub default_heading: String,
}

fn default_max_words() -> usize {
    400
}

fn default_heading_max_words() -> usize {
    10
}

fn default_heading() -> String {
    "General".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            heading_max_words: default_heading_max_words(),
            default_heading: default_heading(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Ollama `/api/embed`
    #[default]
    Ollama,
    /// In-process fastembed model (requires the `local-embeddings` feature)
    Fastembed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Texts sent per embedding request while indexing
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Query embeddings kept in the LRU cache (0 disables caching)
    #[serde(default = "default_query_cache_capacity")]
    pub query_cache_capacity: usize,
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_query_cache_capacity() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            base_url: default_ollama_url(),
            batch_size: default_batch_size(),
            query_cache_capacity: default_query_cache_capacity(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Distance metric name (`euclidean` is squared L2)
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String {
    "euclidean".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: default_metric(),
        }
    }
}

impl IndexConfig {
    /// Parse the configured metric name.
    pub fn metric(&self) -> Result<DistanceMetric, ConfigError> {
        self.metric
            .parse()
            .map_err(|e: String| ConfigError::ValidationError(e))
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks placed in the prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Characters kept per chunk before truncation
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_top_k() -> usize {
    2
}

fn default_max_context_chars() -> usize {
    500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

// ============= Generation Configuration =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    /// Ollama `/api/generate`
    #[default]
    Ollama,
    /// llama.cpp `llama-server` `/completion`
    LlamaCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: GenerationProviderKind,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Answer length limit in tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_model() -> String {
    "llama2:7b-chat".to_string()
}

fn default_max_tokens() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::default(),
            model: default_generation_model(),
            base_url: default_ollama_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============= Paths Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Chunk store written by `chunk` and read by `index`/`search`/`chat`
    #[serde(default = "default_chunks_path")]
    pub chunks: PathBuf,

    /// Persisted vector index
    #[serde(default = "default_index_path")]
    pub index: PathBuf,
}

fn default_chunks_path() -> PathBuf {
    PathBuf::from("output_chunks_fixed.txt")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("faiss_index.bin")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            chunks: default_chunks_path(),
            index: default_index_path(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid page marker pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RagConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RagConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicitly requested file must exist. Without one, `ragline.toml`
    /// in the working directory is used when present, otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_overrides(std::env::var("OLLAMA_URL").ok());
        Ok(config)
    }

    /// Apply an `OLLAMA_URL` override to every Ollama-backed stage
    pub fn apply_overrides(&mut self, ollama_url: Option<String>) {
        let Some(url) = ollama_url.filter(|u| !u.trim().is_empty()) else {
            return;
        };

        if self.embedding.provider == EmbeddingProviderKind::Ollama {
            self.embedding.base_url = url.clone();
        }
        if self.generation.provider == GenerationProviderKind::Ollama {
            self.generation.base_url = url;
        }
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("chunking.max_words", self.chunking.max_words),
            ("chunking.heading_max_words", self.chunking.heading_max_words),
            ("embedding.batch_size", self.embedding.batch_size),
            ("retrieval.top_k", self.retrieval.top_k),
            ("retrieval.max_context_chars", self.retrieval.max_context_chars),
            ("generation.max_tokens", self.generation.max_tokens),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.chunking.default_heading.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chunking.default_heading must not be empty".to_string(),
            ));
        }

        self.index.metric()?;
        self.compile_page_markers()?;

        Ok(())
    }

    /// Compile the configured page-marker patterns
    pub fn compile_page_markers(&self) -> Result<Vec<Regex>, ConfigError> {
        compile_patterns(&self.normalize.page_marker_patterns)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Compile a list of regex patterns, reporting the first invalid one
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.as_ref().to_string(),
                source,
            })
        })
        .collect()
}
