//! Configuration management for memvault
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Text generation backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Quality score weights
    #[serde(default)]
    pub quality: QualityConfig,

    /// Reverse relationship maintenance
    #[serde(default)]
    pub relationships: RelationshipConfig,

    /// Chat intent detection
    #[serde(default)]
    pub intent: IntentConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Characters of input sent per text; longer input is truncated
    #[serde(default = "default_embedding_max_input_chars")]
    pub max_input_chars: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Run document analysis through the generation service
    #[serde(default = "default_generation_enabled")]
    pub enabled: bool,

    /// Base URL of the generation service
    #[serde(default = "default_generation_backend_url")]
    pub backend_url: String,

    /// Model name/identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Characters of document content included in an analysis prompt
    #[serde(default = "default_generation_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Content longer than this is relocated to blob storage
    #[serde(default = "default_content_threshold_chars")]
    pub content_threshold_chars: usize,

    /// Maximum candidates read from the store for one search
    #[serde(default = "default_fetch_cap")]
    pub fetch_cap: usize,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results
    #[serde(default = "default_search_k")]
    pub default_k: usize,

    /// Minimum cosine similarity (-1.0 - 1.0)
    #[serde(default = "default_search_min_score")]
    pub min_score: f32,

    /// Follow relationships one hop from the ranked results
    #[serde(default = "default_expand_relationships")]
    pub expand_relationships: bool,
}

/// Quality score weights and normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_weight_patterns")]
    pub patterns_weight: f32,

    #[serde(default = "default_weight_insights")]
    pub insights_weight: f32,

    #[serde(default = "default_weight_complexity")]
    pub complexity_weight: f32,

    #[serde(default = "default_weight_maintainability")]
    pub maintainability_weight: f32,

    #[serde(default = "default_weight_summary")]
    pub summary_weight: f32,

    /// Complexity value that maps to a full complexity contribution
    #[serde(default = "default_complexity_scale")]
    pub complexity_scale: f32,

    /// Maintainability value that maps to a full maintainability contribution
    #[serde(default = "default_maintainability_scale")]
    pub maintainability_scale: f32,

    /// Summaries longer than this earn the summary contribution
    #[serde(default = "default_summary_min_chars")]
    pub summary_min_chars: usize,

    /// Complexity used when the analysis is unavailable
    #[serde(default = "default_fallback_complexity")]
    pub fallback_complexity: f32,

    /// Maintainability used when the analysis is unavailable
    #[serde(default = "default_fallback_maintainability")]
    pub fallback_maintainability: f32,
}

/// When reverse relationship edges are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipSync {
    /// Drain the outbox right after each store
    #[default]
    Inline,
    /// Leave edges queued until explicitly flushed
    Deferred,
}

/// Relationship maintenance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(default)]
    pub sync: RelationshipSync,

    /// Attempts per reverse edge before it is dropped
    #[serde(default = "default_relationship_max_attempts")]
    pub max_attempts: u32,
}

/// Intent detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Hit ratio below which the detected intent falls back to general
    #[serde(default = "default_intent_min_confidence")]
    pub min_confidence: f32,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for memvault data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,

    /// Directory holding relocated document content
    pub blob_dir: PathBuf,
}

impl PathsConfig {
    fn under(base: PathBuf, config_file: PathBuf) -> Self {
        Self {
            config_file,
            db_file: base.join("memory.db"),
            blob_dir: base.join("blobs"),
            base_dir: base,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend_url: default_embedding_backend_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            max_input_chars: default_embedding_max_input_chars(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_generation_enabled(),
            backend_url: default_generation_backend_url(),
            model: default_generation_model(),
            timeout_secs: default_generation_timeout(),
            max_prompt_chars: default_generation_max_prompt_chars(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            content_threshold_chars: default_content_threshold_chars(),
            fetch_cap: default_fetch_cap(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_search_k(),
            min_score: default_search_min_score(),
            expand_relationships: default_expand_relationships(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            patterns_weight: default_weight_patterns(),
            insights_weight: default_weight_insights(),
            complexity_weight: default_weight_complexity(),
            maintainability_weight: default_weight_maintainability(),
            summary_weight: default_weight_summary(),
            complexity_scale: default_complexity_scale(),
            maintainability_scale: default_maintainability_scale(),
            summary_min_chars: default_summary_min_chars(),
            fallback_complexity: default_fallback_complexity(),
            fallback_maintainability: default_fallback_maintainability(),
        }
    }
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            sync: RelationshipSync::default(),
            max_attempts: default_relationship_max_attempts(),
        }
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_intent_min_confidence(),
        }
    }
}

impl Config {
    /// Get the default base directory for memvault (~/.memvault)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".memvault")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        let config_file = base.join("config.toml");
        self.paths = PathsConfig::under(base, config_file);
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig::under(base, config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Check if memvault is initialized (config and DB exist)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists() && self.paths.db_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.store.fetch_cap == 0 {
            return Err(Error::Config("store.fetch_cap must be positive".to_string()));
        }

        if self.store.content_threshold_chars == 0 {
            return Err(Error::Config(
                "store.content_threshold_chars must be positive".to_string(),
            ));
        }

        if self.search.default_k == 0 {
            return Err(Error::Config("search.default_k must be positive".to_string()));
        }

        if !(-1.0..=1.0).contains(&self.search.min_score) {
            return Err(Error::Config(
                "search.min_score must be between -1.0 and 1.0".to_string(),
            ));
        }

        let q = &self.quality;
        let weights = [
            q.patterns_weight,
            q.insights_weight,
            q.complexity_weight,
            q.maintainability_weight,
            q.summary_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::Config(
                "quality weights must be finite and non-negative".to_string(),
            ));
        }

        if q.complexity_scale <= 0.0 || q.maintainability_scale <= 0.0 {
            return Err(Error::Config(
                "quality.complexity_scale and quality.maintainability_scale must be positive"
                    .to_string(),
            ));
        }

        if self.relationships.max_attempts == 0 {
            return Err(Error::Config(
                "relationships.max_attempts must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.intent.min_confidence) {
            return Err(Error::Config(
                "intent.min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.content_threshold_chars, 32_000);
        assert_eq!(config.store.fetch_cap, 1000);
        assert_eq!(config.search.default_k, 10);
        assert_eq!(config.relationships.sync, RelationshipSync::Inline);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.embedding.model = "custom-embedder".to_string();
        config.relationships.sync = RelationshipSync::Deferred;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.embedding.model, "custom-embedder");
        assert_eq!(loaded.relationships.sync, RelationshipSync::Deferred);
        assert_eq!(loaded.paths.db_file, tmp.path().join("memory.db"));
        assert_eq!(loaded.paths.blob_dir, tmp.path().join("blobs"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            default_k = 3

            [quality]
            summary_weight = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.search.default_k, 3);
        assert_eq!(config.quality.summary_weight, 0.5);
        assert_eq!(config.quality.patterns_weight, 0.2);
        assert_eq!(config.store.fetch_cap, 1000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.search.min_score = 1.5;
        assert!(config.validate().is_err());
        config.search.min_score = 0.2;
        assert!(config.validate().is_ok());

        config.quality.insights_weight = -0.1;
        assert!(config.validate().is_err());
        config.quality.insights_weight = 0.2;

        config.relationships.max_attempts = 0;
        assert!(config.validate().is_err());
        config.relationships.max_attempts = 1;

        config.intent.min_confidence = 2.0;
        assert!(config.validate().is_err());
    }
}
