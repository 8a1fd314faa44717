use crate::error::TheoryExplorerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// Google Gemini embedContent API
    Gemini,
}

impl ProviderKind {
    /// Default embedding model for this backend
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "nomic-embed-text",
            Self::Gemini => "text-embedding-004",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = TheoryExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(TheoryExplorerError::config(format!(
                "Unknown embedding provider '{}' (expected ollama or gemini)",
                other
            ))),
        }
    }
}

/// Theory Explorer application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persisted embeddings file
    pub store_path: PathBuf,

    /// Seed theories file (JSON array)
    pub seed_path: PathBuf,

    /// Embedding backend
    pub embedding_provider: ProviderKind,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Gemini API base URL
    pub gemini_base_url: String,

    /// Gemini API key
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    /// Embedding model name
    pub embedding_model: String,

    /// Per-request embedding timeout in seconds
    pub embed_timeout_secs: u64,

    /// Attempts per embedding request inside the provider adapter
    pub embed_max_attempts: u32,

    /// Result count used when the caller does not give one
    pub default_top_k: usize,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./embeddings.json"),
            seed_path: PathBuf::from("./theories.json"),
            embedding_provider: ProviderKind::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_api_key: None,
            embedding_model: ProviderKind::Ollama.default_model().to_string(),
            embed_timeout_secs: 60,
            embed_max_attempts: 3,
            default_top_k: 5,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, TheoryExplorerError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Ensure required directories exist
        config.ensure_directories()?;

        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TheoryExplorerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get_path = |key: &str| lookup(key).map(PathBuf::from);

        let embedding_provider = match lookup("EMBEDDING_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => defaults.embedding_provider,
        };

        let config = Self {
            store_path: get_path("EMBED_FILE").unwrap_or(defaults.store_path),
            seed_path: get_path("SEED_FILE").unwrap_or(defaults.seed_path),
            embedding_provider,
            ollama_base_url: lookup("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            gemini_base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| embedding_provider.default_model().to_string()),
            embed_timeout_secs: Self::parse_or("EMBED_TIMEOUT_SECS", &lookup, defaults.embed_timeout_secs)?,
            embed_max_attempts: Self::parse_or("EMBED_MAX_ATTEMPTS", &lookup, defaults.embed_max_attempts)?,
            default_top_k: Self::parse_or("DEFAULT_TOP_K", &lookup, defaults.default_top_k)?,
            log_dir: get_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, TheoryExplorerError>
    where
        T: FromStr,
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                TheoryExplorerError::config(format!("{} has an invalid value: '{}'", key, raw))
            }),
            None => Ok(default),
        }
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), TheoryExplorerError> {
        let mut dirs = vec![self.log_dir.clone()];
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_path_buf());
            }
        }

        for dir in dirs {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    TheoryExplorerError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Base URL of the selected embedding backend
    pub fn provider_base_url(&self) -> &str {
        match self.embedding_provider {
            ProviderKind::Ollama => &self.ollama_base_url,
            ProviderKind::Gemini => &self.gemini_base_url,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), TheoryExplorerError> {
        let url = self.provider_base_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TheoryExplorerError::config(
                "Embedding base URL must start with http:// or https://",
            ));
        }

        if self.embedding_provider == ProviderKind::Gemini && self.gemini_api_key.is_none() {
            return Err(TheoryExplorerError::config(
                "GEMINI_API_KEY is required when EMBEDDING_PROVIDER=gemini",
            ));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(TheoryExplorerError::config("Embedding model name cannot be empty"));
        }

        if self.embed_timeout_secs == 0 {
            return Err(TheoryExplorerError::config("Embedding timeout cannot be 0"));
        }

        if self.embed_max_attempts == 0 {
            return Err(TheoryExplorerError::config("Embedding attempts cannot be 0"));
        }

        if self.default_top_k == 0 {
            return Err(TheoryExplorerError::config("Default top-k cannot be 0"));
        }

        Ok(())
    }
}
