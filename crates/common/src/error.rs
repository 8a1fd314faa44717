use std::path::Path;

/// Theory Explorer error types
#[derive(Debug, thiserror::Error)]
pub enum TheoryExplorerError {
    /// Embedding provider returned no usable vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector length differs from the store's dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted store exists but could not be read or parsed
    #[error("Failed to read store {path}: {reason}")]
    PersistenceRead { path: String, reason: String },

    /// Persisted store could not be written
    #[error("Failed to write store {path}: {reason}")]
    PersistenceWrite { path: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TheoryExplorerError {
    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create persistence read error
    pub fn persistence_read(path: &Path, reason: impl ToString) -> Self {
        Self::PersistenceRead {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create persistence write error
    pub fn persistence_write(path: &Path, reason: impl ToString) -> Self {
        Self::PersistenceWrite {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error came from the embedding provider
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }

    /// Whether the error came from reading or writing the store file
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::PersistenceRead { .. } | Self::PersistenceWrite { .. }
        )
    }
}

// Process exit codes for the command-line front end
impl TheoryExplorerError {
    /// Get exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::Config(_) => 3,
            Self::Embedding(_) | Self::Network(_) => 4,
            Self::DimensionMismatch { .. } => 5,
            Self::PersistenceRead { .. } | Self::PersistenceWrite { .. } | Self::Io(_) => 6,
            Self::Json(_) | Self::Other(_) => 1,
        }
    }
}
