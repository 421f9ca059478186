//! Error types for modguard

/// Result type alias using modguard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for modguard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A model or vectorizer artifact is missing or malformed
    #[error("artifact load error: {0}")]
    ArtifactLoad(String),

    /// The comment has nothing left to score after normalization
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors, including model/vectorizer mismatches
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new artifact load error
    pub fn artifact_load(msg: impl Into<String>) -> Self {
        Self::ArtifactLoad(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Per-request errors the caller can report and move past.
    ///
    /// Everything else means no usable classifier exists.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_recoverable() {
        assert!(Error::invalid_input("empty").is_recoverable());
        assert!(!Error::artifact_load("missing model.json").is_recoverable());
        assert!(!Error::config("dimension mismatch").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::artifact_load("tfidf.json not found");
        assert_eq!(err.to_string(), "artifact load error: tfidf.json not found");
    }
}
