use thiserror::Error;

/// Result type for provider operations
pub type SpacesResult<T> = Result<T, SpacesError>;

/// Errors that can occur while talking to a Space
#[derive(Error, Debug)]
pub enum SpacesError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid range: start {start} is past the end of a {size} byte object")]
    InvalidRange { start: u64, size: u64 },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl SpacesError {
    /// Wrap a storage backend error, keeping the original as the source
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid range error
    pub fn invalid_range(start: u64, size: u64) -> Self {
        Self::InvalidRange { start, size }
    }

    /// True when the object does not exist, as opposed to a backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
