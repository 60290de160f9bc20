//! I/O-facing error kinds (spec §7): file access, text-format violations,
//! and configuration mistakes the core itself never sees.

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input at {path}: {0}", path = .path)]
    Format { path: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] sbrl_core::CoreError),

    #[error("failed to write model to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type IoResult<T> = Result<T, IoError>;
