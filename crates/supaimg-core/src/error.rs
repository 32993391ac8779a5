use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the image transformer core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid transformation: {0}")]
    InvalidTransformation(String),
    #[error("storage configuration missing: {0}")]
    MissingStorageConfig(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_transformation(message: impl Into<String>) -> Self {
        Error::InvalidTransformation(message.into())
    }
}
