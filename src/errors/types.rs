use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Engine invocation failed: {0}")]
    Invocation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Run cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
