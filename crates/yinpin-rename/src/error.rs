use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path does not exist: {0}")]
    MissingPath(String),
}

pub type RenameResult<T> = Result<T, RenameError>;
