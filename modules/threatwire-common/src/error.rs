use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThreatwireError>;

#[derive(Error, Debug)]
pub enum ThreatwireError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingest cycle already in progress")]
    CycleInProgress,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
