use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by an [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The update targeted an entity that does not exist.
    #[error("entity not found: {0}")]
    NotFound(Uuid),

    /// The compare-and-swap against the last-known value lost a race.
    /// Callers must not assume retries happen automatically.
    #[error("conflicting update for entity {0}")]
    UpdateConflict(Uuid),

    /// Transient backend failure (connectivity and the like).
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("poll interval must be positive")]
    InvalidInterval,

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
