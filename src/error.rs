use thiserror::Error;

/// Main error type for the roadmap backend
#[derive(Error, Debug)]
pub enum RoadmapError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generative model errors (transport, status, empty candidates)
    #[error("AI service error: {0}")]
    Ai(String),

    /// Requested roadmap, item or quiz does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parse errors (stored JSON columns, model output)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using RoadmapError
pub type Result<T> = std::result::Result<T, RoadmapError>;

impl From<serde_json::Error> for RoadmapError {
    fn from(err: serde_json::Error) -> Self {
        RoadmapError::Parse(err.to_string())
    }
}
