//! Error types for studium.

use thiserror::Error;

/// Result type alias using studium's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for studium operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Durable key-value storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Material not found
    #[error("Material not found: {0}")]
    MaterialNotFound(uuid::Uuid),

    /// Processing task not found for a (material, stage) pair
    #[error("Task not found: material {material_id} has no {task_type} task")]
    TaskNotFound {
        material_id: uuid::Uuid,
        task_type: crate::TaskType,
    },

    /// No locally cached content snapshot exists
    #[error("No offline content available")]
    NoOfflineContent,

    /// Another sync is already in flight
    #[error("Sync already in progress")]
    SyncInProgress,

    /// Network reachability check reported offline
    #[error("No internet connection")]
    Offline,

    /// Sync orchestration failed (fetch, merge, or persist)
    #[error("Sync failed: {0}")]
    Sync(String),

    /// Text generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// External capability returned a malformed payload for a pipeline stage
    #[error("Failed to parse {stage} response: {detail}")]
    ParseResponse { stage: String, detail: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error naming the pipeline stage that produced it.
    pub fn parse_response(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::ParseResponse {
            stage: stage.into(),
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
