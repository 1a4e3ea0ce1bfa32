//! Common error types for roiview

use thiserror::Error;

/// Common result type for roiview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the roiview crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A core's serialized ROI could not be interpreted
    #[error("Invalid ROI: {0}")]
    InvalidRoi(String),

    /// Remote service failure (transport, or an unusable response body)
    #[error("Remote service error: {0}")]
    Remote(String),
}
