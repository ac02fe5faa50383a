//! Error types for sketchpad operations.

use thiserror::Error;

/// Result type for sketchpad operations.
pub type SketchResult<T> = Result<T, SketchError>;

/// Errors that can occur in sketchpad operations.
#[derive(Debug, Error)]
pub enum SketchError {
    /// The drawing surface was asked for an image before it was ready.
    #[error("Surface not ready for export: {0}")]
    Export(String),

    /// The exported raster did not carry the expected data URL preamble.
    #[error("Malformed image encoding: {0}")]
    MalformedImage(String),

    /// A prediction violated the class-count invariants.
    #[error("Invalid prediction: {0}")]
    InvalidPrediction(String),

    /// Configuration could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The raster buffer could not be encoded.
    #[error("Image encoding failed: {0}")]
    Encoding(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
