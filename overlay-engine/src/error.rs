use thiserror::Error;

/// Errors raised by the viewer engine.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The image resource could not be fetched or decoded.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: f64, height: f64 },

    #[error("viewport has no area ({width}x{height})")]
    EmptyViewport { width: f64, height: f64 },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a detection array or an object with a `detections` field")]
    UnexpectedPayload,

    /// A drawing call on the backing surface failed.
    #[error("surface error: {0}")]
    Surface(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
