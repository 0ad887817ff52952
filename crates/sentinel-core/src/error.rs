//! Error types for the Sentinel system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Video source error: {0}")]
    VideoSource(String),

    #[error("Playback failed on camera {camera_id}: {message}")]
    Playback { camera_id: String, message: String },

    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Face detection error: {0}")]
    FaceDetection(String),

    #[error("Camera not found: {0}")]
    CameraNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
