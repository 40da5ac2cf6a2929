use thiserror::Error;
use validator::ValidationErrors;

/// Why an inbound frame was refused before reaching the engine
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame could not be parsed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Frame is invalid: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Binary frames are not supported")]
    Binary,
}
