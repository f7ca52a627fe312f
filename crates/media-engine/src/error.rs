// FILE: crates/media-engine/src/error.rs

use keypoint_core::AppError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Audio resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Stream failed: {0}")]
    StreamFailed(String),

    #[error("Seek error: {0}")]
    SeekError(String),

    #[error("Invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::engine(err.to_string())
    }
}
