//! Playback engine contract for keypoint, plus the engines that ship with it

mod engine;
mod error;
mod simulated;
mod speed;
mod types;

pub use engine::PlaybackEngine;
pub use error::{EngineError, EngineResult};
pub use simulated::{SimulatedEngine, DEFAULT_TICK};
pub use speed::NearDoubleSpeed;
pub use types::{EngineEvent, EngineEventSender, EngineEventStream, StreamRequest};
