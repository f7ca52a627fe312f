//! Inputs to and outputs from the reducer

use keypoint_core::AppError;
use keypoint_engine::{EngineEvent, StreamRequest};

/// Something the listener asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Play,
    Pause,
    /// Scrub to a ratio of the current chapter
    SeekToProgress(f64),
    SkipForward,
    SkipBackward,
    NextChapter,
    PreviousChapter,
    CycleSpeed,
}

/// One input to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Intent(Intent),
    Engine(EngineEvent),
}

impl From<Intent> for Action {
    fn from(intent: Intent) -> Self {
        Action::Intent(intent)
    }
}

impl From<EngineEvent> for Action {
    fn from(event: EngineEvent) -> Self {
        Action::Engine(event)
    }
}

/// Deferred work requested by the reducer and carried out by the session
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start a play stream, replacing any stream still running
    StartStream(StreamRequest),
    /// Cancel the play stream and pause the engine
    StopStream,
    /// Move the engine to a ratio of the chapter, replacing any pending seek
    Seek(f64),
    /// Change speed on the live stream
    SetSpeed(f32),
    /// The current chapter changed
    ChapterChanged { index: usize },
    ReportError(AppError),
}
