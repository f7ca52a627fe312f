//! Values exchanged with a playback engine

use keypoint_core::PlaybackPosition;
use tokio::sync::mpsc;

/// Status reported by a running stream
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Periodic report while audio is playing
    Playing(PlaybackPosition),
    /// Report after the stream was paused
    Paused(PlaybackPosition),
    Stopped,
    /// The chapter reached its end
    Finished,
    Errored(Option<String>),
}

/// Everything an engine needs to start playing a chapter
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub audio_resource_id: String,
    /// Where to start; non-zero when resuming mid-chapter
    pub position: PlaybackPosition,
    pub multiplier: f32,
}

impl StreamRequest {
    pub fn new(
        audio_resource_id: impl Into<String>,
        position: PlaybackPosition,
        multiplier: f32,
    ) -> Self {
        Self {
            audio_resource_id: audio_resource_id.into(),
            position,
            multiplier,
        }
    }
}

/// Producer half of an [`EngineEventStream`]
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// The sequence of events produced by one started stream.
///
/// The stream ends when the engine drops its sender. Dropping the stream
/// tells the engine nobody is listening any more.
#[derive(Debug)]
pub struct EngineEventStream {
    events: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEventStream {
    /// Creates a connected sender/stream pair
    pub fn channel() -> (EngineEventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { events: rx })
    }

    /// Waits for the next event, `None` once the engine closed the stream
    pub async fn next(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }
}
