//! The playback engine contract consumed by the player

use crate::{EngineEventStream, EngineResult, StreamRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// An audio backend able to play one chapter stream at a time.
///
/// `start` must honour a non-zero starting position and a runtime speed
/// multiplier. A backend that reports completion through positions must
/// report a terminal position exactly equal to the chapter duration, or
/// emit [`crate::EngineEvent::Finished`].
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Starts playing and returns the stream of status events
    async fn start(&self, request: StreamRequest) -> EngineResult<EngineEventStream>;

    async fn pause(&self) -> EngineResult<()>;

    /// Changes the speed of the live stream without restarting it
    async fn set_speed(&self, multiplier: f32) -> EngineResult<()>;

    /// Moves the live cursor to `progress` (0..=1) of the chapter
    async fn seek(&self, progress: f64) -> EngineResult<()>;
}

#[async_trait]
impl<E: PlaybackEngine + ?Sized> PlaybackEngine for Arc<E> {
    async fn start(&self, request: StreamRequest) -> EngineResult<EngineEventStream> {
        (**self).start(request).await
    }

    async fn pause(&self) -> EngineResult<()> {
        (**self).pause().await
    }

    async fn set_speed(&self, multiplier: f32) -> EngineResult<()> {
        (**self).set_speed(multiplier).await
    }

    async fn seek(&self, progress: f64) -> EngineResult<()> {
        (**self).seek(progress).await
    }
}
