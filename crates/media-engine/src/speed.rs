//! Backend speed clamp

use crate::{EngineEventStream, EngineResult, PlaybackEngine, StreamRequest};
use async_trait::async_trait;

/// Wraps an engine that misbehaves at exactly 2x.
///
/// Some backends glitch when asked for a multiplier of exactly 2.0. This
/// adapter substitutes a slightly slower multiplier for that one value, in
/// both `start` and `set_speed`, and forwards everything else untouched.
/// The player's speed ladder keeps reporting the nominal 2x.
#[derive(Debug)]
pub struct NearDoubleSpeed<E> {
    inner: E,
    substitute: f32,
}

impl<E> NearDoubleSpeed<E> {
    pub const DEFAULT_SUBSTITUTE: f32 = 1.99;

    pub fn new(inner: E) -> Self {
        Self::with_substitute(inner, Self::DEFAULT_SUBSTITUTE)
    }

    pub fn with_substitute(inner: E, substitute: f32) -> Self {
        Self { inner, substitute }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn substitute(&self) -> f32 {
        self.substitute
    }

    fn adjust(&self, multiplier: f32) -> f32 {
        if (multiplier - 2.0).abs() < f32::EPSILON {
            self.substitute
        } else {
            multiplier
        }
    }
}

#[async_trait]
impl<E: PlaybackEngine> PlaybackEngine for NearDoubleSpeed<E> {
    async fn start(&self, mut request: StreamRequest) -> EngineResult<EngineEventStream> {
        request.multiplier = self.adjust(request.multiplier);
        self.inner.start(request).await
    }

    async fn pause(&self) -> EngineResult<()> {
        self.inner.pause().await
    }

    async fn set_speed(&self, multiplier: f32) -> EngineResult<()> {
        self.inner.set_speed(self.adjust(multiplier)).await
    }

    async fn seek(&self, progress: f64) -> EngineResult<()> {
        self.inner.seek(progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedEngine;
    use keypoint_core::{Duration, PlaybackPosition};

    #[test]
    fn test_only_exact_double_is_substituted() {
        let adapter = NearDoubleSpeed::new(());
        assert_eq!(adapter.adjust(2.0), 1.99);
        assert_eq!(adapter.adjust(1.5), 1.5);
        assert_eq!(adapter.adjust(0.5), 0.5);
    }

    #[tokio::test]
    async fn test_set_speed_is_clamped() {
        let adapter = NearDoubleSpeed::with_substitute(SimulatedEngine::default(), 1.95);
        adapter.set_speed(2.0).await.unwrap();
        assert_eq!(adapter.inner().multiplier(), 1.95);

        adapter.set_speed(0.75).await.unwrap();
        assert_eq!(adapter.inner().multiplier(), 0.75);
    }

    #[tokio::test]
    async fn test_start_is_clamped() {
        let adapter = NearDoubleSpeed::new(SimulatedEngine::default());
        let request = StreamRequest::new(
            "summary_0",
            PlaybackPosition::start_of(Duration::from_seconds(30)),
            2.0,
        );
        let _stream = adapter.start(request).await.unwrap();
        assert_eq!(adapter.inner().multiplier(), 1.99);
    }
}
