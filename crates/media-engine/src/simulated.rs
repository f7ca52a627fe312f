//! Clock-driven engine that plays chapters without producing sound

use crate::error::{EngineError, EngineResult};
use crate::{EngineEvent, EngineEventSender, EngineEventStream, PlaybackEngine, StreamRequest};
use async_trait::async_trait;
use keypoint_core::PlaybackPosition;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default report cadence
pub const DEFAULT_TICK: StdDuration = StdDuration::from_millis(250);

/// State shared between the engine handle and the running transport task
#[derive(Debug)]
struct Transport {
    /// Bumped on every start/pause so an older transport task stops itself
    generation: u64,
    position: PlaybackPosition,
    multiplier: f32,
    events: Option<EngineEventSender>,
    resource: Option<String>,
}

/// Engine that advances a virtual cursor on a timer.
///
/// Every tick it moves the cursor by `tick * multiplier` and reports
/// `Playing`. When the cursor reaches the end of the chapter it reports the
/// exact terminal position followed by `Finished`. Starting a new stream
/// stops the previous one.
#[derive(Debug)]
pub struct SimulatedEngine {
    shared: Arc<Mutex<Transport>>,
    tick: StdDuration,
    failing: HashSet<String>,
}

impl SimulatedEngine {
    pub fn new(tick: StdDuration) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Transport {
                generation: 0,
                position: PlaybackPosition::default(),
                multiplier: 1.0,
                events: None,
                resource: None,
            })),
            tick: tick.max(StdDuration::from_millis(1)),
            failing: HashSet::new(),
        }
    }

    /// Makes `start` fail for the given resource
    pub fn with_failing_resource(mut self, audio_resource_id: impl Into<String>) -> Self {
        self.failing.insert(audio_resource_id.into());
        self
    }

    pub fn tick(&self) -> StdDuration {
        self.tick
    }

    pub fn position(&self) -> PlaybackPosition {
        self.lock().map(|t| t.position).unwrap_or_default()
    }

    pub fn multiplier(&self) -> f32 {
        self.lock().map(|t| t.multiplier).unwrap_or(1.0)
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().map(|t| t.events.is_some()).unwrap_or(false)
    }

    /// Resource of the most recently started stream
    pub fn current_resource(&self) -> Option<String> {
        self.lock().ok().and_then(|t| t.resource.clone())
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Transport>> {
        self.shared
            .lock()
            .map_err(|_| EngineError::InvalidState("transport lock poisoned".to_string()))
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

fn validate_multiplier(multiplier: f32) -> EngineResult<()> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(EngineError::InvalidSpeed(multiplier));
    }
    Ok(())
}

#[async_trait]
impl PlaybackEngine for SimulatedEngine {
    async fn start(&self, request: StreamRequest) -> EngineResult<EngineEventStream> {
        if self.failing.contains(&request.audio_resource_id) {
            return Err(EngineError::ResourceNotFound(request.audio_resource_id));
        }
        validate_multiplier(request.multiplier)?;

        let (tx, stream) = EngineEventStream::channel();
        let generation = {
            let mut transport = self.lock()?;
            if let Some(previous) = transport.events.take() {
                let _ = previous.send(EngineEvent::Stopped);
            }
            transport.generation += 1;
            transport.position = request.position;
            transport.multiplier = request.multiplier;
            transport.events = Some(tx);
            transport.resource = Some(request.audio_resource_id.clone());
            transport.generation
        };

        log::debug!(
            "Starting {} at {} (x{})",
            request.audio_resource_id,
            request.position.current_time(),
            request.multiplier
        );
        tokio::spawn(run_transport(Arc::clone(&self.shared), generation, self.tick));
        Ok(stream)
    }

    async fn pause(&self) -> EngineResult<()> {
        let mut transport = self.lock()?;
        transport.generation += 1;
        if let Some(events) = transport.events.take() {
            let _ = events.send(EngineEvent::Paused(transport.position));
            let _ = events.send(EngineEvent::Stopped);
        }
        Ok(())
    }

    async fn set_speed(&self, multiplier: f32) -> EngineResult<()> {
        validate_multiplier(multiplier)?;
        self.lock()?.multiplier = multiplier;
        Ok(())
    }

    async fn seek(&self, progress: f64) -> EngineResult<()> {
        if !progress.is_finite() {
            return Err(EngineError::SeekError(format!(
                "progress must be finite, got {}",
                progress
            )));
        }
        let mut transport = self.lock()?;
        transport.position = transport.position.with_progress(progress);
        Ok(())
    }
}

/// Advances the cursor until the chapter ends, the stream is superseded,
/// or nobody listens any more.
async fn run_transport(shared: Arc<Mutex<Transport>>, generation: u64, tick: StdDuration) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let step_millis = tick.as_millis() as f64;

    loop {
        ticker.tick().await;

        let Ok(mut transport) = shared.lock() else {
            log::error!("Transport lock poisoned, stopping stream");
            break;
        };
        if transport.generation != generation {
            break;
        }
        let Some(events) = transport.events.clone() else {
            break;
        };

        if transport.position.duration().is_zero() {
            let _ = events.send(EngineEvent::Finished);
            transport.events = None;
            break;
        }

        let step = (step_millis * transport.multiplier as f64).round() as i64;
        transport.position = transport.position.with_clamped_advance(step);
        let position = transport.position;

        if events.send(EngineEvent::Playing(position)).is_err() {
            log::debug!("Stream receiver dropped, stopping transport");
            transport.events = None;
            break;
        }

        if position.is_complete() {
            let _ = events.send(EngineEvent::Finished);
            transport.events = None;
            break;
        }
    }
}
