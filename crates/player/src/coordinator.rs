//! Cancel-in-flight execution of engine effects

use keypoint_engine::{EngineEvent, PlaybackEngine, StreamRequest};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Independent groups of engine work. Starting work in a family cancels the
/// family's previous work; families never cancel each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskFamily {
    PlayStream,
    Seek,
}

/// Identifies one instance of work within a family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// An engine event tagged with the stream generation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct EngineMessage {
    pub generation: Generation,
    pub event: EngineEvent,
}

#[derive(Debug, Default)]
struct Slot {
    generation: Generation,
    handle: Option<JoinHandle<()>>,
}

impl Slot {
    /// Aborts whatever is running and moves to a fresh generation
    fn cancel(&mut self) -> Generation {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.next();
        self.generation
    }
}

/// Runs engine calls on background tasks, keeping at most one live task per
/// [`TaskFamily`].
///
/// Stream events are forwarded on the `events` channel tagged with their
/// generation. Receivers must drop messages for which
/// [`TaskCoordinator::is_current`] is false: an aborted task may already
/// have queued a message before it was cancelled.
pub struct TaskCoordinator {
    engine: Arc<dyn PlaybackEngine>,
    events: mpsc::Sender<EngineMessage>,
    play_stream: Slot,
    seek: Slot,
}

impl TaskCoordinator {
    pub fn new(engine: Arc<dyn PlaybackEngine>, events: mpsc::Sender<EngineMessage>) -> Self {
        Self {
            engine,
            events,
            play_stream: Slot::default(),
            seek: Slot::default(),
        }
    }

    fn slot_mut(&mut self, family: TaskFamily) -> &mut Slot {
        match family {
            TaskFamily::PlayStream => &mut self.play_stream,
            TaskFamily::Seek => &mut self.seek,
        }
    }

    fn slot(&self, family: TaskFamily) -> &Slot {
        match family {
            TaskFamily::PlayStream => &self.play_stream,
            TaskFamily::Seek => &self.seek,
        }
    }

    /// Cancels the current play stream and starts a new one
    pub fn start_stream(&mut self, request: StreamRequest) -> Generation {
        let generation = self.cancel(TaskFamily::PlayStream);
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            let mut stream = match engine.start(request).await {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("Failed to start stream: {}", err);
                    let event = EngineEvent::Errored(Some(err.to_string()));
                    let _ = events.send(EngineMessage { generation, event }).await;
                    return;
                }
            };
            while let Some(event) = stream.next().await {
                if events.send(EngineMessage { generation, event }).await.is_err() {
                    break;
                }
            }
        });

        self.play_stream.handle = Some(handle);
        generation
    }

    /// Cancels the current play stream and pauses the engine.
    ///
    /// The pause runs in the play-stream family so a quick follow-up
    /// `start_stream` cannot be overtaken by it.
    pub fn stop_stream(&mut self) -> Generation {
        let generation = self.cancel(TaskFamily::PlayStream);
        let engine = Arc::clone(&self.engine);

        let handle = tokio::spawn(async move {
            if let Err(err) = engine.pause().await {
                log::warn!("Failed to pause engine: {}", err);
            }
        });

        self.play_stream.handle = Some(handle);
        generation
    }

    /// Cancels any pending seek and issues a new one
    pub fn seek(&mut self, progress: f64) -> Generation {
        let generation = self.cancel(TaskFamily::Seek);
        let engine = Arc::clone(&self.engine);

        let handle = tokio::spawn(async move {
            if let Err(err) = engine.seek(progress).await {
                log::warn!("Failed to seek to {:.3}: {}", progress, err);
            }
        });

        self.seek.handle = Some(handle);
        generation
    }

    /// Changes speed on the live stream. Not cancellable.
    pub fn set_speed(&self, multiplier: f32) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(err) = engine.set_speed(multiplier).await {
                log::warn!("Failed to set speed x{}: {}", multiplier, err);
            }
        });
    }

    /// Aborts the family's live task; its later events become stale
    pub fn cancel(&mut self, family: TaskFamily) -> Generation {
        let slot = self.slot_mut(family);
        if slot.handle.is_some() {
            log::debug!("Cancelling in-flight {:?} task", family);
        }
        slot.cancel()
    }

    pub fn cancel_all(&mut self) {
        self.cancel(TaskFamily::PlayStream);
        self.cancel(TaskFamily::Seek);
    }

    pub fn active_generation(&self, family: TaskFamily) -> Generation {
        self.slot(family).generation
    }

    /// True when `generation` is the family's live generation
    pub fn is_current(&self, family: TaskFamily, generation: Generation) -> bool {
        self.slot(family).generation == generation
    }

    /// True while the family's live task has not completed
    pub fn is_running(&self, family: TaskFamily) -> bool {
        self.slot(family)
            .handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskCoordinator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for TaskCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskCoordinator")
            .field("play_stream", &self.play_stream.generation)
            .field("seek", &self.seek.generation)
            .finish()
    }
}
