//! The async loop that owns a [`PlayerState`] and executes its effects

use crate::action::{Action, Effect, Intent};
use crate::coordinator::{EngineMessage, TaskCoordinator, TaskFamily};
use crate::error::{PlayerError, PlayerResult};
use crate::reducer::reduce;
use crate::state::{PlayerSettings, PlayerState};
use crate::view::PlayerView;
use keypoint_core::{AppError, BookSummary};
use keypoint_engine::PlaybackEngine;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Messages accepted by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Shutdown,
}

/// Things a front end should tell the listener about
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotice {
    ChapterChanged { index: usize, title: String },
    Error(AppError),
}

/// Cloneable front-end side of a [`PlayerSession`]
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<PlayerView>,
}

impl PlayerHandle {
    /// Queues an intent, waiting for room if the session is behind
    pub async fn send(&self, intent: Intent) -> PlayerResult<()> {
        self.commands
            .send(Command::Intent(intent))
            .await
            .map_err(|_| PlayerError::SessionClosed)
    }

    /// Queues an intent without waiting
    pub fn try_send(&self, intent: Intent) -> PlayerResult<()> {
        self.commands
            .try_send(Command::Intent(intent))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => PlayerError::Busy,
                mpsc::error::TrySendError::Closed(_) => PlayerError::SessionClosed,
            })
    }

    /// Asks the session loop to stop after the intents already queued
    pub async fn shutdown(&self) -> PlayerResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| PlayerError::SessionClosed)
    }

    /// Latest published view
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// Receiver that wakes whenever the view changes
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Single owner of the player state.
///
/// Intents and engine events are applied one at a time through
/// [`reduce`]; the resulting effects are handed to a [`TaskCoordinator`].
/// Engine events from superseded streams are dropped before they reach the
/// reducer.
pub struct PlayerSession {
    state: PlayerState,
    settings: PlayerSettings,
    coordinator: TaskCoordinator,
    commands: mpsc::Receiver<Command>,
    engine_events: mpsc::Receiver<EngineMessage>,
    view: watch::Sender<PlayerView>,
    notices: mpsc::UnboundedSender<PlayerNotice>,
}

impl PlayerSession {
    pub fn new(
        book: BookSummary,
        engine: Arc<dyn PlaybackEngine>,
        settings: PlayerSettings,
    ) -> (Self, PlayerHandle, mpsc::UnboundedReceiver<PlayerNotice>) {
        Self::with_state(PlayerState::new(book), engine, settings)
    }

    /// Starts from an existing state, e.g. one with a preferred speed
    pub fn with_state(
        state: PlayerState,
        engine: Arc<dyn PlaybackEngine>,
        settings: PlayerSettings,
    ) -> (Self, PlayerHandle, mpsc::UnboundedReceiver<PlayerNotice>) {
        let buffer = settings.event_buffer.max(1);
        let (command_tx, command_rx) = mpsc::channel(buffer);
        let (engine_tx, engine_rx) = mpsc::channel(buffer);
        let (view_tx, view_rx) = watch::channel(PlayerView::from_state(&state));
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let session = Self {
            state,
            settings,
            coordinator: TaskCoordinator::new(engine, engine_tx),
            commands: command_rx,
            engine_events: engine_rx,
            view: view_tx,
            notices: notice_tx,
        };
        let handle = PlayerHandle {
            commands: command_tx,
            view: view_rx,
        };
        (session, handle, notice_rx)
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Processes commands and engine events until shut down or every
    /// handle is dropped. Returns the final state.
    pub async fn run(mut self) -> PlayerState {
        log::info!(
            "Player session started: '{}' ({} chapters)",
            self.state.book().title,
            self.state.chapter_count()
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Intent(intent)) => {
                        log::debug!("Intent: {:?}", intent);
                        self.dispatch(Action::Intent(intent));
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(message) = self.engine_events.recv() => self.handle_engine_message(message),
            }
        }

        self.coordinator.cancel_all();
        log::info!("Player session stopped");
        self.state
    }

    fn handle_engine_message(&mut self, message: EngineMessage) {
        if !self
            .coordinator
            .is_current(TaskFamily::PlayStream, message.generation)
        {
            log::trace!(
                "Dropping stale engine event from generation {}",
                message.generation.value()
            );
            return;
        }
        self.dispatch(Action::Engine(message.event));
    }

    fn dispatch(&mut self, action: Action) {
        let effects = reduce(&mut self.state, action, &self.settings);
        for effect in effects {
            self.run_effect(effect);
        }
        self.publish();
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartStream(request) => {
                self.coordinator.start_stream(request);
            }
            Effect::StopStream => {
                self.coordinator.stop_stream();
            }
            Effect::Seek(progress) => {
                self.coordinator.seek(progress);
            }
            Effect::SetSpeed(multiplier) => self.coordinator.set_speed(multiplier),
            Effect::ChapterChanged { index } => {
                let title = self
                    .state
                    .book()
                    .chapter(index)
                    .map(|c| c.title.clone())
                    .unwrap_or_default();
                log::info!("Chapter {}: {}", index + 1, title);
                self.notify(PlayerNotice::ChapterChanged { index, title });
            }
            Effect::ReportError(error) => {
                log::warn!("Playback stopped: {}", error);
                self.coordinator.cancel(TaskFamily::PlayStream);
                self.notify(PlayerNotice::Error(error));
            }
        }
    }

    fn notify(&self, notice: PlayerNotice) {
        if self.notices.send(notice).is_err() {
            log::trace!("No notice receiver");
        }
    }

    fn publish(&self) {
        let next = PlayerView::from_state(&self.state);
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl std::fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("state", &self.state)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keypoint_core::{Chapter, Duration};
    use keypoint_engine::SimulatedEngine;

    fn book() -> BookSummary {
        BookSummary::new(
            "Book",
            "cover",
            vec![Chapter::new("One", "summary_0", Duration::from_seconds(60))],
            "com.keypoint.subscription",
        )
    }

    #[tokio::test]
    async fn test_send_after_session_ends_fails() {
        let engine = Arc::new(SimulatedEngine::default());
        let (session, handle, _notices) = PlayerSession::new(book(), engine, PlayerSettings::default());
        drop(session);

        assert!(handle.is_closed());
        assert_eq!(handle.send(Intent::Play).await, Err(PlayerError::SessionClosed));
        assert_eq!(handle.try_send(Intent::Play), Err(PlayerError::SessionClosed));
    }

    #[tokio::test]
    async fn test_try_send_reports_full_queue() {
        let engine = Arc::new(SimulatedEngine::default());
        let settings = PlayerSettings {
            event_buffer: 1,
            ..PlayerSettings::default()
        };
        let (_session, handle, _notices) = PlayerSession::new(book(), engine, settings);

        assert_eq!(handle.try_send(Intent::Play), Ok(()));
        assert_eq!(handle.try_send(Intent::Pause), Err(PlayerError::Busy));
    }

    #[tokio::test]
    async fn test_initial_view_is_published() {
        let engine = Arc::new(SimulatedEngine::default());
        let (session, handle, _notices) = PlayerSession::new(book(), engine, PlayerSettings::default());

        assert_eq!(handle.view(), PlayerView::from_state(session.state()));
        assert_eq!(handle.view().headline(), "KEY POINT 1 OF 1");
    }

    #[tokio::test]
    async fn test_shutdown_returns_final_state() {
        let engine = Arc::new(SimulatedEngine::default());
        let (session, handle, _notices) = PlayerSession::new(book(), engine, PlayerSettings::default());
        let task = tokio::spawn(session.run());

        handle.send(Intent::SeekToProgress(0.5)).await.unwrap();
        handle.shutdown().await.unwrap();
        let state = task.await.unwrap();

        assert_eq!(state.position().current_time(), Duration::from_seconds(30));
        assert!(!state.is_playing());
    }
}
