//! Chapter-aware player for keypoint book summaries
//!
//! All state changes go through [`reduce`], a synchronous state machine.
//! [`PlayerSession`] feeds it intents and engine events and runs the
//! effects it asks for through a [`TaskCoordinator`], which keeps at most
//! one live stream and one pending seek at a time.

mod action;
mod coordinator;
mod error;
mod reducer;
mod session;
mod state;
mod view;

pub use action::{Action, Effect, Intent};
pub use coordinator::{EngineMessage, Generation, TaskCoordinator, TaskFamily};
pub use error::{PlayerError, PlayerResult};
pub use reducer::reduce;
pub use session::{Command, PlayerHandle, PlayerNotice, PlayerSession};
pub use state::{PlayerSettings, PlayerState};
pub use view::PlayerView;
