//! The player state machine

use crate::action::{Action, Effect, Intent};
use crate::state::{PlayerSettings, PlayerState};
use keypoint_core::{AppError, Duration, PlaybackPosition};
use keypoint_engine::{EngineEvent, StreamRequest};

/// Applies one action to the state and returns the effects to run.
///
/// This is the only place player state changes. It never blocks and never
/// talks to the engine; everything asynchronous is described as an
/// [`Effect`] and comes back later as another [`Action`].
pub fn reduce(state: &mut PlayerState, action: Action, settings: &PlayerSettings) -> Vec<Effect> {
    match action {
        Action::Intent(intent) => reduce_intent(state, intent, settings),
        Action::Engine(event) => reduce_engine_event(state, event),
    }
}

fn reduce_intent(state: &mut PlayerState, intent: Intent, settings: &PlayerSettings) -> Vec<Effect> {
    match intent {
        Intent::Play => play(state),
        Intent::Pause => pause(state),
        Intent::SeekToProgress(progress) => seek_to_progress(state, progress),
        Intent::SkipForward => {
            let delta = millis_delta(settings.skip_forward);
            let target = state.position.with_clamped_advance(delta);
            seek_to_progress(state, target.progress())
        }
        Intent::SkipBackward => {
            let delta = millis_delta(settings.skip_backward);
            let target = state.position.with_clamped_advance(-delta);
            seek_to_progress(state, target.progress())
        }
        Intent::NextChapter => finish_chapter(state),
        Intent::PreviousChapter => previous_chapter(state),
        Intent::CycleSpeed => {
            state.speed = state.speed.next();
            vec![Effect::SetSpeed(state.speed.multiplier())]
        }
    }
}

fn reduce_engine_event(state: &mut PlayerState, event: EngineEvent) -> Vec<Effect> {
    match event {
        EngineEvent::Playing(position) => {
            state.position = position;
            advance_chapter_if_complete(state)
        }
        EngineEvent::Paused(position) => {
            state.position = position;
            Vec::new()
        }
        EngineEvent::Stopped => Vec::new(),
        EngineEvent::Finished => finish_chapter(state),
        EngineEvent::Errored(message) => {
            state.is_playing = false;
            let message = message.unwrap_or_else(|| "unknown engine failure".to_string());
            vec![Effect::ReportError(AppError::engine(message))]
        }
    }
}

fn millis_delta(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn play(state: &mut PlayerState) -> Vec<Effect> {
    let Some(chapter) = state.current_chapter() else {
        log::debug!("Play ignored, book has no chapters");
        return Vec::new();
    };
    let request = StreamRequest::new(
        chapter.audio_resource_id.clone(),
        state.position,
        state.speed.multiplier(),
    );
    state.is_playing = true;
    vec![Effect::StartStream(request)]
}

fn pause(state: &mut PlayerState) -> Vec<Effect> {
    if !state.is_playing {
        return Vec::new();
    }
    state.is_playing = false;
    vec![Effect::StopStream]
}

fn seek_to_progress(state: &mut PlayerState, progress: f64) -> Vec<Effect> {
    if state.current_chapter().is_none() {
        return Vec::new();
    }
    state.position = state.position.with_progress(progress);
    vec![Effect::Seek(state.position.progress())]
}

fn previous_chapter(state: &mut PlayerState) -> Vec<Effect> {
    if state.current_chapter_index == 0 || state.current_chapter().is_none() {
        return Vec::new();
    }
    state.current_chapter_index -= 1;
    state.position = PlaybackPosition::start_of(state.current_duration());
    log::debug!("Moved back to chapter {}", state.current_chapter_index + 1);

    let mut effects = vec![Effect::ChapterChanged {
        index: state.current_chapter_index,
    }];
    if state.is_playing {
        effects.extend(play(state));
    }
    effects
}

/// Every chapter transition goes through here, whether it was triggered by
/// the next button or by the engine reaching the end of the audio.
///
/// Completing the last chapter wraps to the first and stops playback.
fn advance_chapter_if_complete(state: &mut PlayerState) -> Vec<Effect> {
    if state.chapter_count() == 0 || !state.position.is_complete() {
        return Vec::new();
    }
    advance_chapter(state)
}

/// Moves the position to the end of the current chapter and advances.
///
/// A chapter with no content can never report a complete position, so it
/// advances unconditionally.
fn finish_chapter(state: &mut PlayerState) -> Vec<Effect> {
    if state.current_chapter().is_none() {
        return Vec::new();
    }
    let duration = state.current_duration();
    state.position = PlaybackPosition::finished(duration);
    if duration.is_zero() {
        advance_chapter(state)
    } else {
        advance_chapter_if_complete(state)
    }
}

fn advance_chapter(state: &mut PlayerState) -> Vec<Effect> {
    let count = state.chapter_count();
    let was_playing = state.is_playing;
    state.current_chapter_index = (state.current_chapter_index + 1) % count;
    let mut effects = vec![Effect::ChapterChanged {
        index: state.current_chapter_index,
    }];

    if state.current_chapter_index == 0 {
        log::debug!("Finished the last chapter, stopping");
        state.is_playing = false;
        if was_playing {
            effects.push(Effect::StopStream);
        }
    } else {
        log::debug!("Advanced to chapter {}", state.current_chapter_index + 1);
    }

    state.position = PlaybackPosition::start_of(state.current_duration());
    if state.is_playing {
        effects.extend(play(state));
    }
    effects
}
