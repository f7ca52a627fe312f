use keypoint_core::{BookSummary, Chapter, Duration, PlaybackPosition, PlaybackSpeed};
use keypoint_engine::{EngineEvent, StreamRequest};
use keypoint_player::{reduce, Action, Effect, Intent, PlayerSettings, PlayerState};
use proptest::prelude::*;

fn secs(s: u64) -> Duration {
    Duration::from_seconds(s)
}

fn book(durations: &[u64]) -> BookSummary {
    let chapters = durations
        .iter()
        .enumerate()
        .map(|(i, d)| Chapter::new(format!("Key point {}", i + 1), format!("summary_{}", i), secs(*d)))
        .collect();
    BookSummary::new("Deep Work", "cover", chapters, "com.keypoint.subscription")
}

fn apply(state: &mut PlayerState, action: impl Into<Action>) -> Vec<Effect> {
    reduce(state, action.into(), &PlayerSettings::default())
}

fn playing_state(durations: &[u64]) -> PlayerState {
    let mut state = PlayerState::new(book(durations));
    apply(&mut state, Intent::Play);
    state
}

#[test]
fn test_two_chapter_scenario() {
    let mut state = playing_state(&[60, 70]);
    let effects = apply(&mut state, EngineEvent::Playing(PlaybackPosition::new(secs(60), secs(60))));

    assert_eq!(state.current_chapter_index(), 1);
    assert_eq!(state.position(), PlaybackPosition::new(Duration::ZERO, secs(70)));
    assert!(state.is_playing());
    assert_eq!(
        effects,
        vec![
            Effect::ChapterChanged { index: 1 },
            Effect::StartStream(StreamRequest::new(
                "summary_1",
                PlaybackPosition::start_of(secs(70)),
                1.0
            )),
        ]
    );
}

#[test]
fn test_next_button_matches_natural_completion() {
    for playing in [true, false] {
        let start = if playing {
            playing_state(&[60, 70, 80])
        } else {
            PlayerState::new(book(&[60, 70, 80]))
        };

        let mut by_button = start.clone();
        let button_effects = apply(&mut by_button, Intent::NextChapter);

        let mut by_engine = start.clone();
        let engine_effects = apply(
            &mut by_engine,
            EngineEvent::Playing(PlaybackPosition::finished(secs(60))),
        );

        assert_eq!(by_button, by_engine);
        assert_eq!(button_effects, engine_effects);
    }
}

#[test]
fn test_finished_matches_terminal_position() {
    let mut by_finished = playing_state(&[60, 70]);
    let mut by_position = by_finished.clone();

    let a = apply(&mut by_finished, EngineEvent::Finished);
    let b = apply(
        &mut by_position,
        EngineEvent::Playing(PlaybackPosition::finished(secs(60))),
    );

    assert_eq!(by_finished, by_position);
    assert_eq!(a, b);
}

#[test]
fn test_completing_last_chapter_wraps_and_stops() {
    let mut state = playing_state(&[60, 70]);
    apply(&mut state, Intent::NextChapter);
    let effects = apply(&mut state, EngineEvent::Playing(PlaybackPosition::finished(secs(70))));

    assert_eq!(state.current_chapter_index(), 0);
    assert_eq!(state.position(), PlaybackPosition::start_of(secs(60)));
    assert!(!state.is_playing());
    assert_eq!(
        effects,
        vec![Effect::ChapterChanged { index: 0 }, Effect::StopStream]
    );
}

#[test]
fn test_wrap_while_paused_emits_no_stop() {
    let mut state = PlayerState::new(book(&[60, 70]));
    apply(&mut state, Intent::NextChapter);
    let effects = apply(&mut state, Intent::NextChapter);

    assert_eq!(state.current_chapter_index(), 0);
    assert!(!state.is_playing());
    assert_eq!(effects, vec![Effect::ChapterChanged { index: 0 }]);
}

#[test]
fn test_single_chapter_book_wraps_to_itself() {
    let mut state = playing_state(&[45]);
    let effects = apply(&mut state, EngineEvent::Finished);

    assert_eq!(state.current_chapter_index(), 0);
    assert_eq!(state.position(), PlaybackPosition::start_of(secs(45)));
    assert!(!state.is_playing());
    assert_eq!(
        effects,
        vec![Effect::ChapterChanged { index: 0 }, Effect::StopStream]
    );
}

#[test]
fn test_pause_when_paused_is_idempotent() {
    let mut state = PlayerState::new(book(&[60, 70]));
    let before = state.clone();

    assert!(apply(&mut state, Intent::Pause).is_empty());
    assert_eq!(state, before);
}

#[test]
fn test_previous_at_first_chapter_is_noop() {
    for playing in [true, false] {
        let mut state = if playing {
            playing_state(&[60, 70])
        } else {
            PlayerState::new(book(&[60, 70]))
        };
        apply(&mut state, Intent::SeekToProgress(0.5));
        let before = state.clone();

        assert!(apply(&mut state, Intent::PreviousChapter).is_empty());
        assert_eq!(state, before);
    }
}

#[test]
fn test_previous_restarts_stream_when_playing() {
    let mut state = playing_state(&[60, 70]);
    apply(&mut state, Intent::NextChapter);
    apply(&mut state, EngineEvent::Playing(PlaybackPosition::new(secs(20), secs(70))));

    let effects = apply(&mut state, Intent::PreviousChapter);
    assert_eq!(state.current_chapter_index(), 0);
    assert_eq!(state.position(), PlaybackPosition::start_of(secs(60)));
    assert!(state.is_playing());
    assert_eq!(
        effects,
        vec![
            Effect::ChapterChanged { index: 0 },
            Effect::StartStream(StreamRequest::new(
                "summary_0",
                PlaybackPosition::start_of(secs(60)),
                1.0
            )),
        ]
    );
}

#[test]
fn test_previous_when_paused_does_not_start() {
    let mut state = PlayerState::new(book(&[60, 70]));
    apply(&mut state, Intent::NextChapter);

    let effects = apply(&mut state, Intent::PreviousChapter);
    assert_eq!(effects, vec![Effect::ChapterChanged { index: 0 }]);
    assert!(!state.is_playing());
}

#[test]
fn test_empty_catalog_is_inert() {
    let mut state = PlayerState::new(book(&[]));
    let before = state.clone();

    for intent in [
        Intent::Play,
        Intent::SeekToProgress(0.5),
        Intent::SkipForward,
        Intent::SkipBackward,
        Intent::NextChapter,
        Intent::PreviousChapter,
    ] {
        assert!(apply(&mut state, intent).is_empty());
    }
    assert!(apply(&mut state, EngineEvent::Finished).is_empty());

    assert_eq!(state, before);
    assert!(state.current_chapter().is_none());
    assert_eq!(state.position().progress(), 0.0);
}

#[test]
fn test_speed_cycles_back_after_five_steps() {
    let mut state = PlayerState::new(book(&[60]));
    for _ in 0..PlaybackSpeed::ALL.len() {
        apply(&mut state, Intent::CycleSpeed);
    }
    assert_eq!(state.speed(), PlaybackSpeed::Normal);
}

#[test]
fn test_speed_change_does_not_interrupt_stream() {
    let mut state = playing_state(&[60]);
    let effects = apply(&mut state, Intent::CycleSpeed);

    assert!(state.is_playing());
    assert_eq!(effects, vec![Effect::SetSpeed(1.5)]);
}

#[test]
fn test_skip_forward_near_end_lands_on_end() {
    let mut state = PlayerState::new(book(&[60, 70]));
    apply(&mut state, EngineEvent::Paused(PlaybackPosition::new(secs(55), secs(60))));
    let effects = apply(&mut state, Intent::SkipForward);

    // Seeking never advances the chapter by itself
    assert_eq!(state.current_chapter_index(), 0);
    assert!(state.position().is_complete());
    assert_eq!(effects, vec![Effect::Seek(1.0)]);
}

#[test]
fn test_error_then_play_retries() {
    let mut state = playing_state(&[60]);
    apply(&mut state, EngineEvent::Errored(None));
    assert!(!state.is_playing());

    let effects = apply(&mut state, Intent::Play);
    assert!(state.is_playing());
    assert!(matches!(effects.as_slice(), [Effect::StartStream(_)]));
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop_oneof![
        Just(Intent::Play),
        Just(Intent::Pause),
        (0.0f64..=1.0).prop_map(Intent::SeekToProgress),
        Just(Intent::SkipForward),
        Just(Intent::SkipBackward),
        Just(Intent::NextChapter),
        Just(Intent::PreviousChapter),
        Just(Intent::CycleSpeed),
    ]
}

fn event_strategy() -> impl Strategy<Value = EngineEvent> {
    prop_oneof![
        (0u64..=90_000).prop_map(|ms| EngineEvent::Playing(PlaybackPosition::new(
            Duration::from_millis(ms),
            Duration::from_millis(90_000)
        ))),
        Just(EngineEvent::Stopped),
        Just(EngineEvent::Finished),
        Just(EngineEvent::Errored(None)),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        intent_strategy().prop_map(Action::Intent),
        event_strategy().prop_map(Action::Engine),
    ]
}

proptest! {
    #[test]
    fn prop_state_stays_consistent(actions in prop::collection::vec(action_strategy(), 0..64)) {
        let mut state = PlayerState::new(book(&[90, 30, 45]));
        for action in actions {
            let effects = reduce(&mut state, action, &PlayerSettings::default());

            prop_assert!(state.current_chapter_index() < state.chapter_count());
            let progress = state.position().progress();
            prop_assert!((0.0..=1.0).contains(&progress));
            let starts = effects.iter().filter(|e| matches!(e, Effect::StartStream(_))).count();
            prop_assert!(starts <= 1);
            if starts == 1 {
                prop_assert!(state.is_playing());
            }
        }
    }
}
