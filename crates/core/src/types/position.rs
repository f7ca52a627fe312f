//! Playback position within a single chapter

use crate::types::Duration;

/// Current time and duration of the chapter being played.
///
/// The fields are private so that `current_time <= duration` always holds;
/// every operation returns a new value instead of patching a field.
/// A zero duration means "no content", in which case progress is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PlaybackPosition {
    current_time: Duration,
    duration: Duration,
}

impl PlaybackPosition {
    /// Creates a position, clamping `current_time` into `[0, duration]`
    pub fn new(current_time: Duration, duration: Duration) -> Self {
        Self {
            current_time: current_time.min(duration),
            duration,
        }
    }

    /// Position at the very start of a chapter of the given length
    pub fn start_of(duration: Duration) -> Self {
        Self::new(Duration::ZERO, duration)
    }

    /// Position at the very end of a chapter of the given length
    pub fn finished(duration: Duration) -> Self {
        Self::new(duration, duration)
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.current_time)
    }

    /// Ratio of elapsed time to duration, always in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.current_time.as_millis() as f64 / self.duration.as_millis() as f64
    }

    /// True when the position sits exactly on the end of a non-empty chapter.
    ///
    /// Equivalent to `progress() == 1.0`, computed on integer milliseconds.
    pub fn is_complete(&self) -> bool {
        !self.duration.is_zero() && self.current_time == self.duration
    }

    /// Shifts the current time by `delta_millis` (negative rewinds), clamped
    /// to `[0, duration]`.
    pub fn with_clamped_advance(&self, delta_millis: i64) -> Self {
        let current = self.current_time.as_millis();
        let shifted = if delta_millis >= 0 {
            current.saturating_add(delta_millis.unsigned_abs())
        } else {
            current.saturating_sub(delta_millis.unsigned_abs())
        };
        Self::new(Duration::from_millis(shifted), self.duration)
    }

    /// Moves to `progress * duration`. `progress` is clamped to `[0, 1]`;
    /// NaN is treated as 0.
    pub fn with_progress(&self, progress: f64) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let millis = (progress * self.duration.as_millis() as f64).round() as u64;
        Self::new(Duration::from_millis(millis), self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: u64) -> Duration {
        Duration::from_seconds(s)
    }

    #[test]
    fn test_new_clamps_current_time() {
        let position = PlaybackPosition::new(secs(90), secs(60));
        assert_eq!(position.current_time(), secs(60));
        assert!(position.is_complete());
    }

    #[test]
    fn test_zero_duration_has_zero_progress() {
        let position = PlaybackPosition::default();
        assert_eq!(position.progress(), 0.0);
        assert!(!position.is_complete());
        assert_eq!(PlaybackPosition::finished(Duration::ZERO).progress(), 0.0);
    }

    #[test]
    fn test_progress_ratio() {
        let position = PlaybackPosition::new(secs(15), secs(60));
        assert_eq!(position.progress(), 0.25);
        assert_eq!(position.remaining(), secs(45));
    }

    #[test]
    fn test_finished_is_exactly_one() {
        let position = PlaybackPosition::finished(secs(70));
        assert_eq!(position.progress(), 1.0);
        assert!(position.is_complete());
    }

    #[test]
    fn test_clamped_advance_forward_stops_at_end() {
        let position = PlaybackPosition::new(secs(55), secs(60));
        let advanced = position.with_clamped_advance(10_000);
        assert_eq!(advanced.current_time(), secs(60));
    }

    #[test]
    fn test_clamped_advance_backward_stops_at_zero() {
        let position = PlaybackPosition::new(secs(3), secs(60));
        let rewound = position.with_clamped_advance(-5_000);
        assert_eq!(rewound.current_time(), Duration::ZERO);
    }

    #[test]
    fn test_with_progress_clamps_input() {
        let position = PlaybackPosition::start_of(secs(60));
        assert_eq!(position.with_progress(0.5).current_time(), secs(30));
        assert_eq!(position.with_progress(1.7).current_time(), secs(60));
        assert_eq!(position.with_progress(-0.2).current_time(), Duration::ZERO);
        assert_eq!(position.with_progress(f64::NAN).current_time(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn progress_is_always_a_ratio(current in 0u64..10_000_000, duration in 0u64..10_000_000) {
            let position = PlaybackPosition::new(
                Duration::from_millis(current),
                Duration::from_millis(duration),
            );
            let progress = position.progress();
            prop_assert!((0.0..=1.0).contains(&progress));
            prop_assert!(position.current_time() <= position.duration());
        }

        #[test]
        fn progress_is_one_only_at_the_end(current in 0u64..10_000_000, duration in 1u64..10_000_000) {
            let position = PlaybackPosition::new(
                Duration::from_millis(current),
                Duration::from_millis(duration),
            );
            prop_assert_eq!(
                position.progress() == 1.0,
                position.current_time() == position.duration()
            );
        }

        #[test]
        fn progress_round_trips_through_seek(current in 0u64..10_000_000, duration in 1u64..10_000_000) {
            let position = PlaybackPosition::new(
                Duration::from_millis(current),
                Duration::from_millis(duration),
            );
            prop_assert_eq!(position.with_progress(position.progress()), position);
        }
    }
}
