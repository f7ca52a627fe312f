//! Render-ready snapshot of the player state

use crate::state::PlayerState;

/// What a front end needs to draw the player, derived from [`PlayerState`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub book_title: String,
    /// 1-based, 0 when the book has no chapters
    pub chapter_number: usize,
    pub chapter_count: usize,
    pub chapter_title: Option<String>,
    pub elapsed: String,
    pub remaining: String,
    pub progress: f64,
    pub is_playing: bool,
    pub speed_label: &'static str,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    /// False when there is nothing to scrub through
    pub can_scrub: bool,
}

impl PlayerView {
    pub fn from_state(state: &PlayerState) -> Self {
        let position = state.position();
        let chapter = state.current_chapter();
        let chapter_count = state.chapter_count();

        Self {
            book_title: state.book().title.clone(),
            chapter_number: chapter.map_or(0, |_| state.current_chapter_index() + 1),
            chapter_count,
            chapter_title: chapter.map(|c| c.title.clone()),
            elapsed: position.current_time().as_clock(),
            remaining: position.remaining().as_clock(),
            progress: position.progress(),
            is_playing: state.is_playing(),
            speed_label: state.speed().label(),
            can_go_previous: chapter.is_some() && state.current_chapter_index() > 0,
            can_go_next: chapter.is_some(),
            can_scrub: !position.duration().is_zero(),
        }
    }

    /// "KEY POINT 2 OF 7"
    pub fn headline(&self) -> String {
        format!("KEY POINT {} OF {}", self.chapter_number, self.chapter_count)
    }
}

impl From<&PlayerState> for PlayerView {
    fn from(state: &PlayerState) -> Self {
        Self::from_state(state)
    }
}
