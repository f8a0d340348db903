use crate::session::PlaybackSession;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(usize),
    NotFound,
    NoPattern,
    AtEdge,
}

pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl PlaybackSession {
    pub fn move_selection(&mut self, delta: isize) {
        if self.tracks.is_empty() {
            return;
        }
        let len = self.tracks.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
        self.adjust_scroll();
    }

    pub fn select(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.selected = index;
            self.adjust_scroll();
        }
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
        self.adjust_scroll();
    }

    pub fn adjust_scroll(&mut self) {
        if self.tracks.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        let rows = self.visible_rows.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + rows {
            self.scroll_offset = self.selected + 1 - rows;
        }
    }

    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset.min(self.tracks.len());
        let end = (start + self.visible_rows).min(self.tracks.len());
        start..end
    }

    pub fn search(
        &mut self,
        pattern: &str,
        start: usize,
        reverse: bool,
    ) -> Result<SearchOutcome, regex::Error> {
        let regex = compile_pattern(pattern)?;
        let found = self.find_match(&regex, start, reverse);
        self.last_search = Some(regex);
        Ok(self.apply_match(found))
    }

    pub fn search_next(&mut self) -> SearchOutcome {
        self.repeat_search(false)
    }

    pub fn search_prev(&mut self) -> SearchOutcome {
        self.repeat_search(true)
    }

    fn repeat_search(&mut self, reverse: bool) -> SearchOutcome {
        let Some(regex) = self.last_search.take() else {
            return SearchOutcome::NoPattern;
        };
        let start = if reverse {
            self.selected.checked_sub(1)
        } else {
            Some(self.selected + 1).filter(|idx| *idx < self.tracks.len())
        };
        let outcome = match start {
            Some(start) => {
                let found = self.find_match(&regex, start, reverse);
                self.apply_match(found)
            }
            None => SearchOutcome::AtEdge,
        };
        self.last_search = Some(regex);
        outcome
    }

    fn find_match(&self, regex: &Regex, start: usize, reverse: bool) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        let is_match = |idx: &usize| regex.is_match(&self.tracks[*idx].name);
        if reverse {
            let start = start.min(self.tracks.len() - 1);
            (0..=start).rev().find(is_match)
        } else {
            (start..self.tracks.len()).find(is_match)
        }
    }

    fn apply_match(&mut self, found: Option<usize>) -> SearchOutcome {
        match found {
            Some(idx) => {
                self.select(idx);
                SearchOutcome::Found(idx)
            }
            None => SearchOutcome::NotFound,
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(playing) = self.playing {
            self.select(playing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Playlist;
    use crate::session::{SessionId, UpNext};
    use proptest::prop_assert;
    use std::path::PathBuf;

    fn session(count: usize, rows: usize) -> PlaybackSession {
        let playlist = Playlist::new(
            "nav",
            (0..count).map(|idx| PathBuf::from(format!("/music/track_{idx}.mp3"))),
        );
        let mut session = PlaybackSession::from_playlist(SessionId(0), playlist);
        session.set_visible_rows(rows);
        session
    }

    fn named(names: &[&str]) -> PlaybackSession {
        let playlist = Playlist::new("nav", names.iter().map(PathBuf::from));
        PlaybackSession::from_playlist(SessionId(0), playlist)
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut session = session(3, 10);
        session.move_selection(-1);
        assert_eq!(session.selected(), 2);
        session.move_selection(1);
        assert_eq!(session.selected(), 0);
    }

    #[test]
    fn selection_on_empty_list_is_noop() {
        let mut session = session(0, 10);
        session.move_selection(1);
        assert_eq!(session.selected(), 0);
        assert_eq!(session.scroll_offset(), 0);
    }

    #[test]
    fn scroll_follows_selection_down_and_up() {
        let mut session = session(10, 3);
        for _ in 0..4 {
            session.move_selection(1);
        }
        assert_eq!(session.selected(), 4);
        assert_eq!(session.scroll_offset(), 2);
        assert_eq!(session.visible_range(), 2..5);

        session.select(1);
        assert_eq!(session.scroll_offset(), 1);
        session.move_selection(-2);
        assert_eq!(session.selected(), 9);
        assert_eq!(session.scroll_offset(), 7);
    }

    #[test]
    fn shrinking_viewport_keeps_selection_visible() {
        let mut session = session(30, 20);
        session.select(15);
        assert_eq!(session.scroll_offset(), 0);
        session.set_visible_rows(5);
        assert_eq!(session.scroll_offset(), 11);
    }

    #[test]
    fn search_is_case_insensitive_regex() {
        let mut session = named(&["Intro.mp3", "Blue Monday.ogg", "blue jeans.mp3"]);
        let outcome = session.search("^blue", 0, false).expect("valid regex");
        assert_eq!(outcome, SearchOutcome::Found(1));
        assert_eq!(session.selected(), 1);
        assert_eq!(session.last_search(), Some("^blue"));
    }

    #[test]
    fn search_reverse_scans_towards_zero() {
        let mut session = named(&["blue a.mp3", "red.mp3", "blue b.mp3", "green.mp3"]);
        let outcome = session.search("blue", 3, true).expect("valid regex");
        assert_eq!(outcome, SearchOutcome::Found(2));
    }

    #[test]
    fn search_miss_leaves_selection() {
        let mut session = named(&["a.mp3", "b.mp3"]);
        session.select(1);
        let outcome = session.search("zzz", 0, false).expect("valid regex");
        assert_eq!(outcome, SearchOutcome::NotFound);
        assert_eq!(session.selected(), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut session = named(&["a.mp3"]);
        assert!(session.search("(unclosed", 0, false).is_err());
        assert_eq!(session.last_search(), None);
    }

    #[test]
    fn repeat_search_reuses_last_pattern() {
        let mut session = named(&["x1.mp3", "y.mp3", "x2.mp3", "x3.mp3"]);
        assert_eq!(session.search_next(), SearchOutcome::NoPattern);

        session.search("x", 0, false).expect("valid regex");
        assert_eq!(session.search_next(), SearchOutcome::Found(2));
        assert_eq!(session.search_next(), SearchOutcome::Found(3));
        assert_eq!(session.search_next(), SearchOutcome::AtEdge);
        assert_eq!(session.search_prev(), SearchOutcome::Found(2));
        assert_eq!(session.search_prev(), SearchOutcome::Found(0));
        assert_eq!(session.search_prev(), SearchOutcome::AtEdge);
        assert_eq!(session.selected(), 0);
    }

    #[test]
    fn repeat_search_misses_between_edges() {
        let mut session = named(&["x.mp3", "y.mp3", "z.mp3"]);
        session.search("x", 0, false).expect("valid regex");
        assert_eq!(session.search_next(), SearchOutcome::NotFound);
        assert_eq!(session.selected(), 0);
    }

    #[test]
    fn reset_view_snaps_to_playing_track() {
        let mut session = session(50, 5);
        session.begin_track(40, 0, UpNext::Recompute);
        session.select(2);
        assert_eq!(session.scroll_offset(), 2);
        session.reset_view();
        assert_eq!(session.selected(), 40);
        assert_eq!(session.scroll_offset(), 36);
    }

    proptest::proptest! {
        #[test]
        fn selection_stays_in_bounds(count in 1usize..40, rows in 1usize..12, moves in proptest::collection::vec(-3isize..=3, 0..100)) {
            let mut session = session(count, rows);
            for delta in moves {
                session.move_selection(delta);
                prop_assert!(session.selected() < count);
                prop_assert!(session.visible_range().contains(&session.selected()));
            }
        }
    }
}
