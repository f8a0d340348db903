use crate::advance::{RandomShuffle, Resolver, ShuffleBag, ShuffleSource};
use crate::clock::PlayClock;
use crate::model::{AdvanceMode, Playlist, Track};
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Arc;

const DEFAULT_VISIBLE_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpNext {
    Recompute,
    Keep,
}

#[derive(Debug)]
pub struct PlaybackSession {
    pub(crate) id: SessionId,
    pub(crate) name: String,
    pub(crate) tracks: Arc<[Track]>,
    pub(crate) selected: usize,
    pub(crate) playing: Option<usize>,
    pub(crate) paused: bool,
    pub(crate) started_once: bool,
    pub(crate) mode: AdvanceMode,
    pub(crate) history: Vec<usize>,
    pub(crate) upnext: Option<usize>,
    pub(crate) explicit_queue: VecDeque<usize>,
    pub(crate) shuffle_bag: ShuffleBag,
    pub(crate) shuffle_source: Box<dyn ShuffleSource>,
    pub(crate) scroll_offset: usize,
    pub(crate) visible_rows: usize,
    pub(crate) clock: PlayClock,
    pub(crate) modified: bool,
    pub(crate) persisted: bool,
    pub(crate) last_search: Option<Regex>,
}

impl PlaybackSession {
    pub fn new(id: SessionId, name: impl Into<String>, tracks: Arc<[Track]>) -> Self {
        Self {
            id,
            name: name.into(),
            tracks,
            selected: 0,
            playing: None,
            paused: false,
            started_once: false,
            mode: AdvanceMode::Normal,
            history: Vec::new(),
            upnext: None,
            explicit_queue: VecDeque::new(),
            shuffle_bag: ShuffleBag::default(),
            shuffle_source: Box::new(RandomShuffle::new()),
            scroll_offset: 0,
            visible_rows: DEFAULT_VISIBLE_ROWS,
            clock: PlayClock::default(),
            modified: false,
            persisted: false,
            last_search: None,
        }
    }

    pub fn from_playlist(id: SessionId, playlist: Playlist) -> Self {
        let persisted = !playlist.from_cli;
        let mut session = Self::new(id, playlist.name, Arc::from(playlist.tracks));
        session.persisted = persisted;
        session.modified = !persisted;
        session
    }

    pub fn set_shuffle_source(&mut self, source: Box<dyn ShuffleSource>) {
        self.shuffle_source = source;
        self.shuffle_bag.clear();
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn playing(&self) -> Option<usize> {
        self.playing
    }

    pub fn playing_track(&self) -> Option<&Track> {
        self.playing.and_then(|idx| self.tracks.get(idx))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn has_started(&self) -> bool {
        self.started_once
    }

    pub fn mode(&self) -> AdvanceMode {
        self.mode
    }

    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub fn upnext(&self) -> Option<usize> {
        self.upnext
    }

    pub fn explicit_queue(&self) -> &VecDeque<usize> {
        &self.explicit_queue
    }

    pub fn shuffle_bag(&self) -> &ShuffleBag {
        &self.shuffle_bag
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_ref().map(Regex::as_str)
    }

    pub fn elapsed_ms(&self, now: u64) -> u64 {
        if !self.started_once || self.playing.is_none() {
            return 0;
        }
        self.clock.elapsed_ms(now)
    }

    pub fn compute_upnext(&mut self) -> Option<usize> {
        self.upnext = Resolver {
            mode: self.mode,
            playing: self.playing,
            track_count: self.tracks.len(),
            explicit_queue: &self.explicit_queue,
            bag: &mut self.shuffle_bag,
            source: self.shuffle_source.as_mut(),
        }
        .resolve();
        self.upnext
    }

    pub fn begin_track(&mut self, index: usize, now: u64, upnext: UpNext) -> Option<Track> {
        let track = self.tracks.get(index)?.clone();
        self.paused = false;
        self.playing = Some(index);
        self.selected = index;
        self.clock = PlayClock::started(now);
        self.started_once = true;
        if upnext == UpNext::Recompute || self.upnext.is_none() {
            self.compute_upnext();
        }
        self.adjust_scroll();
        Some(track)
    }

    pub fn record_history(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.history.push(index);
        }
    }

    /// Moves to the precomputed next track once the device reports the end of
    /// the current one. Playback itself is restarted later by the caller.
    pub fn on_track_finished(&mut self) -> Option<usize> {
        self.playing?;
        let next = match self.upnext.filter(|idx| *idx < self.tracks.len()) {
            Some(next) => next,
            None => self.compute_upnext()?,
        };
        self.playing = Some(next);
        self.selected = next;
        self.history.push(next);
        self.explicit_queue.pop_front();
        self.adjust_scroll();
        Some(next)
    }

    pub fn toggle_pause(&mut self, now: u64) -> Option<bool> {
        if !self.started_once {
            return None;
        }
        self.paused = !self.paused;
        if self.paused {
            self.clock.pause(now);
        } else {
            self.clock.resume(now);
        }
        Some(self.paused)
    }

    pub fn seek_target(&self, delta_ms: i64, now: u64) -> Option<u64> {
        if !self.started_once || self.playing.is_none() {
            return None;
        }
        let current = i128::from(self.clock.elapsed_ms(now));
        let target = (current + i128::from(delta_ms)).max(0);
        Some(u64::try_from(target).unwrap_or(u64::MAX))
    }

    pub fn apply_seek(&mut self, now: u64, position_ms: u64) {
        self.clock.seek_to(now, position_ms);
    }

    pub fn can_skip(&self) -> bool {
        self.started_once && self.playing.is_some()
    }

    pub fn prev_song(&mut self, now: u64, restart_threshold_ms: u64) -> Option<(usize, UpNext)> {
        let playing = self.playing.filter(|_| self.started_once)?;
        let elapsed = self.clock.elapsed_ms(now);

        let target = if elapsed > restart_threshold_ms || self.history.len() <= 1 {
            (self.history.last().copied().unwrap_or(playing), UpNext::Keep)
        } else {
            self.history.pop();
            (*self.history.last()?, UpNext::Recompute)
        };
        self.selected = target.0;
        Some(target)
    }

    pub fn enqueue(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.explicit_queue.push_back(index);
        self.compute_upnext();
        true
    }

    pub fn toggle_advance_mode(&mut self) -> Option<usize> {
        self.mode = self.mode.next();
        if self.mode == AdvanceMode::Shuffle {
            self.shuffle_bag
                .reseed(self.tracks.len(), self.shuffle_source.as_mut());
        }

        if !self.started_once {
            let first = self
                .shuffle_bag
                .draw(self.tracks.len(), self.shuffle_source.as_mut())?;
            self.selected = first;
            self.adjust_scroll();
            return Some(first);
        }

        if self.playing.is_some() {
            self.compute_upnext();
        }
        None
    }

    pub fn set_advance_mode(&mut self, mode: AdvanceMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        if mode == AdvanceMode::Shuffle {
            self.shuffle_bag
                .reseed(self.tracks.len(), self.shuffle_source.as_mut());
        }
        if self.playing.is_some() {
            self.compute_upnext();
        }
    }

    pub fn release_playback(&mut self) {
        self.playing = None;
        self.paused = false;
        self.clock = PlayClock::default();
    }

    pub fn mark_saved(&mut self, name: &str) {
        self.name = name.to_string();
        self.persisted = true;
        self.modified = false;
    }
}
