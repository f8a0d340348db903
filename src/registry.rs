use crate::model::Playlist;
use crate::session::{PlaybackSession, SessionId};
use std::ops::Range;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
}

/// All playlist sessions, addressed by index. A session's id always equals
/// its position, so handles stay valid across deletions once renumbered.
#[derive(Debug)]
pub struct Registry {
    sessions: Vec<PlaybackSession>,
    active: Option<usize>,
    page: usize,
    page_size: usize,
}

impl Registry {
    pub fn new(playlists: Vec<Playlist>, page_size: usize) -> Self {
        let initial = playlists
            .iter()
            .rposition(|playlist| playlist.from_cli)
            .unwrap_or(0);
        let sessions: Vec<PlaybackSession> = playlists
            .into_iter()
            .enumerate()
            .map(|(idx, playlist)| PlaybackSession::from_playlist(SessionId(idx), playlist))
            .collect();
        let page_size = page_size.max(1);
        let active = (!sessions.is_empty()).then_some(initial);
        Self {
            sessions,
            active,
            page: active.map_or(0, |idx| idx / page_size),
            page_size,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> &[PlaybackSession] {
        &self.sessions
    }

    pub fn session(&self, id: SessionId) -> Option<&PlaybackSession> {
        self.sessions.get(id.0)
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut PlaybackSession> {
        self.sessions.get_mut(id.0)
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active.map(SessionId)
    }

    pub fn active(&self) -> Option<&PlaybackSession> {
        self.sessions.get(self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut PlaybackSession> {
        self.sessions.get_mut(self.active?)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.sessions.len().div_ceil(self.page_size).max(1)
    }

    pub fn page_range(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.sessions.len());
        let end = (start + self.page_size).min(self.sessions.len());
        start..end
    }

    pub fn switch_active(&mut self, id: SessionId) -> bool {
        self.claim_playback(id) && self.focus(id)
    }

    pub fn focus(&mut self, id: SessionId) -> bool {
        if id.0 >= self.sessions.len() {
            return false;
        }
        self.active = Some(id.0);
        self.page = id.0 / self.page_size;
        debug!(session = id.0, "focused session");
        true
    }

    pub fn claim_playback(&mut self, id: SessionId) -> bool {
        if id.0 >= self.sessions.len() {
            return false;
        }
        for session in self.sessions.iter_mut().filter(|session| session.id != id) {
            session.release_playback();
        }
        true
    }

    pub fn playing_id(&self) -> Option<SessionId> {
        self.sessions
            .iter()
            .find(|session| session.playing().is_some())
            .map(PlaybackSession::id)
    }

    pub fn delete_active(&mut self) -> Option<PlaybackSession> {
        let index = self.active?;
        let removed = self.sessions.remove(index);
        for (position, session) in self.sessions.iter_mut().enumerate().skip(index) {
            session.id = SessionId(position);
        }

        if self.sessions.is_empty() {
            self.active = None;
            self.page = 0;
        } else {
            let active = index.min(self.sessions.len() - 1);
            self.active = Some(active);
            self.page = active / self.page_size;
        }
        info!(name = %removed.name(), remaining = self.sessions.len(), "deleted session");
        Some(removed)
    }

    pub fn paginate(&mut self, step: Step) -> bool {
        let last_page = self.page_count() - 1;
        let target = match step {
            Step::Back => self.page.checked_sub(1),
            Step::Forward => (self.page < last_page).then_some(self.page + 1),
        };
        let Some(target) = target else {
            return false;
        };
        self.page = target;
        let first = target * self.page_size;
        if first < self.sessions.len() {
            self.active = Some(first);
        }
        true
    }

    pub fn move_cursor(&mut self, step: Step) -> bool {
        let Some(current) = self.active else {
            return false;
        };
        let target = match step {
            Step::Back => current.checked_sub(1),
            Step::Forward => Some(current + 1).filter(|idx| *idx < self.sessions.len()),
        };
        let Some(target) = target else {
            return false;
        };
        self.active = Some(target);
        self.page = target / self.page_size;
        true
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        for session in &mut self.sessions {
            session.set_visible_rows(rows);
        }
    }
}
