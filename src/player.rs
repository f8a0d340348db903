use crate::audio::{AudioDevice, CompletionSignal};
use crate::clock::Clock;
use crate::model::{Settings, Volume};
use crate::navigation::SearchOutcome;
use crate::notify::{Notice, Notifier, Severity};
use crate::registry::{Registry, Step};
use crate::session::{PlaybackSession, SessionId, UpNext};
use crate::store::PlaylistStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub struct Player {
    registry: Registry,
    device: Box<dyn AudioDevice>,
    completion: CompletionSignal,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    store: Option<PlaylistStore>,
    settings: Settings,
    volume: Volume,
    muted_from: Option<Volume>,
    transition_pending: bool,
}

impl Player {
    pub fn new(
        registry: Registry,
        device: Box<dyn AudioDevice>,
        clock: Box<dyn Clock>,
        notifier: Box<dyn Notifier>,
        settings: Settings,
    ) -> Self {
        let completion = device.completion_signal();
        let volume = Volume::new(settings.volume);
        let mut player = Self {
            registry,
            device,
            completion,
            clock,
            notifier,
            store: None,
            settings,
            volume,
            muted_from: None,
            transition_pending: false,
        };
        player.device.set_volume(volume);
        player
    }

    pub fn with_store(mut self, store: PlaylistStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn device(&self) -> &dyn AudioDevice {
        self.device.as_ref()
    }

    pub fn completion_signal(&self) -> CompletionSignal {
        self.completion.clone()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn transition_pending(&self) -> bool {
        self.transition_pending
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notifier.latest()
    }

    pub fn now(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn elapsed_ms(&self) -> u64 {
        let now = self.now();
        self.registry
            .active()
            .map_or(0, |session| session.elapsed_ms(now))
    }

    pub fn play_selected(&mut self) -> Result<()> {
        let Some(session) = self.registry.active() else {
            return Ok(());
        };
        if session.is_empty() {
            return Ok(());
        }
        let (id, index) = (session.id(), session.selected());
        self.registry.switch_active(id);
        self.start_in(id, index, UpNext::Recompute)?;
        if let Some(session) = self.registry.session_mut(id) {
            session.record_history(index);
        }
        Ok(())
    }

    pub fn start_song(&mut self, index: usize, upnext: UpNext) -> Result<()> {
        match self.registry.active_id() {
            Some(id) => self.start_in(id, index, upnext),
            None => Ok(()),
        }
    }

    fn start_in(&mut self, id: SessionId, index: usize, upnext: UpNext) -> Result<()> {
        let now = self.clock.ticks();
        self.registry.claim_playback(id);
        let Some(session) = self.registry.session_mut(id) else {
            return Ok(());
        };
        let Some(track) = session.begin_track(index, now, upnext) else {
            return Ok(());
        };
        self.transition_pending = false;

        if self.device.is_paused() {
            self.device.pause(false);
        }
        // A completion raised by the replaced track must not advance this one.
        self.completion.take();
        self.device
            .play(&track.path)
            .with_context(|| format!("failed to play {}", track.path.display()))?;
        info!(track = %track.name, session = id.0, index, "started track");

        if self.settings.notify_on_change {
            self.notifier.notify("Up Next", &track.name, Severity::Info);
        }
        Ok(())
    }

    pub fn service_audio(&mut self) -> Result<()> {
        if self.transition_pending {
            self.transition_pending = false;
            if let Some(id) = self.registry.playing_id() {
                let index = self.registry.session(id).and_then(PlaybackSession::playing);
                if let Some(index) = index {
                    self.start_in(id, index, UpNext::Recompute)?;
                }
            }
        }

        if self.completion.take() {
            self.finish_track();
        }
        Ok(())
    }

    fn finish_track(&mut self) {
        let Some(id) = self.registry.playing_id() else {
            debug!("track finished with no playback owner");
            return;
        };
        let next = self
            .registry
            .session_mut(id)
            .and_then(PlaybackSession::on_track_finished);
        if let Some(next) = next {
            debug!(session = id.0, next, "track finished, start deferred");
            self.transition_pending = true;
        }
    }

    pub fn toggle_pause(&mut self) {
        let now = self.clock.ticks();
        let Some(session) = self.registry.active_mut() else {
            return;
        };
        if session.playing().is_none() {
            return;
        }
        if let Some(paused) = session.toggle_pause(now) {
            self.device.pause(paused);
            debug!(paused, "toggled pause");
        }
    }

    pub fn seek(&mut self, delta_seconds: i64) {
        let now = self.clock.ticks();
        let Some(session) = self.registry.active() else {
            return;
        };
        let Some(target_ms) = session.seek_target(delta_seconds.saturating_mul(1_000), now) else {
            return;
        };

        match self.device.set_position(target_ms as f64 / 1_000.0) {
            Ok(()) => {
                if let Some(session) = self.registry.active_mut() {
                    session.apply_seek(now, target_ms);
                }
                debug!(target_ms, "seeked");
            }
            Err(err) => {
                warn!("seek failed: {err:#}");
                self.notifier
                    .notify("Seek failed", &format!("{err:#}"), Severity::Warning);
            }
        }
    }

    pub fn next_song(&mut self) {
        let Some(session) = self.registry.active_mut() else {
            return;
        };
        if !session.can_skip() {
            return;
        }
        session.adjust_scroll();
        self.device.halt();
    }

    pub fn prev_song(&mut self) -> Result<()> {
        let now = self.clock.ticks();
        let threshold = self.settings.restart_threshold_ms;
        let Some(session) = self.registry.active_mut() else {
            return Ok(());
        };
        let id = session.id();
        let Some((index, upnext)) = session.prev_song(now, threshold) else {
            return Ok(());
        };
        self.start_in(id, index, upnext)
    }

    pub fn enqueue_selected(&mut self) {
        let Some(session) = self.registry.active_mut() else {
            return;
        };
        let index = session.selected();
        if session.enqueue(index) {
            info!(index, queued = session.explicit_queue().len(), "enqueued track");
        }
    }

    pub fn toggle_advance_mode(&mut self) -> Result<()> {
        let Some(session) = self.registry.active_mut() else {
            return Ok(());
        };
        let id = session.id();
        let auto_start = session.toggle_advance_mode();
        info!(mode = session.mode().label(), session = id.0, "advance mode changed");

        if let Some(index) = auto_start {
            self.registry.switch_active(id);
            self.start_in(id, index, UpNext::Recompute)?;
            if let Some(session) = self.registry.session_mut(id) {
                session.record_history(index);
            }
        }
        Ok(())
    }

    pub fn volume_up(&mut self) {
        let base = self.muted_from.take().unwrap_or(self.volume);
        self.apply_volume(base.raised(self.settings.volume_step));
    }

    pub fn volume_down(&mut self) {
        let base = self.muted_from.take().unwrap_or(self.volume);
        self.apply_volume(base.lowered(self.settings.volume_step));
    }

    pub fn toggle_mute(&mut self) {
        match self.muted_from.take() {
            Some(previous) => self.apply_volume(previous),
            None if !self.volume.is_muted() => {
                self.muted_from = Some(self.volume);
                self.apply_volume(Volume::new(0));
            }
            None => {}
        }
    }

    fn apply_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.device.set_volume(volume);
        debug!(level = volume.level(), "volume changed");
    }

    pub fn switch_to(&mut self, slot: usize) -> bool {
        let index = self.registry.page_range().start + slot;
        index < self.registry.page_range().end && self.registry.focus(SessionId(index))
    }

    pub fn paginate(&mut self, step: Step) -> bool {
        self.registry.paginate(step)
    }

    pub fn move_cursor(&mut self, step: Step) -> bool {
        self.registry.move_cursor(step)
    }

    pub fn delete_active(&mut self) -> bool {
        let Some(session) = self.registry.active() else {
            return false;
        };
        let name = session.name().to_string();
        let owns_playback = session.playing().is_some();

        if session.is_persisted()
            && let Some(store) = &self.store
            && let Err(err) = store.delete_playlist(&name)
        {
            warn!("failed to delete playlist {name}: {err:#}");
            self.notifier
                .notify("Could not delete playlist", &name, Severity::Error);
            return false;
        }

        if owns_playback {
            self.device.stop();
            self.transition_pending = false;
        }
        self.registry.delete_active().is_some()
    }

    pub fn save_active(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.notifier
                .notify("Name cannot be empty", "", Severity::Warning);
            return false;
        }
        let Some(session) = self.registry.active() else {
            return false;
        };
        let paths: Vec<PathBuf> = session.tracks().iter().map(|track| track.path.clone()).collect();
        let overwrite = session.is_persisted() && session.name() == name;

        if let Some(store) = &self.store {
            let result = if overwrite {
                store
                    .replace_playlist_songs(name, &paths)
                    .and_then(|replaced| {
                        if replaced {
                            Ok(())
                        } else {
                            store.write_new_playlist(name, &paths)
                        }
                    })
            } else {
                store.write_new_playlist(name, &paths)
            };
            if let Err(err) = result {
                warn!("failed to save playlist {name}: {err:#}");
                self.notifier
                    .notify("Could not save playlist", name, Severity::Error);
                return false;
            }
        }

        if let Some(session) = self.registry.active_mut() {
            session.mark_saved(name);
        }
        self.notifier.notify("Saved", name, Severity::Info);
        true
    }

    pub fn search(&mut self, pattern: &str) -> SearchOutcome {
        let Some(session) = self.registry.active_mut() else {
            return SearchOutcome::NoPattern;
        };
        match session.search(pattern, 0, false) {
            Ok(outcome) => {
                self.report_miss(outcome, pattern);
                outcome
            }
            Err(err) => {
                warn!(pattern, "invalid search pattern: {err}");
                self.notifier
                    .notify("Invalid search pattern", pattern, Severity::Warning);
                SearchOutcome::NotFound
            }
        }
    }

    pub fn search_next(&mut self) -> SearchOutcome {
        self.repeat_search(false)
    }

    pub fn search_prev(&mut self) -> SearchOutcome {
        self.repeat_search(true)
    }

    fn repeat_search(&mut self, reverse: bool) -> SearchOutcome {
        let Some(session) = self.registry.active_mut() else {
            return SearchOutcome::NoPattern;
        };
        let outcome = if reverse {
            session.search_prev()
        } else {
            session.search_next()
        };
        let pattern = session.last_search().unwrap_or_default().to_string();
        self.report_miss(outcome, &pattern);
        outcome
    }

    fn report_miss(&mut self, outcome: SearchOutcome, pattern: &str) {
        if outcome == SearchOutcome::NotFound {
            self.notifier
                .notify("Could not find song", pattern, Severity::Warning);
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if let Some(session) = self.registry.active_mut() {
            session.move_selection(delta);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(session) = self.registry.active_mut() {
            session.reset_view();
        }
    }

    pub fn resize(&mut self, rows: usize) {
        self.registry.set_visible_rows(rows);
    }

    pub fn shutdown(&mut self) -> Settings {
        self.device.stop();
        let volume = self.muted_from.unwrap_or(self.volume);
        Settings {
            volume: volume.level(),
            ..self.settings.clone()
        }
    }
}
