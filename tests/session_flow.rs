use ampire::advance::FixedShuffle;
use ampire::audio::NullDevice;
use ampire::clock::ManualClock;
use ampire::model::{AdvanceMode, Playlist, Settings};
use ampire::notify::{Notice, Notifier, Severity};
use ampire::player::Player;
use ampire::registry::Registry;
use ampire::session::SessionId;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Clone, Default)]
struct RecordingNotifier {
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, title: &str, body: &str, severity: Severity) {
        self.notices.borrow_mut().push(Notice {
            title: title.to_string(),
            body: body.to_string(),
            severity,
        });
    }
}

struct Harness {
    player: Player,
    clock: Rc<ManualClock>,
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl Harness {
    fn new(playlists: Vec<Playlist>, settings: Settings) -> Self {
        let clock = Rc::new(ManualClock::new(1_000));
        let notifier = RecordingNotifier::default();
        let notices = Rc::clone(&notifier.notices);
        let player = Player::new(
            Registry::new(playlists, settings.page_size),
            Box::new(NullDevice::new()),
            Box::new(Rc::clone(&clock)),
            Box::new(notifier),
            settings,
        );
        Self {
            player,
            clock,
            notices,
        }
    }

    fn abc() -> Self {
        Self::new(vec![abc()], Settings::default())
    }

    fn playing(&self) -> Option<usize> {
        self.player.registry().active().and_then(|session| session.playing())
    }

    fn current_file(&self) -> Option<PathBuf> {
        self.player.device().current_track().map(Path::to_path_buf)
    }

    /// Simulates the audio thread reaching the end of the track, then runs
    /// the two main loop ticks needed to consume it and restart playback.
    fn finish_track(&mut self) {
        self.player.completion_signal().raise();
        self.player.service_audio().expect("consume completion");
        self.player.service_audio().expect("deferred start");
    }
}

fn abc() -> Playlist {
    Playlist::new("abc", ["a.mp3", "b.mp3", "c.mp3"].map(PathBuf::from))
}

#[test]
fn normal_mode_advances_to_next_track() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.finish_track();
    assert_eq!(harness.playing(), Some(1));
    assert_eq!(harness.current_file(), Some(PathBuf::from("b.mp3")));
}

#[test]
fn normal_mode_wraps_after_last_track() {
    let mut harness = Harness::abc();
    harness.player.move_selection(-1);
    harness.player.play_selected().expect("play");
    harness.finish_track();
    assert_eq!(harness.playing(), Some(0));
}

#[test]
fn loop_mode_repeats_track() {
    let mut harness = Harness::abc();
    harness
        .player
        .registry_mut()
        .session_mut(SessionId(0))
        .expect("session")
        .set_advance_mode(AdvanceMode::Loop);
    harness.player.play_selected().expect("play");
    harness.finish_track();
    assert_eq!(harness.playing(), Some(0));
    let session = harness.player.registry().active().expect("session");
    assert_eq!(session.history(), &[0, 0]);
}

#[test]
fn shuffle_mode_follows_the_bag() {
    let mut harness = Harness::abc();
    let session = harness
        .player
        .registry_mut()
        .session_mut(SessionId(0))
        .expect("session");
    session.set_shuffle_source(Box::new(FixedShuffle::new([vec![2, 0, 1]])));
    session.set_advance_mode(AdvanceMode::Shuffle);

    harness.player.play_selected().expect("play");
    harness.finish_track();
    assert_eq!(harness.playing(), Some(2));
    harness.finish_track();
    assert_eq!(harness.playing(), Some(0));
}

#[test]
fn completion_is_deferred_to_the_next_tick() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.player.next_song();
    assert_eq!(harness.current_file(), None);

    harness.player.service_audio().expect("tick");
    assert!(harness.player.transition_pending());
    assert_eq!(harness.playing(), Some(1));
    assert_eq!(harness.current_file(), None);

    harness.player.service_audio().expect("tick");
    assert!(!harness.player.transition_pending());
    assert_eq!(harness.current_file(), Some(PathBuf::from("b.mp3")));
}

#[test]
fn pending_completion_does_not_skip_a_chosen_track() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.player.next_song();
    harness.player.move_selection(2);
    harness.player.play_selected().expect("play");

    harness.player.service_audio().expect("tick");
    harness.player.service_audio().expect("tick");
    assert_eq!(harness.playing(), Some(2));
    assert_eq!(harness.current_file(), Some(PathBuf::from("c.mp3")));
    assert_eq!(
        harness.player.registry().active().expect("session").history(),
        &[0, 2]
    );
}

#[test]
fn enqueued_track_plays_next_and_is_popped_once() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.player.move_selection(2);
    harness.player.enqueue_selected();
    harness.player.enqueue_selected();

    harness.finish_track();
    let session = harness.player.registry().active().expect("session");
    assert_eq!(session.playing(), Some(2));
    assert_eq!(session.explicit_queue().len(), 1);
}

#[test]
fn quick_double_previous_walks_back_two_tracks() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.finish_track();
    harness.finish_track();
    assert_eq!(
        harness.player.registry().active().expect("session").history(),
        &[0, 1, 2]
    );

    harness.player.prev_song().expect("prev");
    assert_eq!(harness.playing(), Some(1));
    harness.player.prev_song().expect("prev");
    assert_eq!(harness.playing(), Some(0));
    assert_eq!(harness.current_file(), Some(PathBuf::from("a.mp3")));
}

#[test]
fn previous_after_threshold_restarts_current_track() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.finish_track();
    harness.clock.advance(5_000);
    harness.player.prev_song().expect("prev");
    assert_eq!(harness.playing(), Some(1));
    assert_eq!(harness.player.elapsed_ms(), 0);
}

#[test]
fn pause_round_trip_preserves_elapsed() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.clock.advance(2_500);
    harness.player.toggle_pause();
    assert!(harness.player.device().is_paused());
    harness.clock.advance(10_000);
    assert_eq!(harness.player.elapsed_ms(), 2_500);
    harness.player.toggle_pause();
    assert_eq!(harness.player.elapsed_ms(), 2_500);
    harness.clock.advance(500);
    assert_eq!(harness.player.elapsed_ms(), 3_000);
}

#[test]
fn seek_while_paused_moves_frozen_position() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.clock.advance(2_000);
    harness.player.toggle_pause();
    harness.clock.advance(7_000);
    harness.player.seek(10);
    assert_eq!(harness.player.elapsed_ms(), 12_000);
    harness.player.toggle_pause();
    harness.clock.advance(1_000);
    assert_eq!(harness.player.elapsed_ms(), 13_000);
}

#[test]
fn starting_a_track_while_paused_unpauses() {
    let mut harness = Harness::abc();
    harness.player.play_selected().expect("play");
    harness.player.toggle_pause();
    harness.player.move_selection(1);
    harness.player.play_selected().expect("play");
    assert!(!harness.player.device().is_paused());
    assert!(!harness.player.registry().active().expect("session").is_paused());
}

#[test]
fn idle_session_auto_starts_on_mode_change() {
    let mut harness = Harness::abc();
    harness
        .player
        .registry_mut()
        .session_mut(SessionId(0))
        .expect("session")
        .set_shuffle_source(Box::new(FixedShuffle::new([vec![1, 2, 0]])));

    harness.player.toggle_advance_mode().expect("mode");
    let session = harness.player.registry().active().expect("session");
    assert_eq!(session.mode(), AdvanceMode::Shuffle);
    assert_eq!(session.playing(), Some(1));
    assert_eq!(session.history(), &[1]);
    assert_eq!(harness.current_file(), Some(PathBuf::from("b.mp3")));
}

#[test]
fn completion_follows_playback_owner_not_focus() {
    let other = Playlist::new("other", ["x.mp3", "y.mp3"].map(PathBuf::from));
    let mut harness = Harness::new(vec![abc(), other], Settings::default());
    harness.player.play_selected().expect("play");
    assert!(harness.player.switch_to(1));

    harness.finish_track();
    let registry = harness.player.registry();
    assert_eq!(registry.active_id(), Some(SessionId(1)));
    assert_eq!(registry.session(SessionId(0)).expect("session").playing(), Some(1));
    assert_eq!(registry.session(SessionId(1)).expect("session").playing(), None);
    assert_eq!(harness.current_file(), Some(PathBuf::from("b.mp3")));
}

#[test]
fn playing_another_session_releases_the_first() {
    let other = Playlist::new("other", ["x.mp3", "y.mp3"].map(PathBuf::from));
    let mut harness = Harness::new(vec![abc(), other], Settings::default());
    harness.player.play_selected().expect("play");
    harness.player.switch_to(1);
    harness.player.play_selected().expect("play");

    let registry = harness.player.registry();
    assert_eq!(registry.playing_id(), Some(SessionId(1)));
    assert_eq!(registry.session(SessionId(0)).expect("session").playing(), None);
    assert_eq!(harness.current_file(), Some(PathBuf::from("x.mp3")));
}

#[test]
fn track_change_notifies_when_enabled() {
    let settings = Settings {
        notify_on_change: true,
        ..Settings::default()
    };
    let mut harness = Harness::new(vec![abc()], settings);
    harness.player.play_selected().expect("play");
    harness.finish_track();

    let notices = harness.notices.borrow();
    let bodies: Vec<&str> = notices
        .iter()
        .filter(|notice| notice.title == "Up Next")
        .map(|notice| notice.body.as_str())
        .collect();
    assert_eq!(bodies, vec!["a.mp3", "b.mp3"]);
}

#[test]
fn search_miss_is_reported() {
    let mut harness = Harness::abc();
    harness.player.search("zzz");
    let notices = harness.notices.borrow();
    let last = notices.last().expect("notice");
    assert_eq!(last.title, "Could not find song");
    assert_eq!(last.severity, Severity::Warning);
}

#[test]
fn idle_session_ignores_transport_commands() {
    let mut harness = Harness::abc();
    harness.player.toggle_pause();
    harness.player.seek(10);
    harness.player.next_song();
    harness.player.prev_song().expect("prev");
    harness.player.service_audio().expect("tick");
    assert_eq!(harness.playing(), None);
    assert_eq!(harness.current_file(), None);
    assert!(harness.notices.borrow().is_empty());
}

#[test]
fn repeat_search_at_list_edges_is_silent() {
    let mut harness = Harness::abc();
    harness.player.search("mp3");
    harness.player.search_prev();
    harness.player.move_selection(-1);
    harness.player.search_next();
    assert!(harness.notices.borrow().is_empty());
    assert_eq!(harness.player.registry().active().expect("session").selected(), 2);
}
