#![no_main]

use ampire::advance::RandomShuffle;
use ampire::audio::NullDevice;
use ampire::clock::ManualClock;
use ampire::model::{Playlist, Settings};
use ampire::notify::StatusNotifier;
use ampire::player::Player;
use ampire::registry::{Registry, Step};
use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;
use std::rc::Rc;

fuzz_target!(|data: &[u8]| {
    let Some((&shape, commands)) = data.split_first() else {
        return;
    };
    let playlists: Vec<Playlist> = (0..usize::from(shape % 4) + 1)
        .map(|list| {
            let len = usize::from(shape / 4 % 8) + list;
            Playlist::new(
                format!("list_{list}"),
                (0..len).map(|idx| PathBuf::from(format!("track_{idx}.mp3"))),
            )
        })
        .collect();

    let clock = Rc::new(ManualClock::new(0));
    let mut player = Player::new(
        Registry::new(playlists, 2),
        Box::new(NullDevice::new()),
        Box::new(Rc::clone(&clock)),
        Box::new(StatusNotifier::new()),
        Settings::default(),
    );
    for id in 0..player.registry().len() {
        if let Some(session) = player
            .registry_mut()
            .session_mut(ampire::session::SessionId(id))
        {
            session.set_shuffle_source(Box::new(RandomShuffle::seeded(u64::from(shape))));
        }
    }

    for byte in commands {
        clock.advance(u64::from(byte >> 4) * 250);
        let _ = match byte % 16 {
            0 => player.play_selected(),
            1 => {
                player.move_selection(1);
                Ok(())
            }
            2 => {
                player.move_selection(-1);
                Ok(())
            }
            3 => {
                player.toggle_pause();
                Ok(())
            }
            4 => {
                player.seek(10);
                Ok(())
            }
            5 => {
                player.seek(-10);
                Ok(())
            }
            6 => {
                player.next_song();
                Ok(())
            }
            7 => player.prev_song(),
            8 => {
                player.enqueue_selected();
                Ok(())
            }
            9 => player.toggle_advance_mode(),
            10 => {
                player.completion_signal().raise();
                Ok(())
            }
            11 => {
                player.switch_to(usize::from(byte >> 4) % 3);
                Ok(())
            }
            12 => {
                player.paginate(if byte & 0x10 == 0 { Step::Back } else { Step::Forward });
                Ok(())
            }
            13 => {
                player.delete_active();
                Ok(())
            }
            14 => {
                player.search("track_[13]");
                player.search_next();
                Ok(())
            }
            _ => player.service_audio(),
        };

        if let Some(owner) = player.registry().playing_id() {
            let playing = player
                .registry()
                .sessions()
                .iter()
                .filter(|session| session.playing().is_some())
                .count();
            assert_eq!(playing, 1, "only {owner:?} may own playback");
        }
        for (position, session) in player.registry().sessions().iter().enumerate() {
            assert_eq!(session.id().0, position);
            assert!(session.is_empty() || session.selected() < session.len());
            if let Some(index) = session.playing() {
                assert!(index < session.len());
            }
        }
    }
});
