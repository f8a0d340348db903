use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_VOLUME: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AdvanceMode {
    #[default]
    Normal,
    Shuffle,
    Loop,
}

impl AdvanceMode {
    pub fn next(self) -> Self {
        match self {
            Self::Normal => Self::Shuffle,
            Self::Shuffle => Self::Loop,
            Self::Loop => Self::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Shuffle => "Shuffle",
            Self::Loop => "Loop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub name: String,
}

impl Track {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
    pub from_cli: bool,
}

impl Playlist {
    pub fn new(name: impl Into<String>, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            name: name.into(),
            tracks: paths.into_iter().map(Track::from_path).collect(),
            from_cli: false,
        }
    }

    pub fn from_cli(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            from_cli: true,
            ..Self::new(UNNAMED_PLAYLIST, paths)
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.tracks.iter().map(|track| track.path.clone()).collect()
    }
}

pub const UNNAMED_PLAYLIST: &str = "unnamed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume(u8);

impl Volume {
    pub fn new(level: u8) -> Self {
        Self(level.min(MAX_VOLUME))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn raised(self, step: u8) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    pub fn lowered(self, step: u8) -> Self {
        Self(self.0.saturating_sub(step))
    }

    pub fn is_muted(self) -> bool {
        self.0 == 0
    }

    pub fn percent(self) -> u16 {
        u16::from(self.0) * 100 / u16::from(MAX_VOLUME)
    }

    pub fn as_gain(self) -> f32 {
        f32::from(self.0) / f32::from(MAX_VOLUME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_seek_step_seconds")]
    pub seek_step_seconds: u32,
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,
    #[serde(default = "default_input_timeout_ms")]
    pub input_timeout_ms: u64,
    #[serde(default)]
    pub notify_on_change: bool,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_show_logo")]
    pub show_logo: bool,
}

fn default_volume() -> u8 {
    68
}

fn default_volume_step() -> u8 {
    10
}

fn default_page_size() -> usize {
    9
}

fn default_seek_step_seconds() -> u32 {
    10
}

fn default_restart_threshold_ms() -> u64 {
    1_000
}

fn default_input_timeout_ms() -> u64 {
    100
}

fn default_show_logo() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            volume_step: default_volume_step(),
            page_size: default_page_size(),
            seek_step_seconds: default_seek_step_seconds(),
            restart_threshold_ms: default_restart_threshold_ms(),
            input_timeout_ms: default_input_timeout_ms(),
            notify_on_change: false,
            recursive: false,
            show_logo: default_show_logo(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycles_through_all_variants() {
        let mode = AdvanceMode::Normal;
        assert_eq!(mode.next(), AdvanceMode::Shuffle);
        assert_eq!(mode.next().next(), AdvanceMode::Loop);
        assert_eq!(mode.next().next().next(), AdvanceMode::Normal);
    }

    #[test]
    fn track_name_is_basename() {
        let track = Track::from_path("/music/albums/b.mp3");
        assert_eq!(track.name, "b.mp3");
        assert_eq!(track.path, PathBuf::from("/music/albums/b.mp3"));
    }

    #[test]
    fn volume_clamps_to_range() {
        assert_eq!(Volume::new(200).level(), MAX_VOLUME);
        assert_eq!(Volume::new(5).lowered(10).level(), 0);
        assert_eq!(Volume::new(125).raised(10).level(), MAX_VOLUME);
        assert_eq!(Volume::new(MAX_VOLUME).percent(), 100);
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"volume": 20}"#).expect("parse");
        assert_eq!(settings.volume, 20);
        assert_eq!(settings.page_size, 9);
        assert_eq!(settings.restart_threshold_ms, 1_000);
        assert!(settings.show_logo);
    }
}
