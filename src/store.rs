use crate::model::Playlist;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PLAYLIST_MARKER: &str = "#ampire-playlist";

/// Flat-file playlist storage: a marker line, the playlist name, then one
/// track path per line until the next marker.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    path: PathBuf,
}

impl PlaylistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all_playlists(&self) -> Result<Vec<Playlist>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read playlists file {}", self.path.display()))?;
        Ok(parse_playlists(&raw))
    }

    pub fn write_new_playlist(&self, name: &str, paths: &[PathBuf]) -> Result<()> {
        let mut playlists = self.read_all_playlists()?;
        playlists.retain(|playlist| playlist.name != name);
        playlists.push(Playlist::new(name, paths.iter().cloned()));
        self.write_all(&playlists)?;
        info!(name, tracks = paths.len(), "saved new playlist");
        Ok(())
    }

    pub fn replace_playlist_songs(&self, name: &str, paths: &[PathBuf]) -> Result<bool> {
        let mut playlists = self.read_all_playlists()?;
        let Some(existing) = playlists.iter_mut().find(|playlist| playlist.name == name) else {
            return Ok(false);
        };
        *existing = Playlist::new(name, paths.iter().cloned());
        self.write_all(&playlists)?;
        info!(name, tracks = paths.len(), "replaced playlist songs");
        Ok(true)
    }

    pub fn delete_playlist(&self, name: &str) -> Result<bool> {
        let mut playlists = self.read_all_playlists()?;
        let before = playlists.len();
        playlists.retain(|playlist| playlist.name != name);
        if playlists.len() == before {
            return Ok(false);
        }
        self.write_all(&playlists)?;
        info!(name, "deleted stored playlist");
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        info!(path = %self.path.display(), "cleared saved playlists");
        Ok(())
    }

    fn write_all(&self, playlists: &[Playlist]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, render_playlists(playlists))
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = playlists.len(), "wrote playlists file");
        Ok(())
    }
}

pub fn parse_playlists(raw: &str) -> Vec<Playlist> {
    let mut playlists = Vec::new();
    let mut lines = raw.lines().map(str::trim_end).filter(|line| !line.is_empty()).peekable();

    while let Some(line) = lines.next() {
        if line != PLAYLIST_MARKER {
            // Stray path lines before the first marker carry no name.
            continue;
        }
        let Some(name) = lines.next_if(|line| *line != PLAYLIST_MARKER) else {
            continue;
        };
        let mut paths = Vec::new();
        while let Some(path) = lines.next_if(|line| *line != PLAYLIST_MARKER) {
            paths.push(PathBuf::from(path));
        }
        playlists.push(Playlist::new(name, paths));
    }

    playlists
}

pub fn render_playlists(playlists: &[Playlist]) -> String {
    let mut out = String::new();
    for playlist in playlists {
        out.push_str(PLAYLIST_MARKER);
        out.push('\n');
        out.push_str(&playlist.name);
        out.push('\n');
        for track in &playlist.tracks {
            out.push_str(&track.path.to_string_lossy());
            out.push('\n');
        }
    }
    out
}
