use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["wav", "ogg", "mp3", "opus", "flac"];

pub fn collect_tracks(dirs: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut tracks = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            warn!(path = %dir.display(), "skipping missing directory");
            continue;
        }
        let before = tracks.len();
        tracks.extend(scan_dir(dir, recursive));
        debug!(path = %dir.display(), found = tracks.len() - before, "scanned directory");
    }
    tracks
}

fn scan_dir(root: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).follow_links(true).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_audio(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
