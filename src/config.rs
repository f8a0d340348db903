use crate::model::Settings;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ampire";
const SETTINGS_FILE: &str = "settings.json";
const PLAYLISTS_FILE: &str = "playlists";
const LOG_DIR: &str = "logs";

pub const CONFIG_DIR_ENV: &str = "AMPIRE_CONFIG_DIR";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn playlists_path(root: &Path) -> PathBuf {
    root.join(PLAYLISTS_FILE)
}

pub fn log_dir(root: &Path) -> PathBuf {
    root.join(LOG_DIR)
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings_from(root: &Path) -> Result<Settings> {
    let path = settings_path(root);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings_to(root: &Path, settings: &Settings) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))?;
    let path = settings_path(root);
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
