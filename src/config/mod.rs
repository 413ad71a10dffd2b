// Configuration management for setlist
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub music_directories: Vec<PathBuf>,
    pub catalog_path: PathBuf,
    pub log_directory: PathBuf,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub volume: f32,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    /// How often the player is asked whether the track ended
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub recursive: bool,
    /// Songs pulled in when a playlist is created from the library
    pub default_playlist_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            fade_in_ms: 300,
            fade_out_ms: 200,
            poll_interval_ms: 250,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            default_playlist_size: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let app_dir = Self::app_dir().unwrap_or_else(|_| PathBuf::from(".setlist"));

        Self {
            music_directories: vec![
                dirs::audio_dir().unwrap_or_else(|| PathBuf::from("~/Music")),
            ],
            catalog_path: app_dir.join("playlists.json"),
            log_directory: app_dir.join("logs"),
            playback: PlaybackConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    fn app_dir() -> Result<PathBuf> {
        Ok(config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("setlist"))
    }
}
