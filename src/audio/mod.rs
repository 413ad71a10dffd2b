pub mod orchestrator;
#[cfg(feature = "audio")]
pub mod player;

pub use orchestrator::{Orchestrator, PlayOutcome};
#[cfg(feature = "audio")]
pub use player::{AudioPlayer, PlaybackState};

use crate::error::CoreResult;
use std::path::Path;
use std::time::Duration;

/// The sound device as the orchestrator sees it.
///
/// There is one device per process; it is owned by whoever drives playback
/// and handed to the orchestrator explicitly.
pub trait AudioBackend {
    /// Start playing `path`, replacing whatever was playing
    fn load_and_play(&mut self, path: &Path) -> CoreResult<()>;

    fn stop(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Clamped to 0.0..=1.0
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Milliseconds into the current track, 0 when idle
    fn position_ms(&self) -> u64;

    /// End-of-track notification. Returns `true` exactly once after a track
    /// plays to its end; stopping a track never reports it.
    fn take_finished(&mut self) -> bool;
}

/// Track length as reported by the decoder. `None` when the file can't be
/// opened or its format doesn't know its own length.
#[cfg(feature = "audio")]
pub fn read_duration(path: &Path) -> Option<Duration> {
    player::read_duration(path)
}

#[cfg(not(feature = "audio"))]
pub fn read_duration(_path: &Path) -> Option<Duration> {
    None
}

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub volume: f32, // 0.0 to 1.0
    pub fade_in_duration: u64, // milliseconds for smooth track start
    pub fade_out_duration: u64, // milliseconds for smooth track stop
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            fade_in_duration: 300,  // 300ms smooth fade in
            fade_out_duration: 200, // 200ms smooth fade out
        }
    }
}

impl From<&crate::config::Config> for AudioConfig {
    fn from(config: &crate::config::Config) -> Self {
        AudioConfig {
            volume: config.playback.volume.clamp(0.0, 1.0),
            fade_in_duration: config.playback.fade_in_ms,
            fade_out_duration: config.playback.fade_out_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Mp4,
    Wav,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "ogg" | "oga" => AudioFormat::Ogg,
            "mp4" | "m4a" | "aac" => AudioFormat::Mp4,
            "wav" => AudioFormat::Wav,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_extension("MP3"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_extension(".m4a"), AudioFormat::Mp4);
        assert_eq!(AudioFormat::from_extension("oga"), AudioFormat::Ogg);
        assert!(!AudioFormat::from_extension("txt").is_supported());
    }

    #[test]
    fn test_audio_config_from_config_clamps_volume() {
        let mut config = crate::config::Config::default();
        config.playback.volume = 3.0;
        let audio = AudioConfig::from(&config);
        assert_eq!(audio.volume, 1.0);
        assert_eq!(audio.fade_in_duration, config.playback.fade_in_ms);
    }
}
