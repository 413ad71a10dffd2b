use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// One track as handed out by the library. Every container holds its own clone.
///
/// `file_path` is the identity of the underlying file. User-facing lookups
/// (remove, insert-after, upvote) go by title instead, which may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    file_type: String,
    #[serde(default)]
    file_path: PathBuf,
    #[serde(rename = "file_size", default)]
    file_size_bytes: u64,
    #[serde(rename = "duration", default, deserialize_with = "de_duration")]
    duration_ms: u64,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let file_type = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        Self {
            title: title.into(),
            artist: artist.into(),
            file_type,
            file_path,
            file_size_bytes: 0,
            duration_ms: 0,
        }
    }

    /// Build a song from a file named "Artist - Title.ext".
    /// Without the separator the whole stem is the title.
    pub fn from_path(file_path: impl Into<PathBuf>, file_size_bytes: u64) -> Self {
        let file_path = file_path.into();
        let stem = file_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Unknown")
            .to_string();

        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
            None => (UNKNOWN_ARTIST.to_string(), stem),
        };

        Song::new(title, artist, file_path).with_file_size(file_size_bytes)
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size_bytes = bytes;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_size_bytes(&self) -> u64 {
        self.file_size_bytes
    }

    /// 0 when unknown
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Case-insensitive title equality
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }

    /// Case-insensitive substring match on title or artist
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.artist.to_lowercase().contains(&query)
    }

    pub fn same_file(&self, other: &Song) -> bool {
        self.file_path == other.file_path
    }

    pub fn display_line(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }

    pub fn duration_string(&self) -> String {
        if self.duration_ms == 0 {
            return "--:--".to_string();
        }
        let total_secs = self.duration_ms / 1000;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}

// Older playlist files stored durations as floating point milliseconds
fn de_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value.round() as u64)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_splits_artist_and_title() {
        let song = Song::from_path("/music/Daft Punk - One More Time.MP3", 2048);
        assert_eq!(song.artist(), "Daft Punk");
        assert_eq!(song.title(), "One More Time");
        assert_eq!(song.file_type(), ".mp3");
        assert_eq!(song.file_size_bytes(), 2048);
        assert_eq!(song.duration_ms(), 0);

        let song = Song::from_path("/music/Interlude.flac", 10);
        assert_eq!(song.artist(), "Unknown Artist");
        assert_eq!(song.title(), "Interlude");

        // only the first separator splits
        let song = Song::from_path("/music/A - B - C.ogg", 1);
        assert_eq!(song.artist(), "A");
        assert_eq!(song.title(), "B - C");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let song = Song::new("Moon River", "Audrey", "/m/moon.mp3");
        assert!(song.title_matches("MOON river"));
        assert!(!song.title_matches("moon"));
        assert!(song.matches_query("RIV"));
        assert!(song.matches_query("aud"));
        assert!(!song.matches_query("sun"));
    }

    #[test]
    fn test_deserialize_with_only_path() {
        let song: Song = serde_json::from_str(r#"{"file_path": "/m/x.wav", "duration": 1234.6}"#).unwrap();
        assert_eq!(song.file_path(), Path::new("/m/x.wav"));
        assert_eq!(song.title(), "");
        assert_eq!(song.duration_ms(), 1235);
    }

    #[test]
    fn test_duration_string() {
        let song = Song::new("t", "a", "/m/t.mp3").with_duration_ms(3_725_000);
        assert_eq!(song.duration_string(), "1:02:05");
        let song = Song::new("t", "a", "/m/t.mp3").with_duration_ms(65_000);
        assert_eq!(song.duration_string(), "1:05");
    }
}
