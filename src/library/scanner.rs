use super::{Library, Song};
use crate::audio::{self, AudioFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Walks music directories and turns supported files into `Song` records.
/// Titles and artists come from "Artist - Title" file names. Durations come
/// from the decoder's header and stay 0 when it can't tell.
#[derive(Debug, Clone)]
pub struct MusicScanner {
    recursive: bool,
}

impl MusicScanner {
    pub fn new() -> Self {
        Self { recursive: true }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn scan_directory<P: AsRef<Path>>(&self, path: P) -> Vec<Song> {
        let mut walker = WalkDir::new(path.as_ref()).follow_links(true);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut songs = Vec::new();
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let entry_path = entry.path();

            // Skip hidden files (dotfiles)
            if entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with('.'))
            {
                continue;
            }

            if !self.is_supported_file(entry_path) {
                continue;
            }

            let size = match fs::metadata(entry_path) {
                Ok(metadata) if metadata.len() > 0 => metadata.len(),
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            let duration_ms = match audio::read_duration(entry_path) {
                Some(duration) => duration.as_millis() as u64,
                None => {
                    debug!("No duration for {}", entry_path.display());
                    0
                }
            };
            songs.push(Song::from_path(entry_path, size).with_duration_ms(duration_ms));
        }

        songs.sort_by(|a, b| a.file_path().cmp(b.file_path()));
        songs
    }

    pub fn scan_directories(&self, paths: &[PathBuf]) -> Vec<Song> {
        let mut all_songs = Vec::new();

        for path in paths {
            if !path.exists() {
                warn!("Music directory does not exist: {}", path.display());
                continue;
            }
            let mut songs = self.scan_directory(path);
            info!("Found {} songs in {}", songs.len(), path.display());
            all_songs.append(&mut songs);
        }

        all_songs
    }

    pub fn scan_library(&self, paths: &[PathBuf]) -> Library {
        Library::from_songs(self.scan_directories(paths))
    }

    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AudioFormat::from_extension(ext).is_supported())
            .unwrap_or(false)
    }
}

impl Default for MusicScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_scan_keeps_supported_non_empty_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Artist B - Second.mp3", b"data");
        touch(dir.path(), "Artist A - First.flac", b"more data");
        touch(dir.path(), "notes.txt", b"text");
        touch(dir.path(), "empty.mp3", b"");
        touch(dir.path(), ".hidden.mp3", b"data");

        let songs = MusicScanner::new().scan_directory(dir.path());
        let titles: Vec<_> = songs.iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(songs[0].artist(), "Artist A");
        assert_eq!(songs[0].file_size_bytes(), 9);
    }

    #[cfg(feature = "audio")]
    /// 16-bit mono PCM at 8 kHz, `samples` frames of silence
    fn wav_bytes(samples: u32) -> Vec<u8> {
        let sample_rate: u32 = 8000;
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        bytes
    }

    #[cfg(feature = "audio")]
    #[test]
    fn test_scan_reads_track_length() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Tone - Two Seconds.wav", &wav_bytes(16_000));
        touch(dir.path(), "Broken - Noise.mp3", b"not really audio");

        let songs = MusicScanner::new().scan_directory(dir.path());
        assert_eq!(songs.len(), 2);
        let tone = songs.iter().find(|s| s.title() == "Two Seconds").unwrap();
        assert!(
            (1900..=2100).contains(&tone.duration_ms()),
            "got {} ms",
            tone.duration_ms()
        );

        // undecodable files are still listed, just without a length
        let noise = songs.iter().find(|s| s.title() == "Noise").unwrap();
        assert_eq!(noise.duration_ms(), 0);
    }

    #[test]
    fn test_non_recursive_scan_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Top.ogg", b"x");
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "Deep.ogg", b"x");

        assert_eq!(MusicScanner::new().scan_directory(dir.path()).len(), 2);
        assert_eq!(MusicScanner::new().recursive(false).scan_directory(dir.path()).len(), 1);
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Song.wav", b"x");
        let library = MusicScanner::new()
            .scan_library(&[dir.path().join("missing"), dir.path().to_path_buf()]);
        assert_eq!(library.len(), 1);
    }
}
