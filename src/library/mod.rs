// Music library snapshot - the ordered set of songs everything else references
// Scanning happens once up front; after that the library is read-only

pub mod scanner;
pub mod song;

pub use scanner::MusicScanner;
pub use song::Song;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered, read-only snapshot of the songs on disk
#[derive(Debug, Clone, Default)]
pub struct Library {
    songs: Vec<Song>,
    by_path: HashMap<PathBuf, usize>,
}

impl Library {
    /// Later songs sharing a `file_path` with an earlier one are dropped
    pub fn from_songs(songs: Vec<Song>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(songs.len());
        for song in songs {
            if seen.insert(song.file_path().to_path_buf()) {
                unique.push(song);
            } else {
                debug!("Skipping duplicate library entry {}", song.file_path().display());
            }
        }

        let by_path = unique
            .iter()
            .enumerate()
            .map(|(idx, song)| (song.file_path().to_path_buf(), idx))
            .collect();

        Self { songs: unique, by_path }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get_by_path(&self, path: &Path) -> Option<&Song> {
        self.by_path.get(path).and_then(|&idx| self.songs.get(idx))
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    /// Songs whose title or artist contains `query`, library order
    pub fn search(&self, query: &str) -> Vec<&Song> {
        self.songs.iter().filter(|song| song.matches_query(query)).collect()
    }

    pub fn filter_by_artist(&self, artist: &str) -> Vec<&Song> {
        let artist = artist.to_lowercase();
        self.songs
            .iter()
            .filter(|song| song.artist().to_lowercase() == artist)
            .collect()
    }

    /// `file_type` is compared with or without the leading dot
    pub fn filter_by_file_type(&self, file_type: &str) -> Vec<&Song> {
        let wanted = file_type.trim_start_matches('.').to_lowercase();
        self.songs
            .iter()
            .filter(|song| song.file_type().trim_start_matches('.') == wanted)
            .collect()
    }

    pub fn artists(&self) -> Vec<String> {
        self.songs
            .iter()
            .map(|song| song.artist().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn file_types(&self) -> Vec<String> {
        self.songs
            .iter()
            .map(|song| song.file_type().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn statistics(&self) -> LibraryStats {
        let mut artist_counts: HashMap<&str, usize> = HashMap::new();
        let mut file_type_counts = BTreeMap::new();

        for song in &self.songs {
            *artist_counts.entry(song.artist()).or_default() += 1;
            *file_type_counts.entry(song.file_type().to_string()).or_default() += 1;
        }

        let mut artist_counts: Vec<(String, usize)> = artist_counts
            .into_iter()
            .map(|(artist, count)| (artist.to_string(), count))
            .collect();
        // Most songs first, names break ties so output is stable
        artist_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        LibraryStats {
            total_songs: self.songs.len(),
            total_size_bytes: self.songs.iter().map(Song::file_size_bytes).sum(),
            unique_artists: artist_counts.len(),
            artist_counts,
            file_type_counts,
        }
    }
}

/// Aggregate numbers about a library
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LibraryStats {
    pub total_songs: usize,
    pub total_size_bytes: u64,
    pub unique_artists: usize,
    pub artist_counts: Vec<(String, usize)>,
    pub file_type_counts: BTreeMap<String, usize>,
}

impl LibraryStats {
    pub fn total_size_mb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0)
    }
}
