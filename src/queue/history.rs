use crate::library::Song;

/// Append-only log of everything that started playing, oldest first
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    songs: Vec<Song>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, song: Song) {
        self.songs.push(song);
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn last(&self) -> Option<&Song> {
        self.songs.last()
    }

    /// Every entry whose title or artist contains `query`, oldest first
    pub fn search(&self, query: &str) -> Vec<&Song> {
        self.songs
            .iter()
            .filter(|song| song.matches_query(query))
            .collect()
    }

    /// The `limit` most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&Song> {
        self.songs.iter().rev().take(limit).collect()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }
}
