use crate::library::Song;
use std::collections::VecDeque;

/// Strict FIFO of songs to play ahead of anything else
#[derive(Debug, Clone, Default)]
pub struct PlayNextQueue {
    songs: VecDeque<Song>,
}

impl PlayNextQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, song: Song) {
        self.songs.push_back(song);
    }

    pub fn dequeue(&mut self) -> Option<Song> {
        self.songs.pop_front()
    }

    pub fn peek(&self) -> Option<&Song> {
        self.songs.front()
    }

    pub fn clear(&mut self) {
        self.songs.clear();
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Front (plays first) to back
    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }
}
