use crate::error::{CoreError, CoreResult};
use crate::library::Song;
use std::cmp::Reverse;
use tracing::debug;

/// A queued song with its vote count
#[derive(Debug, Clone, PartialEq)]
pub struct PartyEntry {
    pub song: Song,
    pub priority: i64,
    seq: u64,
}

/// Crowd-ordered queue: highest priority plays first, and songs with equal
/// priority play in the order they were queued.
///
/// Queues are expected to stay small, so every change simply re-sorts.
#[derive(Debug, Clone, Default)]
pub struct PartyQueue {
    entries: Vec<PartyEntry>,
    next_seq: u64,
}

impl PartyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, song: Song, priority: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(PartyEntry { song, priority, seq });
        self.resort();
    }

    pub fn dequeue(&mut self) -> Option<Song> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries.remove(0).song)
    }

    pub fn peek(&self) -> Option<&PartyEntry> {
        self.entries.first()
    }

    /// Bump the first song titled `title` by one vote. Returns its new priority.
    pub fn upvote(&mut self, title: &str) -> CoreResult<i64> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.song.title_matches(title))
            .ok_or_else(|| CoreError::NotFound(title.to_string()))?;

        entry.priority = entry.priority.saturating_add(1);
        let priority = entry.priority;
        self.resort();
        debug!("Upvoted '{}' to {}", title, priority);
        Ok(priority)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they will play
    pub fn iter(&self) -> impl Iterator<Item = &PartyEntry> {
        self.entries.iter()
    }

    fn resort(&mut self) {
        self.entries
            .sort_by_key(|entry| (Reverse(entry.priority), entry.seq));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song {
        Song::new(title, "DJ", format!("/m/{}.mp3", title))
    }

    fn order(queue: &PartyQueue) -> Vec<(String, i64)> {
        queue
            .iter()
            .map(|e| (e.song.title().to_string(), e.priority))
            .collect()
    }

    fn assert_sorted_and_stable(queue: &PartyQueue) {
        for pair in queue.entries.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
            if pair[0].priority == pair[1].priority {
                assert!(pair[0].seq < pair[1].seq);
            }
        }
    }

    #[test]
    fn test_priority_then_insertion_order() {
        let mut queue = PartyQueue::new();
        queue.enqueue(song("S1"), 0);
        queue.enqueue(song("S2"), 0);
        queue.enqueue(song("S3"), 5);

        let played: Vec<_> = std::iter::from_fn(|| queue.dequeue())
            .map(|s| s.title().to_string())
            .collect();
        assert_eq!(played, vec!["S3", "S1", "S2"]);
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_upvote_reorders() {
        let mut queue = PartyQueue::new();
        queue.enqueue(song("S1"), 0);
        queue.enqueue(song("S2"), 0);

        assert_eq!(queue.upvote("s2").unwrap(), 1);
        assert_eq!(queue.peek().unwrap().song.title(), "S2");
        assert_eq!(order(&queue), vec![("S2".into(), 1), ("S1".into(), 0)]);

        assert!(queue.upvote("missing").unwrap_err().is_not_found());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order_after_upvotes() {
        let mut queue = PartyQueue::new();
        queue.enqueue(song("A"), 0);
        queue.enqueue(song("B"), 0);
        queue.enqueue(song("C"), 1);

        // B catches up with C but was queued first
        queue.upvote("B").unwrap();
        assert_eq!(
            order(&queue),
            vec![("B".into(), 1), ("C".into(), 1), ("A".into(), 0)]
        );
        assert_sorted_and_stable(&queue);
    }

    #[test]
    fn test_many_operations_stay_sorted() {
        let mut queue = PartyQueue::new();
        for i in 0..30i64 {
            queue.enqueue(song(&format!("T{}", i % 7)), i % 4);
            if i % 3 == 0 {
                let _ = queue.upvote(&format!("t{}", (i * 5) % 7));
            }
            if i % 11 == 0 {
                queue.dequeue();
            }
            assert_sorted_and_stable(&queue);
        }
    }

    #[test]
    fn test_upvote_hits_first_title_match_in_queue_order() {
        let mut queue = PartyQueue::new();
        queue.enqueue(Song::new("Dup", "low", "/m/low.mp3"), 0);
        queue.enqueue(Song::new("Dup", "high", "/m/high.mp3"), 3);
        queue.upvote("dup").unwrap();
        assert_eq!(queue.peek().unwrap().song.artist(), "high");
        assert_eq!(queue.peek().unwrap().priority, 4);
    }

    #[test]
    fn test_upvote_at_max_priority_stays_in_front() {
        let mut queue = PartyQueue::new();
        queue.enqueue(song("Top"), i64::MAX);
        queue.enqueue(song("Next"), i64::MAX - 1);

        assert_eq!(queue.upvote("top").unwrap(), i64::MAX);
        assert_eq!(queue.upvote("next").unwrap(), i64::MAX);
        // tied now, so arrival order decides
        assert_eq!(
            order(&queue),
            vec![("Top".into(), i64::MAX), ("Next".into(), i64::MAX)]
        );
        assert_sorted_and_stable(&queue);
    }

    #[test]
    fn test_clear() {
        let mut queue = PartyQueue::new();
        queue.enqueue(song("A"), 2);
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.peek().is_none());
    }
}
