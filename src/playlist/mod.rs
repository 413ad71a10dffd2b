// Playlists - cursor-navigable song sequences and the catalog that names them
// Nodes live in an arena and link to each other by index, so splicing stays O(1)
// without shared ownership between neighbours

pub mod catalog;
pub mod store;

pub use catalog::Catalog;
pub use store::CatalogStore;

use crate::error::{CoreError, CoreResult};
use crate::library::Song;
use rand::Rng;
use std::path::Path;
use tracing::debug;

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    song: Song,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Doubly-linked playlist with a "now playing" cursor.
///
/// The cursor is unset only while the playlist is empty: adding the first
/// song selects it, and removing the selected song moves the cursor to its
/// successor (or predecessor). Navigation never wraps around.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    cursor: Option<NodeId>,
    len: usize,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn add_at_end(&mut self, song: Song) {
        let id = self.alloc(Node {
            song,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(id);
                }
            }
            None => {
                self.head = Some(id);
                self.cursor = Some(id);
            }
        }
        self.tail = Some(id);
        self.len += 1;
    }

    pub fn add_at_start(&mut self, song: Song) {
        let id = self.alloc(Node {
            song,
            prev: None,
            next: self.head,
        });

        match self.head {
            Some(head) => {
                if let Some(node) = self.node_mut(head) {
                    node.prev = Some(id);
                }
            }
            None => {
                self.tail = Some(id);
                self.cursor = Some(id);
            }
        }
        self.head = Some(id);
        self.len += 1;
    }

    /// Splice `song` right after the first song titled `target` (case-insensitive).
    /// Leaves the playlist untouched when nothing matches.
    pub fn insert_after(&mut self, target: &str, song: Song) -> CoreResult<()> {
        let at = self
            .find_title(target)
            .ok_or_else(|| CoreError::NotFound(target.to_string()))?;
        let next = self.node(at).and_then(|node| node.next);

        let id = self.alloc(Node {
            song,
            prev: Some(at),
            next,
        });
        if let Some(node) = self.node_mut(at) {
            node.next = Some(id);
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.len += 1;
        Ok(())
    }

    /// Splice `song` right before the first song titled `target` (case-insensitive).
    pub fn insert_before(&mut self, target: &str, song: Song) -> CoreResult<()> {
        let at = self
            .find_title(target)
            .ok_or_else(|| CoreError::NotFound(target.to_string()))?;
        let prev = self.node(at).and_then(|node| node.prev);

        let id = self.alloc(Node {
            song,
            prev,
            next: Some(at),
        });
        if let Some(node) = self.node_mut(at) {
            node.prev = Some(id);
        }
        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.len += 1;
        Ok(())
    }

    /// Unlink the first song titled `title` and hand it back.
    pub fn remove(&mut self, title: &str) -> CoreResult<Song> {
        let id = self
            .find_title(title)
            .ok_or_else(|| CoreError::NotFound(title.to_string()))?;
        let node = self
            .nodes
            .get_mut(id)
            .and_then(Option::take)
            .ok_or_else(|| CoreError::NotFound(title.to_string()))?;
        self.free.push(id);

        if self.cursor == Some(id) {
            self.cursor = node.next.or(node.prev);
        }

        match node.prev {
            Some(prev) => {
                if let Some(prev_node) = self.node_mut(prev) {
                    prev_node.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next_node) = self.node_mut(next) {
                    next_node.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.len -= 1;
        if self.len == 0 {
            self.nodes.clear();
            self.free.clear();
        }
        debug!("Removed '{}' from playlist", node.song.title());
        Ok(node.song)
    }

    /// Advance the cursor. `None` (cursor untouched) at the tail or when unset.
    pub fn next(&mut self) -> Option<&Song> {
        let next = self.node(self.cursor?)?.next?;
        self.cursor = Some(next);
        self.song_at(next)
    }

    /// Step the cursor back. `None` (cursor untouched) at the head or when unset.
    pub fn previous(&mut self) -> Option<&Song> {
        let prev = self.node(self.cursor?)?.prev?;
        self.cursor = Some(prev);
        self.song_at(prev)
    }

    pub fn current(&self) -> Option<&Song> {
        self.song_at(self.cursor?)
    }

    pub fn go_to_first(&mut self) -> Option<&Song> {
        let head = self.head?;
        self.cursor = Some(head);
        self.song_at(head)
    }

    pub fn go_to_last(&mut self) -> Option<&Song> {
        let tail = self.tail?;
        self.cursor = Some(tail);
        self.song_at(tail)
    }

    /// First song from the head whose title or artist contains `query`
    pub fn search(&self, query: &str) -> Option<&Song> {
        self.iter().find(|song| song.matches_query(query))
    }

    /// 0-based position of the cursor in playback order
    pub fn current_position(&self) -> Option<usize> {
        let cursor = self.cursor?;
        self.ids().position(|id| id == cursor)
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.iter().any(|song| song.file_path() == path)
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Shuffle by `2 * len` random pair swaps, then point the cursor at the new head.
    /// This matches the order playlists were always shuffled in; it is not a
    /// uniform permutation.
    pub fn shuffle_with<R: Rng>(&mut self, rng: &mut R) {
        if self.len <= 1 {
            return;
        }

        let mut songs = self.take_all();
        let size = songs.len();
        for _ in 0..size * 2 {
            let i = rng.gen_range(0..size);
            let j = rng.gen_range(0..size);
            if i != j {
                songs.swap(i, j);
            }
        }

        for song in songs {
            self.add_at_end(song);
        }
        self.cursor = self.head;
        debug!("Shuffled playlist of {} songs", size);
    }

    /// Reverse playback order in place. The cursor stays on the same song.
    pub fn reverse(&mut self) {
        if self.len <= 1 {
            return;
        }

        for node in self.nodes.iter_mut().flatten() {
            std::mem::swap(&mut node.prev, &mut node.next);
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Songs from head to tail
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            playlist: self,
            next: self.head,
            forward: true,
        }
    }

    /// Songs from tail to head
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            playlist: self,
            next: self.tail,
            forward: false,
        }
    }

    pub fn songs(&self) -> Vec<Song> {
        self.iter().cloned().collect()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn song_at(&self, id: NodeId) -> Option<&Song> {
        self.node(id).map(|node| &node.song)
    }

    fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.head, move |&id| self.node(id).and_then(|node| node.next))
    }

    fn find_title(&self, title: &str) -> Option<NodeId> {
        self.ids()
            .find(|&id| self.node(id).map_or(false, |node| node.song.title_matches(title)))
    }

    /// Empty the arena, returning songs in playback order
    fn take_all(&mut self) -> Vec<Song> {
        let mut songs = Vec::with_capacity(self.len);
        let mut current = self.head;
        while let Some(id) = current {
            match self.nodes.get_mut(id).and_then(Option::take) {
                Some(node) => {
                    current = node.next;
                    songs.push(node.song);
                }
                None => break,
            }
        }
        self.clear();
        songs
    }
}

impl FromIterator<Song> for Playlist {
    fn from_iter<I: IntoIterator<Item = Song>>(iter: I) -> Self {
        let mut playlist = Playlist::new();
        playlist.extend(iter);
        playlist
    }
}

impl Extend<Song> for Playlist {
    fn extend<I: IntoIterator<Item = Song>>(&mut self, iter: I) {
        for song in iter {
            self.add_at_end(song);
        }
    }
}

pub struct Iter<'a> {
    playlist: &'a Playlist,
    next: Option<NodeId>,
    forward: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Song;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.playlist.node(self.next?)?;
        self.next = if self.forward { node.next } else { node.prev };
        Some(&node.song)
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a Song;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn song(title: &str, artist: &str) -> Song {
        Song::new(title, artist, format!("/music/{} - {}.mp3", artist, title))
    }

    fn titles(playlist: &Playlist) -> Vec<String> {
        playlist.iter().map(|s| s.title().to_string()).collect()
    }

    fn assert_links(playlist: &Playlist) {
        let forward = playlist.iter().count();
        let backward = playlist.iter_rev().count();
        assert_eq!(forward, playlist.len());
        assert_eq!(backward, playlist.len());

        let mut rev: Vec<_> = playlist.iter_rev().collect();
        rev.reverse();
        assert_eq!(rev, playlist.iter().collect::<Vec<_>>());

        match playlist.cursor {
            Some(id) => assert!(playlist.ids().any(|live| live == id)),
            None => assert!(playlist.is_empty()),
        }
    }

    fn road_trip() -> Playlist {
        [song("Sun", "X"), song("Moon", "Y"), song("Star", "Z")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_first_add_sets_cursor() {
        let mut playlist = Playlist::new();
        assert!(playlist.current().is_none());
        playlist.add_at_start(song("A", "a"));
        assert_eq!(playlist.current().unwrap().title(), "A");
        playlist.add_at_start(song("B", "b"));
        playlist.add_at_end(song("C", "c"));
        assert_eq!(titles(&playlist), vec!["B", "A", "C"]);
        assert_eq!(playlist.current().unwrap().title(), "A");
        assert_links(&playlist);
    }

    #[test]
    fn test_road_trip_scenario() {
        let mut playlist = road_trip();
        assert_eq!(playlist.go_to_first().unwrap().title(), "Sun");
        assert_eq!(playlist.next().unwrap().title(), "Moon");

        playlist.insert_after("Moon", song("Comet", "W")).unwrap();
        assert_eq!(titles(&playlist), vec!["Sun", "Moon", "Comet", "Star"]);

        playlist.remove("Sun").unwrap();
        assert_eq!(playlist.current().unwrap().title(), "Moon");
        assert_eq!(playlist.iter().next().unwrap().title(), "Moon");
        assert_links(&playlist);
    }

    #[test]
    fn test_insert_misses_leave_playlist_unchanged() {
        let mut empty = Playlist::new();
        assert!(empty.insert_after("x", song("A", "a")).unwrap_err().is_not_found());
        assert!(empty.insert_before("x", song("A", "a")).is_err());
        assert!(empty.is_empty());

        let mut playlist = road_trip();
        let err = playlist.insert_after("Comet", song("A", "a")).unwrap_err();
        assert_eq!(err, CoreError::NotFound("Comet".to_string()));
        assert_eq!(titles(&playlist), vec!["Sun", "Moon", "Star"]);
        assert_eq!(playlist.len(), 3);
    }

    #[test]
    fn test_insert_updates_head_and_tail() {
        let mut playlist = road_trip();
        playlist.insert_after("STAR", song("Last", "l")).unwrap();
        playlist.insert_before("sun", song("First", "f")).unwrap();
        playlist.insert_before("Moon", song("Mid", "m")).unwrap();
        assert_eq!(titles(&playlist), vec!["First", "Sun", "Mid", "Moon", "Star", "Last"]);
        assert_eq!(playlist.go_to_last().unwrap().title(), "Last");
        assert_eq!(playlist.go_to_first().unwrap().title(), "First");
        assert_links(&playlist);
    }

    #[test]
    fn test_duplicate_titles_hit_first_match() {
        let mut playlist: Playlist = [song("Echo", "A"), song("Other", "B"), song("Echo", "C")]
            .into_iter()
            .collect();
        playlist.insert_after("echo", song("New", "N")).unwrap();
        assert_eq!(titles(&playlist), vec!["Echo", "New", "Other", "Echo"]);

        let removed = playlist.remove("Echo").unwrap();
        assert_eq!(removed.artist(), "A");
        assert_eq!(playlist.iter_rev().next().unwrap().artist(), "C");
    }

    #[test]
    fn test_remove_relocates_cursor() {
        // cursor on a middle node moves to its successor
        let mut playlist = road_trip();
        playlist.go_to_first();
        playlist.next();
        playlist.remove("Moon").unwrap();
        assert_eq!(playlist.current().unwrap().title(), "Star");

        // cursor on the tail falls back to its predecessor
        playlist.remove("Star").unwrap();
        assert_eq!(playlist.current().unwrap().title(), "Sun");

        // removing the last node unsets it
        playlist.remove("Sun").unwrap();
        assert!(playlist.current().is_none());
        assert!(playlist.is_empty());
        assert!(playlist.remove("Sun").is_err());
        assert_links(&playlist);
    }

    #[test]
    fn test_removing_other_node_keeps_cursor() {
        let mut playlist = road_trip();
        playlist.go_to_last();
        playlist.remove("Sun").unwrap();
        assert_eq!(playlist.current().unwrap().title(), "Star");
        playlist.remove("moon").unwrap();
        assert_eq!(playlist.current().unwrap().title(), "Star");
        assert_eq!(playlist.current_position(), Some(0));
    }

    #[test]
    fn test_navigation_does_not_wrap() {
        let mut playlist = road_trip();
        assert!(playlist.previous().is_none());
        assert_eq!(playlist.current().unwrap().title(), "Sun");

        playlist.go_to_last();
        assert!(playlist.next().is_none());
        assert_eq!(playlist.current().unwrap().title(), "Star");
        assert_eq!(playlist.previous().unwrap().title(), "Moon");
        assert_eq!(playlist.current_position(), Some(1));

        let mut empty = Playlist::new();
        assert!(empty.next().is_none());
        assert!(empty.go_to_first().is_none());
        assert!(empty.go_to_last().is_none());
    }

    #[test]
    fn test_search_by_title_or_artist() {
        let playlist = road_trip();
        assert_eq!(playlist.search("oo").unwrap().title(), "Moon");
        assert_eq!(playlist.search("z").unwrap().title(), "Star");
        assert!(playlist.search("nothing").is_none());
        assert!(Playlist::new().search("a").is_none());
    }

    #[test]
    fn test_reverse_is_an_involution() {
        let mut playlist = road_trip();
        playlist.add_at_end(song("Comet", "W"));
        playlist.go_to_first();
        playlist.next();

        playlist.reverse();
        assert_eq!(titles(&playlist), vec!["Comet", "Star", "Moon", "Sun"]);
        assert_eq!(playlist.current().unwrap().title(), "Moon");
        assert_eq!(playlist.next().unwrap().title(), "Sun");
        playlist.previous();
        assert_links(&playlist);

        playlist.reverse();
        assert_eq!(titles(&playlist), vec!["Sun", "Moon", "Star", "Comet"]);
        assert_eq!(playlist.current().unwrap().title(), "Moon");
        assert_links(&playlist);
    }

    #[test]
    fn test_shuffle_keeps_songs_and_resets_cursor() {
        let mut playlist: Playlist = (0..20).map(|i| song(&format!("T{}", i), "A")).collect();
        playlist.go_to_last();

        let mut rng = StdRng::seed_from_u64(7);
        playlist.shuffle_with(&mut rng);

        assert_eq!(playlist.len(), 20);
        assert_eq!(playlist.current_position(), Some(0));
        let mut sorted = titles(&playlist);
        sorted.sort();
        let mut expected: Vec<_> = (0..20).map(|i| format!("T{}", i)).collect();
        expected.sort();
        assert_eq!(sorted, expected);
        assert_links(&playlist);
    }

    #[test]
    fn test_shuffle_is_deterministic_for_a_seed() {
        let base: Playlist = (0..10).map(|i| song(&format!("T{}", i), "A")).collect();
        let mut a = base.clone();
        let mut b = base.clone();
        a.shuffle_with(&mut StdRng::seed_from_u64(42));
        b.shuffle_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(titles(&a), titles(&b));
    }

    #[test]
    fn test_shuffle_single_song_is_untouched() {
        let mut playlist: Playlist = [song("Only", "O")].into_iter().collect();
        playlist.shuffle();
        assert_eq!(titles(&playlist), vec!["Only"]);
        assert_eq!(playlist.current().unwrap().title(), "Only");
    }

    #[test]
    fn test_random_operations_keep_links_consistent() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut playlist = Playlist::new();

        for step in 0..2000 {
            let title = format!("S{}", rng.gen_range(0..25));
            match rng.gen_range(0..7) {
                0 => playlist.add_at_end(song(&title, "a")),
                1 => playlist.add_at_start(song(&title, "b")),
                2 => {
                    let _ = playlist.insert_after(&title, song(&format!("S{}", step % 25), "c"));
                }
                3 => {
                    let _ = playlist.insert_before(&title, song(&format!("S{}", step % 25), "d"));
                }
                4 => {
                    let before = playlist.current().cloned();
                    if playlist.remove(&title).is_ok() {
                        // the cursor only moves when its own node was removed
                        if let Some(before) = before.filter(|s| !s.title_matches(&title)) {
                            assert_eq!(playlist.current(), Some(&before));
                        }
                    }
                }
                5 => {
                    playlist.next();
                }
                _ => playlist.reverse(),
            }
            assert_links(&playlist);
        }
    }
}
