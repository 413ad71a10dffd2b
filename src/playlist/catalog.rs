use super::Playlist;
use crate::error::{CoreError, CoreResult};
use crate::library::Song;
use indexmap::IndexMap;
use tracing::{info, warn};

/// A named playlist plus its free-text description
#[derive(Debug, Clone, Default)]
pub struct CatalogEntry {
    pub description: String,
    pub playlist: Playlist,
}

/// All playlists by name, with one optionally selected as "current".
/// Names iterate (and persist) in the order the playlists were created.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
    current: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty playlist and select it. Existing names are never overwritten.
    pub fn create(&mut self, name: &str, description: &str) -> CoreResult<()> {
        if self.entries.contains_key(name) {
            return Err(CoreError::AlreadyExists(name.to_string()));
        }

        self.entries.insert(
            name.to_string(),
            CatalogEntry {
                description: description.to_string(),
                playlist: Playlist::new(),
            },
        );
        self.current = Some(name.to_string());
        info!("Created playlist '{}'", name);
        Ok(())
    }

    /// Create `name` and fill it with the first `max_songs` library songs,
    /// in library order. Returns how many songs were added.
    pub fn create_from_library(
        &mut self,
        name: &str,
        library: &[Song],
        max_songs: usize,
        description: &str,
    ) -> CoreResult<usize> {
        self.create(name, description)?;
        if library.is_empty() {
            warn!("Library is empty, playlist '{}' starts empty", name);
        }

        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
        entry
            .playlist
            .extend(library.iter().take(max_songs).cloned());

        let added = entry.playlist.len();
        info!("Populated playlist '{}' with {} songs from library", name, added);
        Ok(added)
    }

    pub fn delete(&mut self, name: &str) -> CoreResult<Playlist> {
        let entry = self
            .entries
            .shift_remove(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;

        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        info!("Deleted playlist '{}'", name);
        Ok(entry.playlist)
    }

    pub fn switch_to(&mut self, name: &str) -> CoreResult<()> {
        if !self.entries.contains_key(name) {
            return Err(CoreError::NotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        info!("Switched to playlist '{}'", name);
        Ok(())
    }

    /// Rename a playlist, keeping it selected if it was
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> CoreResult<()> {
        if old_name == new_name {
            return if self.entries.contains_key(old_name) {
                Ok(())
            } else {
                Err(CoreError::NotFound(old_name.to_string()))
            };
        }
        if self.entries.contains_key(new_name) {
            return Err(CoreError::AlreadyExists(new_name.to_string()));
        }

        let index = self
            .entries
            .get_index_of(old_name)
            .ok_or_else(|| CoreError::NotFound(old_name.to_string()))?;
        // same slot, new key
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, entry))| {
                if i == index {
                    (new_name.to_string(), entry)
                } else {
                    (name, entry)
                }
            })
            .collect();

        if self.current.as_deref() == Some(old_name) {
            self.current = Some(new_name.to_string());
        }
        info!("Renamed playlist '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&Playlist> {
        self.get(self.current.as_deref()?)
    }

    pub fn current_mut(&mut self) -> Option<&mut Playlist> {
        let name = self.current.clone()?;
        self.get_mut(&name)
    }

    /// Append to the selected playlist
    pub fn add_to_current(&mut self, song: Song) -> CoreResult<()> {
        let playlist = self.current_mut().ok_or(CoreError::NoActivePlaylist)?;
        playlist.add_at_end(song);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.entries.get(name).map(|entry| &entry.playlist)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Playlist> {
        self.entries.get_mut(name).map(|entry| &mut entry.playlist)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.description.as_str())
    }

    pub fn set_description(&mut self, name: &str, description: &str) -> CoreResult<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
        entry.description = description.to_string();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a fully built entry without touching the selection. Used when
    /// restoring a saved catalog; replaces any entry of the same name.
    pub(crate) fn insert_entry(&mut self, name: String, entry: CatalogEntry) {
        self.entries.insert(name, entry);
    }

    pub(crate) fn select_first(&mut self) {
        self.current = self.entries.keys().next().cloned();
    }
}
