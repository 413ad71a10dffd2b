use super::catalog::{Catalog, CatalogEntry};
use super::Playlist;
use crate::library::{Library, Song};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk shape of one playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// Playlist name -> record, in creation (file) order
pub type CatalogSnapshot = IndexMap<String, PlaylistRecord>;

/// Capture every playlist in playback order. Cursors are not saved.
pub fn snapshot(catalog: &Catalog) -> CatalogSnapshot {
    catalog
        .iter()
        .map(|(name, entry)| {
            (
                name.to_string(),
                PlaylistRecord {
                    description: entry.description.clone(),
                    songs: entry.playlist.songs(),
                },
            )
        })
        .collect()
}

/// Rebuild a catalog from a snapshot. Songs are matched to the library by
/// `file_path`; anything the library no longer has is dropped.
/// The first playlist in the file ends up selected.
pub fn restore(snapshot: CatalogSnapshot, library: &Library) -> Catalog {
    let mut catalog = Catalog::new();

    for (name, record) in snapshot {
        let total = record.songs.len();
        let playlist: Playlist = record
            .songs
            .iter()
            .filter_map(|song| library.get_by_path(song.file_path()))
            .cloned()
            .collect();

        if playlist.len() < total {
            debug!(
                "Dropped {} missing songs from playlist '{}'",
                total - playlist.len(),
                name
            );
        }

        catalog.insert_entry(
            name,
            CatalogEntry {
                description: record.description,
                playlist,
            },
        );
    }

    catalog.select_first();
    catalog
}

/// Reads and writes the catalog as a single JSON file
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved catalog. A missing or unreadable file yields an empty catalog.
    pub fn load(&self, library: &Library) -> Catalog {
        if !self.path.exists() {
            info!("No saved playlists at {}, starting empty", self.path.display());
            return Catalog::new();
        }

        match self.try_load(library) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to load playlists from {}: {:#}", self.path.display(), e);
                Catalog::new()
            }
        }
    }

    pub fn try_load(&self, library: &Library) -> Result<Catalog> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let snapshot: CatalogSnapshot =
            serde_json::from_str(&content).context("Failed to parse playlists JSON")?;

        let catalog = restore(snapshot, library);
        info!("Loaded {} playlists from {}", catalog.len(), self.path.display());
        Ok(catalog)
    }

    /// Overwrite the whole file with the current catalog
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&snapshot(catalog))
            .context("Failed to serialize playlists")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Saved {} playlists to {}", catalog.len(), self.path.display());
        Ok(())
    }
}
