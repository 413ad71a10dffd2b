// setlist - playlist, queue and playback core for a local music collection
// The binary is a thin shell; everything interesting lives in these modules

pub mod audio;    // device abstraction, rodio player, playback orchestration
pub mod config;   // settings and preferences
pub mod error;    // error taxonomy shared by the core containers
pub mod library;  // song records and directory scanning
pub mod playlist; // linked playlists, the catalog and its persistence
pub mod queue;    // play-next, party queue, history

pub use audio::{AudioBackend, Orchestrator, PlayOutcome};
#[cfg(feature = "audio")]
pub use audio::AudioPlayer;
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use library::{Library, MusicScanner, Song};
pub use playlist::{Catalog, CatalogStore, Playlist};
pub use queue::{HistoryStack, PartyQueue, PlayNextQueue};
