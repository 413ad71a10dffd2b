use super::AudioBackend;
use crate::error::{CoreError, CoreResult};
use crate::library::Song;
use crate::playlist::Catalog;
use crate::queue::{HistoryStack, PartyQueue, PlayNextQueue};
use tracing::{debug, info, warn};

/// What a playback request ended up doing
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// The song is playing and has been added to history
    Started(Song),
    /// The device rejected the song; nothing is playing now
    Failed { song: Song, reason: String },
    /// The queue asked to play from had nothing in it
    QueueEmpty,
    /// The attached playlist ran out (or disappeared) and was let go
    Detached,
    /// No playback source to act on
    Idle,
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlayOutcome::Started(_))
    }

    pub fn song(&self) -> Option<&Song> {
        match self {
            PlayOutcome::Started(song) | PlayOutcome::Failed { song, .. } => Some(song),
            _ => None,
        }
    }
}

/// Decides what plays, across the play-next queue, the party queue and an
/// attached playlist. It is the only thing that talks to the audio device.
///
/// Playlists stay owned by the `Catalog`; the orchestrator remembers the
/// attached one by name and is handed the catalog when it needs to move its
/// cursor.
pub struct Orchestrator<B: AudioBackend> {
    backend: B,
    play_next: PlayNextQueue,
    party: PartyQueue,
    history: HistoryStack,
    now_playing: Option<Song>,
    attached: Option<String>,
}

impl<B: AudioBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            play_next: PlayNextQueue::new(),
            party: PartyQueue::new(),
            history: HistoryStack::new(),
            now_playing: None,
            attached: None,
        }
    }

    pub fn play(&mut self, song: Song) -> PlayOutcome {
        match self.backend.load_and_play(song.file_path()) {
            Ok(()) => {
                info!("Playing: {}", song.display_line());
                self.now_playing = Some(song.clone());
                self.history.push(song.clone());
                PlayOutcome::Started(song)
            }
            Err(e) => {
                warn!("Error playing '{}': {}", song.title(), e);
                self.now_playing = None;
                let reason = match e {
                    CoreError::Playback { reason, .. } => reason,
                    other => other.to_string(),
                };
                PlayOutcome::Failed { song, reason }
            }
        }
    }

    /// Stop the device and let go of any attached playlist
    pub fn stop(&mut self) {
        self.backend.stop();
        self.now_playing = None;
        self.attached = None;
    }

    pub fn play_next_from_queue(&mut self) -> PlayOutcome {
        match self.play_next.dequeue() {
            Some(song) => self.play(song),
            None => {
                debug!("No songs in play next queue");
                PlayOutcome::QueueEmpty
            }
        }
    }

    pub fn play_from_party_queue(&mut self) -> PlayOutcome {
        match self.party.dequeue() {
            Some(song) => self.play(song),
            None => {
                debug!("No songs in party queue");
                PlayOutcome::QueueEmpty
            }
        }
    }

    /// Make `name` the playback source and play its current song
    /// (or its first one when the cursor is unset).
    pub fn play_playlist(&mut self, catalog: &mut Catalog, name: &str) -> CoreResult<PlayOutcome> {
        let playlist = catalog
            .get_mut(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;

        let song = match playlist.current().cloned() {
            Some(song) => song,
            None => playlist
                .go_to_first()
                .cloned()
                .ok_or(CoreError::EmptyContainer("playlist"))?,
        };

        self.attached = Some(name.to_string());
        Ok(self.play(song))
    }

    pub fn detach(&mut self) {
        if let Some(name) = self.attached.take() {
            debug!("Detached from playlist '{}'", name);
        }
    }

    /// React to the device finishing a track: move the attached playlist
    /// forward and play what is there, or detach once it runs out.
    pub fn on_track_finished(&mut self, catalog: &mut Catalog) -> PlayOutcome {
        self.now_playing = None;
        self.advance_attached(catalog)
    }

    /// Next button: the attached playlist moves forward, otherwise the
    /// play-next queue drains one song.
    pub fn skip_forward(&mut self, catalog: &mut Catalog) -> PlayOutcome {
        if self.attached.is_none() {
            return self.play_next_from_queue();
        }

        let outcome = self.advance_attached(catalog);
        if outcome == PlayOutcome::Detached {
            self.backend.stop();
            self.now_playing = None;
        }
        outcome
    }

    /// Previous button: only meaningful with an attached playlist. At the
    /// head the current song starts over.
    pub fn skip_back(&mut self, catalog: &mut Catalog) -> PlayOutcome {
        let Some(name) = self.attached.clone() else {
            return PlayOutcome::Idle;
        };

        let song = catalog.get_mut(&name).and_then(|playlist| {
            let previous = playlist.previous().cloned();
            previous.or_else(|| playlist.current().cloned())
        });
        match song {
            Some(song) => self.play(song),
            None => PlayOutcome::Idle,
        }
    }

    /// Returns `true` when playback is paused afterwards
    pub fn toggle_pause(&mut self) -> bool {
        if self.backend.is_paused() {
            self.backend.resume();
            false
        } else {
            self.backend.pause();
            self.backend.is_paused()
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.backend.set_volume(volume);
    }

    pub fn position_ms(&self) -> u64 {
        self.backend.position_ms()
    }

    pub fn add_to_play_next(&mut self, song: Song) {
        self.play_next.enqueue(song);
    }

    pub fn add_to_party(&mut self, song: Song, priority: i64) {
        self.party.enqueue(song, priority);
    }

    pub fn upvote(&mut self, title: &str) -> CoreResult<i64> {
        self.party.upvote(title)
    }

    pub fn now_playing(&self) -> Option<&Song> {
        self.now_playing.as_ref()
    }

    pub fn attached_playlist(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    pub fn play_next_queue(&self) -> &PlayNextQueue {
        &self.play_next
    }

    pub fn play_next_queue_mut(&mut self) -> &mut PlayNextQueue {
        &mut self.play_next
    }

    pub fn party_queue(&self) -> &PartyQueue {
        &self.party
    }

    pub fn party_queue_mut(&mut self) -> &mut PartyQueue {
        &mut self.party
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn advance_attached(&mut self, catalog: &mut Catalog) -> PlayOutcome {
        let Some(name) = self.attached.clone() else {
            return PlayOutcome::Idle;
        };

        match catalog.get_mut(&name).and_then(|playlist| playlist.next().cloned()) {
            Some(song) => self.play(song),
            None => {
                info!("Reached the end of playlist '{}'", name);
                self.attached = None;
                PlayOutcome::Detached
            }
        }
    }
}
