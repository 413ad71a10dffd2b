// Queues that sit beside the playlists: "play next", the party queue and history
// All three are plain in-memory containers; the orchestrator decides when they drain

pub mod history;
pub mod party;
pub mod play_next;

pub use history::HistoryStack;
pub use party::{PartyEntry, PartyQueue};
pub use play_next::PlayNextQueue;
