//! CatalogView — explicit application state for the catalog screen.
//!
//! Holds the current category, the fetched episode batch, and at most one
//! mounted `PlayerControl`.  All mutation goes through the named operations
//! below; the front end only reads fields and forwards events.

use tracing::{debug, info};

use crate::catalog::{CatalogSnapshot, Category, Episode};
use crate::player::{AudioPrimitive, Generation, PlayerControl, TaggedAudioEvent};

/// Identifies one catalog fetch; results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub category: Category,
    pub request_id: u64,
}

pub struct CatalogView<A: AudioPrimitive + Clone> {
    category: Category,
    episodes: Vec<Episode>,
    active_episode_id: Option<String>,
    description: String,
    mailing_list_url: Option<String>,
    loading: bool,
    player: Option<PlayerControl<A>>,
    /// Each mounted player gets a clone of this handle.
    audio: A,
    last_generation: Generation,
    ticket: FetchTicket,
}

impl<A: AudioPrimitive + Clone> CatalogView<A> {
    pub fn new(category: Category, audio: A) -> Self {
        Self {
            category,
            episodes: Vec::new(),
            active_episode_id: None,
            description: String::new(),
            mailing_list_url: None,
            loading: false,
            player: None,
            audio,
            last_generation: Generation(0),
            ticket: FetchTicket {
                category,
                request_id: 0,
            },
        }
    }

    // ── reads ────────────────────────────────────────────────────────────────

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn active_episode_id(&self) -> Option<&str> {
        self.active_episode_id.as_deref()
    }

    pub fn active_episode(&self) -> Option<&Episode> {
        let id = self.active_episode_id.as_deref()?;
        self.episodes.iter().find(|e| e.id == id)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Present only when non-empty.
    pub fn mailing_list_url(&self) -> Option<&str> {
        self.mailing_list_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn player(&self) -> Option<&PlayerControl<A>> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerControl<A>> {
        self.player.as_mut()
    }

    pub fn current_ticket(&self) -> FetchTicket {
        self.ticket
    }

    // ── operations ───────────────────────────────────────────────────────────

    /// Switch category.  Clears everything that belonged to the old one and
    /// returns the ticket the caller must attach to the fetch result.
    pub fn select_category(&mut self, category: Category) -> FetchTicket {
        self.unmount();
        self.category = category;
        self.episodes.clear();
        self.description.clear();
        self.mailing_list_url = None;
        self.loading = true;
        self.ticket = FetchTicket {
            category,
            request_id: self.ticket.request_id + 1,
        };
        info!("[view] category → {} (fetch #{})", category, self.ticket.request_id);
        self.ticket
    }

    /// Install a fetch result.  Returns `false` when the ticket is stale.
    pub fn apply_catalog(&mut self, ticket: FetchTicket, snapshot: CatalogSnapshot) -> bool {
        if ticket != self.ticket {
            debug!(
                "[view] dropping stale catalog #{} for {}",
                ticket.request_id, ticket.category
            );
            return false;
        }
        self.episodes = snapshot.episodes;
        self.description = snapshot.description;
        self.mailing_list_url = snapshot.mailing_list_url;
        self.loading = false;
        true
    }

    /// Make `id` the active episode.  Returns `true` when a new player was
    /// mounted; unknown and already-active ids are no-ops.
    pub fn select_episode(&mut self, id: &str) -> bool {
        if self.active_episode_id.as_deref() == Some(id) {
            return false;
        }
        let Some(url) = self
            .episodes
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.audio_source_url.clone())
        else {
            debug!("[view] select_episode: unknown id {}", id);
            return false;
        };

        // Old player stops before the new one loads.
        self.unmount();
        self.last_generation = self.last_generation.next();
        self.player = Some(PlayerControl::new(url, self.last_generation, self.audio.clone()));
        self.active_episode_id = Some(id.to_string());
        true
    }

    pub fn deselect_episode(&mut self) {
        self.unmount();
    }

    /// Route an audio event to the mounted player if it belongs to it.
    pub fn on_audio_event(&mut self, tagged: TaggedAudioEvent) -> bool {
        match self.player.as_mut() {
            Some(player) if player.generation() == tagged.generation => {
                player.apply_event(tagged.event);
                true
            }
            _ => {
                debug!(
                    "[view] dropping event for generation {}: {:?}",
                    tagged.generation.0, tagged.event
                );
                false
            }
        }
    }

    fn unmount(&mut self) {
        self.active_episode_id = None;
        self.player = None;
    }
}
