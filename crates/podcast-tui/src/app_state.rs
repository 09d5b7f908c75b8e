//! AppState — shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only thing that writes to AppState, and it does
//! so through `CatalogView`'s named operations.

use podcast_core::view::CatalogView;

use crate::audio::MpvAudio;

pub struct AppState {
    pub view: CatalogView<MpvAudio>,
    /// Step for the skip shortcuts and transport glyphs.
    pub skip_seconds: f64,
    /// Last notable event, shown in the status bar.
    pub last_log: Option<String>,
}

impl AppState {
    pub fn new(view: CatalogView<MpvAudio>, skip_seconds: f64) -> Self {
        Self {
            view,
            skip_seconds,
            last_log: None,
        }
    }

    /// True while a player is mounted; gates the transport shortcuts.
    pub fn has_player(&self) -> bool {
        self.view.player().is_some()
    }
}
