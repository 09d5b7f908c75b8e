//! Action enum — all user-initiated intents.

use podcast_core::catalog::Category;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Header,
    EpisodeList,
    EpisodeDetail,
    PlayerPanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Catalog ──────────────────────────────────────────────────────────────
    SelectCategory(Category),
    NextCategory,
    PrevCategory,
    SelectEpisode(String),
    DeselectEpisode,

    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlayPause,
    /// Relative seek in seconds; negative goes back.
    Skip(f64),
    /// Pointer input on the progress bar, `0..=1` of the duration.
    SeekFraction(f64),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    ToggleKeys,
    CopyToClipboard(String),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
