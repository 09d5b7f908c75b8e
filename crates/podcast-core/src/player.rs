//! PlayerControl — transport state for the single active episode.
//!
//! The player owns one `PlaybackState` and one handle to the audio primitive.
//! User operations mutate the state and forward to the primitive; the
//! primitive reports back through `AudioEvent`s, which the owner delivers via
//! `apply_event`.  Every event carries the `Generation` of the load it belongs
//! to so a torn-down player can never be touched by a late callback.
//!
//! ```text
//!   key / click ─► PlayerControl ─► AudioPrimitive (mpv)
//!                       ▲                  │
//!                       └── AudioEvent ◄───┘   (tagged with Generation)
//! ```

use tracing::{debug, warn};

/// Duration shown until the audio primitive reports the real one.
pub const PLACEHOLDER_DURATION_SECS: f64 = 1000.0;

/// Default step for the skip shortcuts.
pub const DEFAULT_SKIP_SECS: f64 = 10.0;

/// After a seek, ticks further than this from the target are treated as
/// in-flight ticks from before the seek.
const SEEK_SETTLE_WINDOW_SECS: f64 = 1.5;

/// Upper bound on ticks ignored while waiting for a seek to settle.
const SEEK_SETTLE_MAX_TICKS: u8 = 8;

/// Identity of one mounted player instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Notifications from the audio primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    MetadataLoaded(f64),
    PositionTick(f64),
    Ended,
    LoadFailed(String),
}

/// An `AudioEvent` scoped to the player instance that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedAudioEvent {
    pub generation: Generation,
    pub event: AudioEvent,
}

/// The host's media-playback capability.
///
/// Calls must not block; implementations queue the work and report progress
/// through `AudioEvent`s.
pub trait AudioPrimitive {
    fn load(&mut self, generation: Generation, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, secs: f64);
    /// Stop playback and release the source.
    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub source_url: String,
    pub is_playing: bool,
    pub duration_secs: f64,
    pub position_secs: f64,
    /// Set when the primitive could not load the source.
    pub load_error: Option<String>,
    /// Bumped on every change; lets callers detect no-op updates.
    pub revision: u64,
}

impl PlaybackState {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            is_playing: false,
            duration_secs: PLACEHOLDER_DURATION_SECS,
            position_secs: 0.0,
            load_error: None,
            revision: 0,
        }
    }

    fn clamp(&self, secs: f64) -> f64 {
        if !secs.is_finite() {
            return 0.0;
        }
        secs.clamp(0.0, self.duration_secs.max(0.0))
    }
}

pub struct PlayerControl<A: AudioPrimitive> {
    state: PlaybackState,
    generation: Generation,
    audio: A,
    /// Target of the last seek until a tick confirms it.
    seek_target: Option<f64>,
    settle_ticks: u8,
}

impl<A: AudioPrimitive> PlayerControl<A> {
    /// Mount a player for `source_url` and start loading it (paused).
    pub fn new(source_url: impl Into<String>, generation: Generation, mut audio: A) -> Self {
        let state = PlaybackState::new(source_url);
        debug!("player[{}]: mount {}", generation.0, state.source_url);
        audio.load(generation, &state.source_url);
        Self {
            state,
            generation,
            audio,
            seek_target: None,
            settle_ticks: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn position_secs(&self) -> f64 {
        self.state.position_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.state.duration_secs
    }

    fn touch(&mut self) {
        self.state.revision += 1;
    }

    // ── transport ────────────────────────────────────────────────────────────

    pub fn play(&mut self) {
        if self.state.is_playing {
            return;
        }
        if let Some(err) = &self.state.load_error {
            debug!("player[{}]: play ignored, load failed: {}", self.generation.0, err);
            return;
        }
        self.state.is_playing = true;
        self.audio.set_current_time(self.state.position_secs);
        self.audio.play();
        self.touch();
    }

    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.state.is_playing = false;
        self.audio.pause();
        self.touch();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move to `target_secs`, clamped to `[0, duration]`.
    pub fn seek(&mut self, target_secs: f64) {
        let target = self.state.clamp(target_secs);
        self.state.position_secs = target;
        self.seek_target = Some(target);
        self.settle_ticks = 0;
        self.audio.set_current_time(target);
        self.touch();
    }

    pub fn skip(&mut self, delta_secs: f64) {
        let current = self.state.position_secs;
        self.seek(current + delta_secs);
    }

    /// Pointer input on the progress bar; `fraction` is the click offset
    /// relative to the bar width.
    pub fn handle_progress_bar_click(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let duration = self.state.duration_secs;
        self.seek(fraction * duration);
    }

    // ── audio primitive callbacks ────────────────────────────────────────────

    pub fn on_metadata_loaded(&mut self, duration_secs: f64) {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            warn!(
                "player[{}]: ignoring duration {}",
                self.generation.0, duration_secs
            );
            return;
        }
        self.state.duration_secs = duration_secs;
        self.state.position_secs = self.state.clamp(self.state.position_secs);
        self.seek_target = self.seek_target.map(|t| self.state.clamp(t));
        self.touch();
    }

    /// Returns `true` when the displayed position changed.
    pub fn on_position_tick(&mut self, current_secs: f64) -> bool {
        if !current_secs.is_finite() {
            return false;
        }

        if let Some(target) = self.seek_target {
            if (current_secs - target).abs() > SEEK_SETTLE_WINDOW_SECS
                && self.settle_ticks < SEEK_SETTLE_MAX_TICKS
            {
                self.settle_ticks += 1;
                return false;
            }
            self.seek_target = None;
        }

        if current_secs.floor() == self.state.position_secs.floor() {
            return false;
        }
        self.state.position_secs = self.state.clamp(current_secs);
        self.touch();
        true
    }

    pub fn on_playback_ended(&mut self) {
        self.state.position_secs = 0.0;
        self.state.is_playing = false;
        self.seek_target = None;
        self.touch();
    }

    pub fn on_load_failed(&mut self, reason: String) {
        warn!(
            "player[{}]: cannot load {}: {}",
            self.generation.0, self.state.source_url, reason
        );
        self.state.is_playing = false;
        self.state.load_error = Some(reason);
        self.touch();
    }

    /// Dispatch an event addressed to this instance.
    pub fn apply_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::MetadataLoaded(d) => self.on_metadata_loaded(d),
            AudioEvent::PositionTick(t) => {
                self.on_position_tick(t);
            }
            AudioEvent::Ended => self.on_playback_ended(),
            AudioEvent::LoadFailed(reason) => self.on_load_failed(reason),
        }
    }
}

impl<A: AudioPrimitive> Drop for PlayerControl<A> {
    fn drop(&mut self) {
        debug!("player[{}]: unmount", self.generation.0);
        self.audio.stop();
    }
}

// ── test double ──────────────────────────────────────────────────────────────

/// Records calls instead of playing anything.  Clones share the log.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    pub calls: std::rc::Rc<std::cell::RefCell<Vec<AudioCall>>>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Load(Generation, String),
    Play,
    Pause,
    SetCurrentTime(f64),
    Stop,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn take(&self) -> Vec<AudioCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

#[cfg(test)]
impl AudioPrimitive for RecordingAudio {
    fn load(&mut self, generation: Generation, url: &str) {
        self.calls
            .borrow_mut()
            .push(AudioCall::Load(generation, url.to_string()));
    }
    fn play(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Play);
    }
    fn pause(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Pause);
    }
    fn set_current_time(&mut self, secs: f64) {
        self.calls.borrow_mut().push(AudioCall::SetCurrentTime(secs));
    }
    fn stop(&mut self) {
        self.calls.borrow_mut().push(AudioCall::Stop);
    }
}
