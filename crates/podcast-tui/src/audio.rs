//! mpv-backed `AudioPrimitive`.
//!
//! `MpvAudio` is a cheap cloneable sender; every call becomes an
//! `AudioRequest` for the backend task, which owns the mpv process and turns
//! mpv's events into `TaggedAudioEvent`s for the app loop.
//!
//! ```text
//!   PlayerControl ──► MpvAudio ──AudioRequest──► backend ──JSON IPC──► mpv
//!                                                   │
//!   App ◄──────────── TaggedAudioEvent ◄────────────┘ ◄── MpvEvent ───┘
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use podcast_core::player::{AudioEvent, AudioPrimitive, Generation, TaggedAudioEvent};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_DURATION, OBS_TIME_POS};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioRequest {
    Load { generation: Generation, url: String },
    Play,
    Pause,
    Seek(f64),
    Stop,
}

#[derive(Clone)]
pub struct MpvAudio {
    tx: mpsc::UnboundedSender<AudioRequest>,
}

impl MpvAudio {
    /// A handle with no backend; requests land on the returned receiver.
    #[cfg(test)]
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<AudioRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn request(&self, req: AudioRequest) {
        if self.tx.send(req).is_err() {
            debug!("audio: backend gone, request dropped");
        }
    }
}

impl AudioPrimitive for MpvAudio {
    fn load(&mut self, generation: Generation, url: &str) {
        self.request(AudioRequest::Load {
            generation,
            url: url.to_string(),
        });
    }

    fn play(&mut self) {
        self.request(AudioRequest::Play);
    }

    fn pause(&mut self) {
        self.request(AudioRequest::Pause);
    }

    fn set_current_time(&mut self, secs: f64) {
        self.request(AudioRequest::Seek(secs));
    }

    fn stop(&mut self) {
        self.request(AudioRequest::Stop);
    }
}

/// Start the backend task.  mpv itself is spawned on the first load.
pub fn spawn_backend(volume: u8) -> (MpvAudio, mpsc::UnboundedReceiver<TaggedAudioEvent>) {
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (mpv_tx, mpv_rx) = mpsc::channel(256);

    let backend = Backend {
        driver: MpvDriver::new(volume),
        handle: None,
        mpv_tx,
        out: out_tx,
        tracker: GenerationTracker::default(),
    };
    tokio::spawn(backend.run(req_rx, mpv_rx));

    (MpvAudio { tx: req_tx }, out_rx)
}

// ── generation bookkeeping ────────────────────────────────────────────────────

/// Decides which mounted player an mpv event belongs to.
///
/// Between a `loadfile` and mpv's `start-file` for it, nothing is current and
/// events are dropped; afterwards events carry the generation of that load.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    source: Option<(Generation, String)>,
    awaiting: Option<Generation>,
    entries: HashMap<i64, Generation>,
    current: Option<Generation>,
    file_loaded: bool,
    ended: bool,
    pending_seek: Option<f64>,
}

impl GenerationTracker {
    pub fn on_load(&mut self, generation: Generation, url: &str) {
        self.source = Some((generation, url.to_string()));
        self.awaiting = Some(generation);
        self.current = None;
        self.file_loaded = false;
        self.ended = false;
        self.pending_seek = None;
    }

    pub fn on_entry_id(&mut self, entry_id: i64, generation: Generation) {
        self.entries.insert(entry_id, generation);
    }

    pub fn on_stop(&mut self) {
        self.source = None;
        self.awaiting = None;
        self.current = None;
        self.file_loaded = false;
        self.ended = false;
        self.pending_seek = None;
    }

    /// After the file ended mpv is idle; playing again means reloading it.
    pub fn take_reload(&mut self) -> Option<(Generation, String)> {
        if !self.ended {
            return None;
        }
        let (generation, url) = self.source.clone()?;
        self.ended = false;
        self.awaiting = Some(generation);
        self.current = None;
        self.file_loaded = false;
        Some((generation, url))
    }

    /// Seeks before `file-loaded` are held back; mpv rejects them.
    /// Returns the target when it can be sent right away.
    pub fn on_seek(&mut self, secs: f64) -> Option<f64> {
        if self.file_loaded {
            Some(secs)
        } else {
            self.pending_seek = Some(secs);
            None
        }
    }

    pub fn current(&self) -> Option<Generation> {
        self.current
    }

    /// Translate one mpv event.  A held-back seek is returned alongside when
    /// the event makes it sendable.
    pub fn translate(&mut self, ev: &MpvEvent) -> (Option<TaggedAudioEvent>, Option<f64>) {
        if let Some((id, data)) = ev.as_property_change() {
            let event = match (id, data) {
                (OBS_DURATION, Value::Number(n)) => n.as_f64().map(AudioEvent::MetadataLoaded),
                (OBS_TIME_POS, Value::Number(n)) => n.as_f64().map(AudioEvent::PositionTick),
                _ => None,
            };
            return (event.and_then(|e| self.tag(e)), None);
        }

        match ev.event_name() {
            Some("start-file") => {
                let by_id = ev
                    .playlist_entry_id()
                    .and_then(|id| self.entries.get(&id).copied());
                self.current = by_id.or(self.awaiting);
                if self.current == self.awaiting {
                    self.awaiting = None;
                }
                self.file_loaded = false;
                debug!("audio: start-file → generation {:?}", self.current);
                (None, None)
            }
            Some("file-loaded") => {
                self.file_loaded = self.current.is_some();
                let seek = if self.file_loaded {
                    self.pending_seek.take()
                } else {
                    None
                };
                (None, seek)
            }
            Some("end-file") => {
                let owner = ev
                    .playlist_entry_id()
                    .and_then(|id| self.entries.remove(&id))
                    .or(self.current);
                if owner.is_none() || owner != self.current {
                    return (None, None);
                }
                self.file_loaded = false;
                let event = match ev.raw.get("reason").and_then(Value::as_str) {
                    Some("eof") => {
                        self.ended = true;
                        Some(AudioEvent::Ended)
                    }
                    Some("error") => {
                        let reason = ev
                            .raw
                            .get("file_error")
                            .and_then(Value::as_str)
                            .unwrap_or("error")
                            .to_string();
                        Some(AudioEvent::LoadFailed(reason))
                    }
                    _ => None,
                };
                let tagged = event.and_then(|e| self.tag(e));
                self.current = None;
                (tagged, None)
            }
            _ => (None, None),
        }
    }

    fn tag(&self, event: AudioEvent) -> Option<TaggedAudioEvent> {
        self.current.map(|generation| TaggedAudioEvent { generation, event })
    }
}

// ── backend task ──────────────────────────────────────────────────────────────

struct Backend {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    mpv_tx: mpsc::Sender<MpvEvent>,
    out: mpsc::UnboundedSender<TaggedAudioEvent>,
    tracker: GenerationTracker,
}

impl Backend {
    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<AudioRequest>,
        mut mpv_rx: mpsc::Receiver<MpvEvent>,
    ) {
        loop {
            tokio::select! {
                req = requests.recv() => match req {
                    Some(req) => self.handle_request(req).await,
                    None => break,
                },
                Some(ev) = mpv_rx.recv() => self.handle_mpv_event(ev).await,
            }
        }
        info!("audio: backend exiting");
        self.driver.kill().await;
    }

    async fn ensure_connected(&mut self) -> anyhow::Result<MpvHandle> {
        if let Some(handle) = &self.handle {
            if self.driver.process_alive() {
                return Ok(handle.clone());
            }
            warn!("audio: mpv died, respawning");
        }
        self.handle = None;
        let handle = self.driver.spawn_and_connect(self.mpv_tx.clone()).await?;
        handle.observe_properties().await;
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    fn emit(&self, generation: Generation, event: AudioEvent) {
        let _ = self.out.send(TaggedAudioEvent { generation, event });
    }

    async fn load(&mut self, generation: Generation, url: String, paused: bool) {
        let handle = match self.ensure_connected().await {
            Ok(h) => h,
            Err(e) => {
                warn!("audio: mpv unavailable: {}", e);
                self.emit(generation, AudioEvent::LoadFailed(format!("mpv unavailable: {}", e)));
                return;
            }
        };
        match handle.load_file(&url, paused).await {
            Ok(Some(entry_id)) => self.tracker.on_entry_id(entry_id, generation),
            Ok(None) => {}
            Err(e) => {
                warn!("audio: loadfile {} failed: {}", url, e);
                self.emit(generation, AudioEvent::LoadFailed(e.to_string()));
            }
        }
    }

    async fn handle_request(&mut self, req: AudioRequest) {
        debug!("audio: {:?}", req);
        match req {
            AudioRequest::Load { generation, url } => {
                self.tracker.on_load(generation, &url);
                self.load(generation, url, true).await;
            }
            AudioRequest::Play => {
                if let Some((generation, url)) = self.tracker.take_reload() {
                    self.load(generation, url, false).await;
                } else if let Some(handle) = &self.handle {
                    if let Err(e) = handle.set_pause(false).await {
                        warn!("audio: resume failed: {}", e);
                    }
                }
            }
            AudioRequest::Pause => {
                if let Some(handle) = &self.handle {
                    if let Err(e) = handle.set_pause(true).await {
                        warn!("audio: pause failed: {}", e);
                    }
                }
            }
            AudioRequest::Seek(secs) => {
                if let (Some(secs), Some(handle)) = (self.tracker.on_seek(secs), &self.handle) {
                    if let Err(e) = handle.seek_to(secs).await {
                        warn!("audio: seek to {:.1} failed: {}", secs, e);
                    }
                }
            }
            AudioRequest::Stop => {
                self.tracker.on_stop();
                if let Some(handle) = &self.handle {
                    if let Err(e) = handle.stop().await {
                        debug!("audio: stop failed: {}", e);
                    }
                }
            }
        }
    }

    async fn handle_mpv_event(&mut self, ev: MpvEvent) {
        let (tagged, seek) = self.tracker.translate(&ev);
        if let (Some(secs), Some(handle)) = (seek, &self.handle) {
            if let Err(e) = handle.seek_to(secs).await {
                warn!("audio: deferred seek to {:.1} failed: {}", secs, e);
            }
        }
        if let Some(tagged) = tagged {
            let _ = self.out.send(tagged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ev(raw: Value) -> MpvEvent {
        MpvEvent { raw }
    }

    fn duration(d: f64) -> MpvEvent {
        ev(json!({ "event": "property-change", "id": OBS_DURATION, "name": "duration", "data": d }))
    }

    fn time_pos(t: f64) -> MpvEvent {
        ev(json!({ "event": "property-change", "id": OBS_TIME_POS, "name": "time-pos", "data": t }))
    }

    fn started(tracker: &mut GenerationTracker, g: u64, entry: i64) {
        tracker.on_load(Generation(g), "https://cdn.example/a.mp3");
        tracker.on_entry_id(entry, Generation(g));
        tracker.translate(&ev(json!({ "event": "start-file", "playlist_entry_id": entry })));
    }

    #[test]
    fn test_events_before_start_file_are_dropped() {
        let mut tracker = GenerationTracker::default();
        tracker.on_load(Generation(1), "u");
        assert_eq!(tracker.translate(&duration(300.0)).0, None);
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_events_are_tagged_after_start_file() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 4, 10);
        assert_eq!(
            tracker.translate(&duration(300.0)).0,
            Some(TaggedAudioEvent {
                generation: Generation(4),
                event: AudioEvent::MetadataLoaded(300.0)
            })
        );
        assert_eq!(
            tracker.translate(&time_pos(1.5)).0.map(|t| t.event),
            Some(AudioEvent::PositionTick(1.5))
        );
    }

    #[test]
    fn test_null_properties_are_ignored() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 1, 1);
        let null = ev(json!({ "event": "property-change", "id": OBS_DURATION, "name": "duration" }));
        assert_eq!(tracker.translate(&null).0, None);
    }

    #[test]
    fn test_old_end_file_after_new_load_is_dropped() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 1, 1);
        tracker.on_load(Generation(2), "b");
        tracker.on_entry_id(2, Generation(2));
        let old_end = ev(json!({ "event": "end-file", "reason": "stop", "playlist_entry_id": 1 }));
        assert_eq!(tracker.translate(&old_end).0, None);
        tracker.translate(&ev(json!({ "event": "start-file", "playlist_entry_id": 2 })));
        assert_eq!(tracker.current(), Some(Generation(2)));
    }

    #[test]
    fn test_eof_and_error_mapping() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 3, 5);
        let eof = ev(json!({ "event": "end-file", "reason": "eof", "playlist_entry_id": 5 }));
        assert_eq!(
            tracker.translate(&eof).0.map(|t| t.event),
            Some(AudioEvent::Ended)
        );

        started(&mut tracker, 4, 6);
        let err = ev(json!({
            "event": "end-file", "reason": "error", "playlist_entry_id": 6,
            "file_error": "unrecognized file format"
        }));
        assert_eq!(
            tracker.translate(&err).0,
            Some(TaggedAudioEvent {
                generation: Generation(4),
                event: AudioEvent::LoadFailed("unrecognized file format".into())
            })
        );
    }

    #[test]
    fn test_stop_drops_everything() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 1, 1);
        tracker.on_stop();
        assert_eq!(tracker.translate(&time_pos(9.0)).0, None);
    }

    #[test]
    fn test_seek_is_held_until_file_loaded() {
        let mut tracker = GenerationTracker::default();
        started(&mut tracker, 1, 1);
        assert_eq!(tracker.on_seek(42.0), None);
        let (_, seek) = tracker.translate(&ev(json!({ "event": "file-loaded" })));
        assert_eq!(seek, Some(42.0));
        assert_eq!(tracker.on_seek(50.0), Some(50.0));
    }

    #[test]
    fn test_reload_after_eof() {
        let mut tracker = GenerationTracker::default();
        assert_eq!(tracker.take_reload(), None);
        started(&mut tracker, 2, 8);
        tracker.translate(&ev(json!({ "event": "end-file", "reason": "eof", "playlist_entry_id": 8 })));
        assert_eq!(
            tracker.take_reload(),
            Some((Generation(2), "https://cdn.example/a.mp3".to_string()))
        );
        assert_eq!(tracker.take_reload(), None);
    }

    #[test]
    fn test_start_file_without_entry_ids() {
        let mut tracker = GenerationTracker::default();
        tracker.on_load(Generation(9), "u");
        tracker.translate(&ev(json!({ "event": "start-file" })));
        assert_eq!(tracker.current(), Some(Generation(9)));
    }

    #[tokio::test]
    async fn test_mpv_audio_forwards_requests() {
        let (mut audio, mut rx) = MpvAudio::detached();
        audio.load(Generation(1), "u");
        audio.set_current_time(3.0);
        audio.play();
        audio.stop();
        assert_eq!(
            rx.recv().await,
            Some(AudioRequest::Load {
                generation: Generation(1),
                url: "u".into()
            })
        );
        assert_eq!(rx.recv().await, Some(AudioRequest::Seek(3.0)));
        assert_eq!(rx.recv().await, Some(AudioRequest::Play));
        assert_eq!(rx.recv().await, Some(AudioRequest::Stop));
    }
}
