//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks:
//!   terminal input, catalog fetch results and tagged audio events.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use podcast_core::catalog::{load_catalog, CatalogService, CatalogSnapshot, Category};
use podcast_core::player::{AudioEvent, TaggedAudioEvent};
use podcast_core::view::FetchTicket;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        episode_detail::EpisodeDetail, episode_list::EpisodeList, header::Header,
        help_overlay::HelpOverlay, player_panel::PlayerPanel,
    },
    focus::FocusRing,
    widgets::{status_bar, toast::ToastManager},
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    CatalogLoaded(FetchTicket, CatalogSnapshot),
    Audio(TaggedAudioEvent),
}

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn layout rects, used by `handle_mouse` for hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    header: Rect,
    episode_list: Rect,
    episode_detail: Rect,
    player_panel: Rect,
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub state: AppState,
    catalog: Arc<dyn CatalogService>,

    header: Header,
    episode_list: EpisodeList,
    episode_detail: EpisodeDetail,
    player_panel: PlayerPanel,
    help_overlay: HelpOverlay,

    focus: FocusRing,
    toast: ToastManager,
    show_keys_bar: bool,
    should_quit: bool,
    pane_areas: PaneAreas,

    /// Set by `run`; fetch tasks report back through it.
    tx: Option<mpsc::Sender<AppMessage>>,
}

impl App {
    pub fn new(state: AppState, catalog: Arc<dyn CatalogService>) -> Self {
        Self {
            state,
            catalog,
            header: Header::new(),
            episode_list: EpisodeList::new(),
            episode_detail: EpisodeDetail::new(),
            player_panel: PlayerPanel::new(),
            help_overlay: HelpOverlay::new(),
            focus: FocusRing::new(vec![ComponentId::EpisodeList, ComponentId::EpisodeDetail]),
            toast: ToastManager::new(),
            show_keys_bar: true,
            should_quit: false,
            pane_areas: PaneAreas::default(),
            tx: None,
        }
    }

    pub async fn run(
        mut self,
        mut audio_rx: mpsc::UnboundedReceiver<TaggedAudioEvent>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: audio backend → AppMessage ───────────────────────
        let audio_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = audio_rx.recv().await {
                if audio_tx.send(AppMessage::Audio(ev)).await.is_err() {
                    break;
                }
            }
        });

        let initial = self.state.view.category();
        self.load_category(initial);

        // Toast expiry + spinner animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                    // Drain whatever else queued up before redrawing.
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next);
                    }
                }

                _ = ui_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.state.view.deselect_episode();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Apply one message.  Returns whether a redraw is needed.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a);
                    }
                    true
                }
                Event::Mouse(mouse) => {
                    for a in self.handle_mouse(mouse) {
                        self.dispatch(a);
                    }
                    true
                }
                Event::Resize(_, _) => true,
                _ => false,
            },

            AppMessage::CatalogLoaded(ticket, snapshot) => {
                let count = snapshot.episodes.len();
                if !self.state.view.apply_catalog(ticket, snapshot) {
                    return false;
                }
                self.toast.dismiss_spinner();
                self.episode_list.sync_episodes(&self.state);
                info!("[app] {} loaded: {} episodes", ticket.category, count);
                if count == 0 {
                    self.toast.warning(format!("no episodes in {}", ticket.category));
                }
                true
            }

            AppMessage::Audio(tagged) => {
                let event = tagged.event.clone();
                if !self.state.view.on_audio_event(tagged) {
                    return false;
                }
                match event {
                    AudioEvent::LoadFailed(reason) => {
                        self.toast.error(format!("load failed: {}", reason));
                        self.state.last_log = Some(format!("load failed: {}", reason));
                    }
                    AudioEvent::Ended => {
                        if let Some(ep) = self.state.view.active_episode() {
                            self.state.last_log = Some(format!("finished: {}", ep.title));
                        }
                    }
                    AudioEvent::MetadataLoaded(_) | AudioEvent::PositionTick(_) => {}
                }
                true
            }
        }
    }

    // ── Keyboard handling ─────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            let actions = self.help_overlay.handle_key(key, &self.state);
            if !actions.is_empty() {
                return actions;
            }
            // Any other key closes the overlay
            return vec![Action::ToggleHelp];
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('K') => return vec![Action::ToggleKeys],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char('e') => return vec![Action::FocusPane(ComponentId::EpisodeList)],
            KeyCode::Char('d') => return vec![Action::FocusPane(ComponentId::EpisodeDetail)],
            KeyCode::Char(c @ '1'..='3') => {
                let idx = (c as usize) - ('1' as usize);
                return vec![Action::SelectCategory(Category::ALL[idx])];
            }
            KeyCode::Char(']') => return vec![Action::NextCategory],
            KeyCode::Char('[') => return vec![Action::PrevCategory],
            KeyCode::Char('m') => {
                if let Some(url) = self.state.view.mailing_list_url() {
                    return vec![Action::CopyToClipboard(url.to_string())];
                }
                return vec![];
            }
            _ => {}
        }

        // Transport shortcuts only while a player is mounted.
        if self.state.has_player() {
            match key.code {
                KeyCode::Char(' ') => return vec![Action::TogglePlayPause],
                KeyCode::Left => return vec![Action::Skip(-self.state.skip_seconds)],
                KeyCode::Right => return vec![Action::Skip(self.state.skip_seconds)],
                _ => {}
            }
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::EpisodeList) => self.episode_list.handle_key(key, s),
            Some(ComponentId::EpisodeDetail) => self.episode_detail.handle_key(key, s),
            _ => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.help_overlay.visible {
            return vec![];
        }

        let col = event.column;
        let row = event.row;
        let areas = self.pane_areas.clone();
        let s = &self.state;

        // Focus follows the click.
        macro_rules! click_pane {
            ($component:expr, $area:expr) => {{
                let id = $component.id();
                let mut actions = $component.handle_mouse(event, $area, s);
                if self.focus.current() != Some(id) {
                    actions.insert(0, Action::FocusPane(id));
                }
                return actions;
            }};
        }

        if hit(areas.header, col, row) {
            return self.header.handle_mouse(event, areas.header, s);
        }
        if hit(areas.player_panel, col, row) {
            return self.player_panel.handle_mouse(event, areas.player_panel, s);
        }
        if hit(areas.episode_list, col, row) {
            click_pane!(self.episode_list, areas.episode_list);
        }
        if hit(areas.episode_detail, col, row) {
            click_pane!(self.episode_detail, areas.episode_detail);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.episode_list.on_action(&action, s));
            out.extend(self.episode_detail.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // depth-limited to one level
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        match action {
            // ── Catalog ───────────────────────────────────────────────────────
            Action::SelectCategory(category) => {
                if category != self.state.view.category() {
                    self.load_category(category);
                }
            }
            Action::NextCategory => {
                let next = self.state.view.category().next();
                self.load_category(next);
            }
            Action::PrevCategory => {
                let prev = self.state.view.category().prev();
                self.load_category(prev);
            }
            Action::SelectEpisode(id) => {
                if self.state.view.select_episode(&id) {
                    if let Some(ep) = self.state.view.active_episode() {
                        info!("[app] mounted {}", ep.title);
                        self.state.last_log = Some(format!("loaded: {}", ep.title));
                    }
                }
            }
            Action::DeselectEpisode => {
                self.state.view.deselect_episode();
                self.state.last_log = None;
            }

            // ── Playback ──────────────────────────────────────────────────────
            Action::TogglePlayPause => {
                if let Some(p) = self.state.view.player_mut() {
                    p.toggle_play_pause();
                }
            }
            Action::Skip(delta) => {
                if let Some(p) = self.state.view.player_mut() {
                    p.skip(delta);
                }
            }
            Action::SeekFraction(fraction) => {
                if let Some(p) = self.state.view.player_mut() {
                    p.handle_progress_bar_click(fraction);
                }
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),

            // ── UI toggles ────────────────────────────────────────────────────
            // The overlay flips its own visibility in on_action.
            Action::ToggleHelp => {}
            Action::ToggleKeys => self.show_keys_bar = !self.show_keys_bar,
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        // Truncate for toast display
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            Action::Quit => self.should_quit = true,
        }
    }

    /// Switch the view to `category` and start fetching it.
    fn load_category(&mut self, category: Category) {
        let ticket = self.state.view.select_category(category);
        self.episode_list.sync_episodes(&self.state);
        self.toast.spinner(format!("loading {}", category));
        self.spawn_fetch(ticket);
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let Some(tx) = self.tx.clone() else {
            debug!("[app] no event loop yet, fetch #{} not started", ticket.request_id);
            return;
        };
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            let snapshot = load_catalog(catalog.as_ref(), ticket.category).await;
            if tx.send(AppMessage::CatalogLoaded(ticket, snapshot)).await.is_err() {
                debug!("[app] event loop gone, dropping catalog #{}", ticket.request_id);
            }
        });
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | player | statusbar ──────────────────
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(4),
                Constraint::Length(1),
            ])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(outer[1]);

        self.pane_areas = PaneAreas {
            header: outer[0],
            episode_list: body[0],
            episode_detail: body[1],
            player_panel: outer[2],
        };

        self.header.draw(frame, outer[0], false, &self.state);
        let list_focused = self.focus.is_focused(ComponentId::EpisodeList);
        self.episode_list
            .draw(frame, body[0], list_focused, &self.state);
        let detail_focused = self.focus.is_focused(ComponentId::EpisodeDetail);
        self.episode_detail
            .draw(frame, body[1], detail_focused, &self.state);
        self.player_panel.draw(frame, outer[2], false, &self.state);
        status_bar::draw_keys_bar(frame, outer[3], &self.state, self.show_keys_bar);

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}
