//! EpisodeList component — left pane, one row per episode of the category.

use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use podcast_core::catalog::Episode;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PAUSED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
    },
};

const DOUBLE_CLICK_MS: u128 = 400;

pub struct EpisodeList {
    pub list: ScrollableList<Episode>,
    list_state: ListState,
    /// Track last click (row index, time) for double-click detection.
    last_click: Option<(usize, Instant)>,
}

impl EpisodeList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            list_state: ListState::default(),
            last_click: None,
        }
    }

    /// Mirror the view's episodes, keeping the cursor on the active one.
    pub fn sync_episodes(&mut self, state: &AppState) {
        self.list.set_items(state.view.episodes().to_vec());
        if let Some(id) = state.view.active_episode_id() {
            self.list.select_where(|e| e.id == id);
        }
    }

    fn selected_id(&self) -> Option<String> {
        self.list.selected_item().map(|e| e.id.clone())
    }

    fn render_item<'a>(episode: &'a Episode, is_selected: bool, state: &AppState) -> ListItem<'a> {
        let is_active = state.view.active_episode_id() == Some(episode.id.as_str());
        let (icon, icon_color) = match state.view.player() {
            Some(p) if is_active && p.is_playing() => ("▶", C_PLAYING),
            Some(_) if is_active => ("⏸", C_PAUSED),
            _ => (" ", C_MUTED),
        };

        let name_color = if is_active {
            icon_color
        } else if is_selected {
            C_PRIMARY
        } else {
            C_SECONDARY
        };
        let mut name_style = Style::default().fg(name_color);
        if is_active || is_selected {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        let item_bg = if is_selected {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };

        ListItem::new(Line::from(vec![
            Span::raw(" "),
            Span::styled(icon, Style::default().fg(icon_color)),
            Span::raw(" "),
            Span::styled(episode.title.as_str(), name_style),
        ]))
        .style(item_bg)
    }
}

impl Component for EpisodeList {
    fn id(&self) -> ComponentId {
        ComponentId::EpisodeList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),

            KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    // Enter on the active row only resumes it.
                    if state.view.active_episode_id() == Some(id.as_str()) {
                        return vec![Action::TogglePlayPause];
                    }
                    return vec![Action::SelectEpisode(id)];
                }
            }
            KeyCode::Esc => {
                if state.view.active_episode_id().is_some() {
                    return vec![Action::DeselectEpisode];
                }
            }
            KeyCode::Char('y') => {
                if let Some(ep) = self.list.selected_item() {
                    return vec![Action::CopyToClipboard(ep.audio_source_url.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize; // +1 for border
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < DOUBLE_CLICK_MS)
                    .unwrap_or(false);

                if self.list.handle_click(rel_row) {
                    if is_double {
                        self.last_click = None;
                        if let Some(id) = self.selected_id() {
                            return vec![Action::SelectEpisode(id), Action::TogglePlayPause];
                        }
                    } else {
                        self.last_click = Some((rel_row, now));
                        if let Some(id) = self.selected_id() {
                            return vec![Action::SelectEpisode(id)];
                        }
                    }
                } else {
                    self.last_click = Some((rel_row, now));
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::SelectCategory(_) | Action::NextCategory | Action::PrevCategory => {
                self.list.set_items(Vec::new());
            }
            Action::SelectEpisode(id) => {
                self.list.select_where(|e| &e.id == id);
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = format!("episodes · {}", state.view.category().label());
        let count = self.list.len().to_string();
        let block = pane_chrome(
            &title,
            Some("e"),
            focused,
            Some(Badge {
                text: &count,
                color: C_MUTED,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            let msg = if state.view.is_loading() {
                "  loading episodes…"
            } else {
                "  no episodes"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let content_h = inner.height as usize;
        self.list.ensure_visible(content_h);
        let sel_in_view = self.list.selected_in_view(content_h);
        let items: Vec<ListItem> = self
            .list
            .visible_items(content_h)
            .into_iter()
            .enumerate()
            .map(|(view_row, (_, ep))| Self::render_item(ep, view_row == sel_in_view, state))
            .collect();

        self.list_state.select(Some(sel_in_view));
        frame.render_stateful_widget(List::new(items), inner, &mut self.list_state);
    }
}
