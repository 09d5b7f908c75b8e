//! EpisodeDetail component — title, description and links of the active episode.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_LINK, C_MUTED, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::pane_chrome::pane_chrome,
};

pub struct EpisodeDetail {
    link_cursor: usize,
    scroll: u16,
}

impl EpisodeDetail {
    pub fn new() -> Self {
        Self {
            link_cursor: 0,
            scroll: 0,
        }
    }

    fn reset(&mut self) {
        self.link_cursor = 0;
        self.scroll = 0;
    }

    fn selected_link_url(&self, state: &AppState) -> Option<String> {
        state
            .view
            .active_episode()
            .and_then(|ep| ep.links.get(self.link_cursor))
            .map(|l| l.url.clone())
    }
}

impl Component for EpisodeDetail {
    fn id(&self) -> ComponentId {
        ComponentId::EpisodeDetail
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let link_count = state
            .view
            .active_episode()
            .map(|ep| ep.links.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.link_cursor + 1 < link_count {
                    self.link_cursor += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.link_cursor = self.link_cursor.saturating_sub(1);
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(5),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
            KeyCode::Enter | KeyCode::Char('y') => {
                if let Some(url) = self.selected_link_url(state) {
                    return vec![Action::CopyToClipboard(url)];
                }
            }
            KeyCode::Esc => return vec![Action::DeselectEpisode],
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::SelectEpisode(_)
            | Action::DeselectEpisode
            | Action::SelectCategory(_)
            | Action::NextCategory
            | Action::PrevCategory => self.reset(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("episode", Some("d"), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(ep) = state.view.active_episode() else {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  select an episode to play it",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!(" {}", ep.title),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for para in ep.description.lines() {
            lines.push(Line::from(Span::styled(
                format!(" {}", para),
                Style::default().fg(C_SECONDARY),
            )));
        }

        if !ep.links.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " links",
                Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
            )));
            for (i, link) in ep.links.iter().enumerate() {
                let row_style = if focused && i == self.link_cursor {
                    Style::default().bg(C_SELECTION_BG)
                } else {
                    Style::default()
                };
                let label = if link.title.is_empty() {
                    link.url.as_str()
                } else {
                    link.title.as_str()
                };
                lines.push(
                    Line::from(vec![
                        Span::styled("  · ", Style::default().fg(C_MUTED)),
                        Span::styled(label, Style::default().fg(C_PRIMARY)),
                        Span::raw("  "),
                        Span::styled(link.url.as_str(), Style::default().fg(C_LINK)),
                    ])
                    .style(row_style),
                );
            }
        }

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            inner,
        );
    }
}
