//! PlayerPanel component — transport glyphs, clock and text progress bar.
//!
//! Inner row 1: `<  !>  >  HH:MM:SS/HH:MM:SS  title` (or `x load failed`).
//! Inner row 2: the progress bar, re-measured on every draw.
//!
//! Not focusable; only mouse input.  Empty when no episode is mounted.

use ratatui::crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use podcast_core::progress::{
    bar_length, click_fraction, format_seconds, render_bar, CellMetrics,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_BAR, C_ERROR, C_MUTED, C_PAUSED, C_PLAYING, C_PRIMARY, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Glyph {
    Back,
    PlayPause,
    Forward,
}

pub struct PlayerPanel {
    glyph_rects: Vec<(Glyph, Rect)>,
    bar_rect: Option<Rect>,
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
}

impl PlayerPanel {
    pub fn new() -> Self {
        Self {
            glyph_rects: Vec::new(),
            bar_rect: None,
        }
    }

    fn clear_hit_areas(&mut self) {
        self.glyph_rects.clear();
        self.bar_rect = None;
    }
}

impl Component for PlayerPanel {
    fn id(&self) -> ComponentId {
        ComponentId::PlayerPanel
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        if !state.has_player() {
            return vec![];
        }
        if let Some(bar) = self.bar_rect {
            if hit(bar, event.column, event.row) {
                let col = (event.column - bar.x) as usize;
                return vec![Action::SeekFraction(click_fraction(col, bar.width as usize))];
            }
        }
        let glyph = self
            .glyph_rects
            .iter()
            .find(|(_, r)| hit(*r, event.column, event.row))
            .map(|(g, _)| *g);
        match glyph {
            Some(Glyph::Back) => vec![Action::Skip(-state.skip_seconds)],
            Some(Glyph::PlayPause) => vec![Action::TogglePlayPause],
            Some(Glyph::Forward) => vec![Action::Skip(state.skip_seconds)],
            None => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        self.clear_hit_areas();
        let view = &state.view;

        let badge = view.player().map(|p| {
            if p.state().load_error.is_some() {
                Badge {
                    text: "ERROR",
                    color: C_ERROR,
                }
            } else if p.is_playing() {
                Badge {
                    text: "PLAYING",
                    color: C_PLAYING,
                }
            } else {
                Badge {
                    text: "PAUSED",
                    color: C_PAUSED,
                }
            }
        });
        let block = pane_chrome("player", None, false, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let (Some(player), Some(episode)) = (view.player(), view.active_episode()) else {
            frame.render_widget(
                Paragraph::new(Span::styled("  nothing playing", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        };
        let ps = player.state();

        if let Some(reason) = &ps.load_error {
            let line = Line::from(vec![
                Span::styled(
                    " x load failed",
                    Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", reason), Style::default().fg(C_SECONDARY)),
            ]);
            frame.render_widget(Paragraph::new(line), inner);
            return;
        }

        let play_glyph = if ps.is_playing { "#" } else { "!>" };
        let glyphs = [
            (Glyph::Back, "<"),
            (Glyph::PlayPause, play_glyph),
            (Glyph::Forward, ">"),
        ];
        let mut spans = vec![Span::raw(" ")];
        let mut x = inner.x + 1;
        for (glyph, text) in glyphs {
            let w = text.width() as u16;
            self.glyph_rects.push((
                glyph,
                Rect {
                    x,
                    y: inner.y,
                    width: w,
                    height: 1,
                },
            ));
            spans.push(Span::styled(
                text,
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw("  "));
            x += w + 2;
        }
        spans.push(Span::styled(
            format!(
                "{}/{}",
                format_seconds(ps.position_secs),
                format_seconds(ps.duration_secs)
            ),
            Style::default().fg(C_SECONDARY),
        ));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            episode.title.as_str(),
            Style::default().fg(C_PRIMARY),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);

        if inner.height < 2 {
            return;
        }
        // one cell of padding either side
        let available = inner.width.saturating_sub(2) as usize;
        let len = bar_length(available, &CellMetrics);
        if len == 0 {
            return;
        }
        let bar = Rect {
            x: inner.x + 1,
            y: inner.y + 1,
            width: len as u16,
            height: 1,
        };
        self.bar_rect = Some(bar);
        frame.render_widget(
            Paragraph::new(Span::styled(
                render_bar(ps.position_secs, ps.duration_secs, len),
                Style::default().fg(C_BAR),
            )),
            bar,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::fixtures;
    use ratatui::{backend::TestBackend, crossterm::event::KeyModifiers, Terminal};

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn render(panel: &mut PlayerPanel, state: &AppState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(40, 4)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                panel.draw(f, area, false, state);
            })
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_renders_transport_and_bar() {
        let (mut state, _rx) = fixtures::loaded(&["a"]);
        state.view.select_episode("a");
        let mut panel = PlayerPanel::new();
        let rows = render(&mut panel, &state);

        assert!(rows[1].contains("<  !>  >  00:00:00/00:16:40"));
        // border, pad, then the bar starts with the marker at position 0
        assert!(rows[2].starts_with("│ |---"));
        let bar = panel.bar_rect.unwrap();
        // 36 cells between the padding, drawn one fill short
        assert_eq!(bar.width, 34);
        assert!((bar.width as usize) < 36);
        assert!(rows[2].ends_with("-   │"));
    }

    #[test]
    fn test_bar_click_seeks() {
        let (mut state, _rx) = fixtures::loaded(&["a"]);
        state.view.select_episode("a");
        let mut panel = PlayerPanel::new();
        render(&mut panel, &state);

        let bar = panel.bar_rect.unwrap();
        let actions = panel.handle_mouse(click(bar.x + bar.width - 1, bar.y), bar, &state);
        assert_eq!(actions, vec![Action::SeekFraction(1.0)]);
    }

    #[test]
    fn test_glyph_clicks() {
        let (mut state, _rx) = fixtures::loaded(&["a"]);
        state.view.select_episode("a");
        let mut panel = PlayerPanel::new();
        render(&mut panel, &state);
        let area = Rect::new(0, 0, 40, 4);

        // inner row starts at (1, 1); "<" sits at column 2, "!>" at 5
        assert_eq!(panel.handle_mouse(click(2, 1), area, &state), vec![Action::Skip(-10.0)]);
        assert_eq!(panel.handle_mouse(click(6, 1), area, &state), vec![Action::TogglePlayPause]);
        assert_eq!(panel.handle_mouse(click(9, 1), area, &state), vec![Action::Skip(10.0)]);
    }

    #[test]
    fn test_load_error_state() {
        let (mut state, _rx) = fixtures::loaded(&["a"]);
        state.view.select_episode("a");
        if let Some(p) = state.view.player_mut() {
            p.on_load_failed("unsupported format".into());
        }
        let mut panel = PlayerPanel::new();
        let rows = render(&mut panel, &state);
        assert!(rows[1].contains("x load failed  unsupported format"));
        assert!(panel.bar_rect.is_none());
    }

    #[test]
    fn test_no_player_ignores_clicks() {
        let (state, _rx) = fixtures::loaded(&["a"]);
        let mut panel = PlayerPanel::new();
        let rows = render(&mut panel, &state);
        assert!(rows[1].contains("nothing playing"));
        assert!(panel
            .handle_mouse(click(2, 1), Rect::new(0, 0, 40, 4), &state)
            .is_empty());
    }
}
