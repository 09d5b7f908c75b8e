//! Header component — category tabs, blurb and mailing-list line.
//!
//! Row 1: `[1] podcasts  [2] two objects  [3] funny`, clickable.
//! Rows 2-3: category description (wrapped).
//! Row 4: mailing-list link, only when one is configured.
//!
//! Not focusable.

use ratatui::crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use podcast_core::catalog::Category;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_tab_active, C_LINK, C_NUMBER_HINT, C_SECONDARY},
};

pub struct Header {
    /// Screen rects of the tabs from the last draw.
    tab_rects: Vec<(Category, Rect)>,
}

impl Header {
    pub fn new() -> Self {
        Self {
            tab_rects: Vec::new(),
        }
    }

    fn category_at(&self, col: u16, row: u16) -> Option<Category> {
        self.tab_rects
            .iter()
            .find(|(_, r)| col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height)
            .map(|(c, _)| *c)
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Header
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if let Some(cat) = self.category_at(event.column, event.row) {
                if cat != state.view.category() {
                    return vec![Action::SelectCategory(cat)];
                }
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        frame.render_widget(Clear, area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.tab_rects.clear();
        let mut spans = Vec::new();
        let mut x = rows[0].x + 1;
        spans.push(Span::raw(" "));
        for cat in Category::ALL {
            let hint = format!("[{}] ", cat.index() + 1);
            let label = cat.label();
            let width = (hint.width() + label.width()) as u16;
            self.tab_rects.push((
                cat,
                Rect {
                    x,
                    y: rows[0].y,
                    width,
                    height: 1,
                },
            ));
            x += width + 2;

            let label_style = if cat == state.view.category() {
                style_tab_active()
            } else {
                Style::default().fg(C_SECONDARY)
            };
            spans.push(Span::styled(hint, Style::default().fg(C_NUMBER_HINT)));
            spans.push(Span::styled(label, label_style));
            spans.push(Span::raw("  "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), rows[0]);

        let description = if state.view.is_loading() {
            Span::styled(" loading…", style_muted())
        } else {
            Span::styled(
                format!(" {}", state.view.description()),
                Style::default().fg(C_SECONDARY),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(description)).wrap(Wrap { trim: false }),
            rows[1],
        );

        if let Some(url) = state.view.mailing_list_url() {
            let line = Line::from(vec![
                Span::styled(" mailing list ", style_muted()),
                Span::styled(url, Style::default().fg(C_LINK)),
                Span::styled("  (m to copy)", style_muted()),
            ]);
            frame.render_widget(Paragraph::new(line), rows[2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::fixtures;
    use ratatui::crossterm::event::KeyModifiers;

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_tab_click_selects_category() {
        let (state, _rx) = fixtures::loaded(&["a"]);
        let mut header = Header::new();
        header.tab_rects = vec![
            (Category::Podcasts, Rect::new(1, 0, 12, 1)),
            (Category::Funny, Rect::new(30, 0, 9, 1)),
        ];
        let area = Rect::new(0, 0, 80, 4);

        assert_eq!(
            header.handle_mouse(click(32, 0), area, &state),
            vec![Action::SelectCategory(Category::Funny)]
        );
        // already active
        assert!(header.handle_mouse(click(3, 0), area, &state).is_empty());
        // between tabs
        assert!(header.handle_mouse(click(20, 0), area, &state).is_empty());
    }
}
