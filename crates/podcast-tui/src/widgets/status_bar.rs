//! Status bar — bottom line with catalog state and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::AppState;
use crate::theme::{C_ACCENT, C_MODE_NORMAL, C_MUTED, C_PLAYING, C_SECONDARY};

const KEYS: &str = " ↑↓/jk select  Enter play  Esc close  Space play/pause  ←→ skip  Tab panes  1-3/[] category  y copy  m mailing list  K keys  ? help  q quit";

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, state: &AppState, show_keys: bool) {
    let view = &state.view;
    let (dot, dot_color) = if view.is_loading() {
        ("○", C_ACCENT)
    } else {
        ("●", C_PLAYING)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", view.category().label().to_uppercase()),
            Style::default().fg(C_MODE_NORMAL).add_modifier(Modifier::BOLD),
        ),
        Span::styled(dot, Style::default().fg(dot_color)),
        Span::raw(" "),
    ];

    if show_keys {
        spans.push(Span::styled(KEYS, Style::default().fg(C_MUTED)));
    } else if let Some(msg) = &state.last_log {
        spans.push(Span::styled(msg.as_str(), Style::default().fg(C_SECONDARY)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
