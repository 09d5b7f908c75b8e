//! Text progress bar and time formatting for the transport line.

use unicode_width::UnicodeWidthStr;

pub const FILL_GLYPH: char = '-';
pub const MARKER_GLYPH: char = '|';

/// Measures rendered text width in the host's units.
pub trait GlyphMetrics {
    fn width(&self, text: &str) -> usize;
}

/// Terminal cells, as laid out by a monospace terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMetrics;

impl GlyphMetrics for CellMetrics {
    fn width(&self, text: &str) -> usize {
        UnicodeWidthStr::width(text)
    }
}

/// Number of glyphs (marker included) to draw into `available`.
///
/// Counts the fills that fit strictly inside `available` next to the marker,
/// then gives one back, so the bar always stays narrower than the space.
pub fn bar_length(available: usize, metrics: &dyn GlyphMetrics) -> usize {
    let mut candidate = String::from(MARKER_GLYPH);
    let mut last = metrics.width(&candidate);
    if last >= available {
        return 0;
    }
    let mut fits = 0;
    loop {
        candidate.push(FILL_GLYPH);
        let w = metrics.width(&candidate);
        // zero-width fill would never terminate
        if w >= available || w <= last {
            break;
        }
        last = w;
        fits += 1;
    }
    // marker plus `fits - 1` fills
    fits
}

/// Fill glyphs left of the marker.
pub fn filled_length(position_secs: f64, bar_length: usize, duration_secs: f64) -> usize {
    if bar_length == 0 || !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    let raw = (position_secs * bar_length as f64 / duration_secs).round();
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw as usize).min(bar_length - 1)
}

/// Exactly `bar_length` glyphs: fill, one marker, fill.
pub fn render_bar(position_secs: f64, duration_secs: f64, bar_length: usize) -> String {
    if bar_length == 0 {
        return String::new();
    }
    let left = filled_length(position_secs, bar_length, duration_secs);
    let right = bar_length - 1 - left;
    let mut out = String::with_capacity(bar_length);
    out.extend(std::iter::repeat(FILL_GLYPH).take(left));
    out.push(MARKER_GLYPH);
    out.extend(std::iter::repeat(FILL_GLYPH).take(right));
    out
}

/// Map a column inside the bar to a `0..=1` fraction of the duration.
pub fn click_fraction(column: usize, bar_length: usize) -> f64 {
    if bar_length <= 1 {
        return 0.0;
    }
    (column.min(bar_length - 1) as f64) / (bar_length - 1) as f64
}

/// `HH:MM:SS`, truncating.  Hours are not capped.
pub fn format_seconds(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wide;

    impl GlyphMetrics for Wide {
        fn width(&self, text: &str) -> usize {
            text.chars().count() * 2
        }
    }

    struct Invisible;

    impl GlyphMetrics for Invisible {
        fn width(&self, _: &str) -> usize {
            0
        }
    }

    #[test]
    fn test_render_bar_quarter() {
        let bar = render_bar(250.0, 1000.0, 20);
        assert_eq!(bar, format!("{}|{}", "-".repeat(5), "-".repeat(14)));
        assert_eq!(bar.chars().count(), 20);
    }

    #[test]
    fn test_render_bar_edges() {
        assert_eq!(render_bar(0.0, 1000.0, 5), "|----");
        assert_eq!(render_bar(1000.0, 1000.0, 5), "----|");
        assert_eq!(render_bar(10.0, 0.0, 3), "|--");
        assert_eq!(render_bar(10.0, 100.0, 0), "");
    }

    #[test]
    fn test_bar_length_cells() {
        assert_eq!(bar_length(40, &CellMetrics), 38);
        assert_eq!(bar_length(3, &CellMetrics), 1);
        assert_eq!(bar_length(2, &CellMetrics), 0);
        assert_eq!(bar_length(1, &CellMetrics), 0);
        assert_eq!(bar_length(0, &CellMetrics), 0);
    }

    #[test]
    fn test_bar_length_wide_glyphs() {
        assert_eq!(bar_length(9, &Wide), 3);
        assert_eq!(bar_length(1, &Wide), 0);
    }

    #[test]
    fn test_bar_length_zero_width_terminates() {
        assert_eq!(bar_length(10, &Invisible), 0);
    }

    #[test]
    fn test_rendered_bar_narrower_than_available() {
        for available in 1..80 {
            for metrics in [&CellMetrics as &dyn GlyphMetrics, &Wide] {
                let len = bar_length(available, metrics);
                let rendered = metrics.width(&render_bar(500.0, 1000.0, len));
                assert!(rendered < available, "{} cells drew {}", available, rendered);
            }
        }
    }

    #[test]
    fn test_click_fraction() {
        assert_eq!(click_fraction(0, 21), 0.0);
        assert_eq!(click_fraction(10, 21), 0.5);
        assert_eq!(click_fraction(99, 21), 1.0);
        assert_eq!(click_fraction(3, 1), 0.0);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(59.99), "00:00:59");
        assert_eq!(format_seconds(1000.0), "00:16:40");
        assert_eq!(format_seconds(-5.0), "00:00:00");
        assert_eq!(format_seconds(f64::NAN), "00:00:00");
        assert_eq!(format_seconds(360_000.0), "100:00:00");
    }
}
