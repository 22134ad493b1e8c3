use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::models::{MAX_RATING, MIN_RATING};

/// Render a rating as a fixed-width bar, filled from the naughty end.
pub(crate) fn rating_bar(rating: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = (MAX_RATING - MIN_RATING) as usize;
    let position = (rating.clamp(MIN_RATING, MAX_RATING) - MIN_RATING) as usize;
    let filled = (position * width + span / 2) / span;
    let mut bar = "#".repeat(filled);
    bar.push_str(&".".repeat(width - filled));
    bar
}

/// Red for naughty, green for nice, yellow in between.
pub(crate) fn rating_style(rating: i64) -> Style {
    if rating <= 33 {
        Style::default().fg(Color::Red)
    } else if rating <= 66 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Green)
    }
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bar_spans_full_width() {
        assert_eq!(rating_bar(MIN_RATING, 10), "..........");
        assert_eq!(rating_bar(MAX_RATING, 10), "##########");
        assert_eq!(rating_bar(50, 10).len(), 10);
        assert_eq!(rating_bar(50, 0), "");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save children");
        assert_eq!(surface_error(&err), "disk full");
    }
}
