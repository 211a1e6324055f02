//! Layout and text helpers shared by the UI components.

use ratatui::prelude::*;
use unicode_width::UnicodeWidthStr;

/// Creates a centered rectangle sized as a percentage of `r`.
///
/// Used to position modal dialogs.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    area[1]
}

/// Like [`centered_rect`], but clamps the result between `min` and `max` sizes
/// (never exceeding the parent area).
pub fn centered_min_max(percent_x: u16, percent_y: u16, min: Rect, max: Rect, r: Rect) -> Rect {
    let proposed = centered_rect(percent_x, percent_y, r);
    let width = proposed.width.clamp(min.width, max.width).min(r.width);
    let height = proposed.height.clamp(min.height, max.height).min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

/// Truncate `text` to fit `max_width` display columns, appending an ellipsis when cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut truncated = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > max_width {
            break;
        }
        truncated.push(ch);
        used += ch_width;
    }
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_min_max_respects_bounds() {
        let parent = Rect::new(0, 0, 200, 60);
        let area = centered_min_max(50, 50, Rect::new(0, 0, 60, 20), Rect::new(0, 0, 80, 24), parent);
        assert_eq!((area.width, area.height), (80, 24));
        assert_eq!((area.x, area.y), (60, 18));

        let small = Rect::new(0, 0, 40, 10);
        let area = centered_min_max(50, 50, Rect::new(0, 0, 60, 20), Rect::new(0, 0, 80, 24), small);
        assert_eq!((area.width, area.height), (40, 10));
    }

    #[test]
    fn truncation_appends_ellipsis() {
        assert_eq!(truncate_to_width("alice", 10), "alice");
        assert_eq!(truncate_to_width("@margaret - Margaret Hamilton", 10), "@margaret…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
