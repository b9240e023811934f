use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let inner = vertical[1];
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(inner.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(inner);
    horizontal[1]
}

/// Cuts `value` to `max_width` display columns, ending in `…` when cut.
/// Returns the text and its display width.
pub fn clamp_text(value: &str, max_width: usize) -> (String, u16) {
    if value.width() <= max_width {
        return (value.to_string(), value.width() as u16);
    }
    if max_width == 0 {
        return (String::new(), 0);
    }
    let budget = max_width - 1;
    let mut result = String::new();
    let mut used = 0usize;
    for ch in value.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        result.push(ch);
        used += width;
    }
    result.push('…');
    (result, (used + 1) as u16)
}
