use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::super::view::UiContext;

const SEARCH_LABEL: &str = "Search: ";

pub fn render_header(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>, enable_cursor: bool) {
    let query = ctx.screen.list().query();
    let search_style = if ctx.filter_editing {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let search_text = if query.text.is_empty() && !ctx.filter_editing {
        "(press / to search)".to_string()
    } else {
        query.text.clone()
    };
    let hide = if query.hides_disabled() { "on" } else { "off" };
    let mut spans = vec![
        Span::styled(SEARCH_LABEL, Style::default().fg(Color::Cyan)),
        Span::styled(search_text, search_style),
    ];
    if ctx.screen.list().has_pending_filter() {
        spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw(format!(
        "  | hide disabled: {hide} | sort: {} | page size: {}",
        query.sort,
        query.page_size.get()
    )));

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(ctx.title.to_string()),
    );
    frame.render_widget(paragraph, area);

    if enable_cursor && ctx.filter_editing {
        let column = (SEARCH_LABEL.width() + query.text.width()) as u16;
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(column)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y.saturating_add(1)));
    }
}
