use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    domain::{Role, UserField},
    form::{FormMode, FormSession, SessionStatus},
};

use super::{
    super::view::{Focus, UiContext},
    layout::clamp_text,
};

const VALUE_INDENT: u16 = 2;

pub fn render_form(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>, enable_cursor: bool) {
    let session = ctx.screen.session();
    let focused = ctx.focus == Focus::Form;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(form_title(session));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let footer_lines = footer_lines(session);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(footer_lines.len() as u16),
        ])
        .split(inner);

    let value_width = chunks[0].width.saturating_sub(VALUE_INDENT + 1) as usize;
    let mut lines = Vec::new();
    let mut cursor = None;
    for (index, field) in UserField::ALL.iter().copied().enumerate() {
        let is_current = focused && index == ctx.form_cursor;
        lines.push(label_line(session, field, is_current));
        match field {
            UserField::Roles => lines.push(roles_line(session, is_current, ctx.role_cursor)),
            UserField::Enabled => {
                let mark = if session.draft().enabled { "x" } else { " " };
                lines.push(Line::from(format!("  [{mark}] account enabled")));
            }
            _ => {
                let value = session.draft().text(field).unwrap_or_default();
                let (visible, width) = clamp_text(value, value_width);
                if is_current {
                    cursor = Some((lines.len() as u16, width));
                }
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(visible, value_style(is_current)),
                ]));
            }
        }
        if let Some(error) = session.errors().get(field) {
            lines.push(Line::from(Span::styled(
                format!("  ⚠ {error}"),
                Style::default().fg(Color::Red),
            )));
        }
    }
    frame.render_widget(Paragraph::new(lines), chunks[0]);
    frame.render_widget(
        Paragraph::new(footer_lines).wrap(Wrap { trim: true }),
        chunks[1],
    );

    if enable_cursor
        && !session.is_saving()
        && let Some((line, width)) = cursor
        && line < chunks[0].height
    {
        frame.set_cursor_position((
            chunks[0].x + VALUE_INDENT + width,
            chunks[0].y + line,
        ));
    }
}

fn form_title(session: &FormSession) -> String {
    let mut title = match (session.mode(), session.bound_id()) {
        (FormMode::Edit, Some(id)) => format!("Editing {id}"),
        _ => "New user".to_string(),
    };
    match session.status() {
        SessionStatus::Saving => title.push_str(" · saving…"),
        SessionStatus::SaveFailed => title.push_str(" · not saved"),
        SessionStatus::Idle => {}
    }
    title
}

fn label_line(session: &FormSession, field: UserField, is_current: bool) -> Line<'static> {
    let mut label = field.label().to_string();
    if field.is_required() {
        label.push_str(" *");
    }
    let style = if is_current {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    };
    let mut spans = vec![Span::styled(label, style)];
    if session.is_field_dirty(field) {
        spans.push(Span::styled(" ●", Style::default().fg(Color::Magenta)));
    }
    Line::from(spans)
}

fn roles_line(session: &FormSession, is_current: bool, role_cursor: usize) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (index, role) in Role::ALL.iter().enumerate() {
        let mark = if session.draft().roles.contains(role) {
            "x"
        } else {
            " "
        };
        let style = if is_current && index == role_cursor {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("[{mark}] {role}"), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn value_style(is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

fn footer_lines(session: &FormSession) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(user) = session.bound() {
        let meta = Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC);
        lines.push(Line::from(Span::styled(format!("id: {}", user.id), meta)));
        lines.push(Line::from(Span::styled(
            format!("created: {}", user.created_at.format("%Y-%m-%d %H:%M")),
            meta,
        )));
        lines.push(Line::from(Span::styled(
            format!("updated: {}", user.updated_at.format("%Y-%m-%d %H:%M")),
            meta,
        )));
    }
    for message in session.form_errors() {
        lines.push(Line::from(Span::styled(
            format!("⚠ {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines
}
