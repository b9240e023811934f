use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::{Sort, SortDir, SortField, User};

use super::super::view::{Focus, UiContext};

const COLUMNS: [(&str, Option<SortField>); 6] = [
    ("ID", Some(SortField::Id)),
    ("Username", Some(SortField::Username)),
    ("Display name", Some(SortField::DisplayName)),
    ("Email", Some(SortField::Email)),
    ("Roles", None),
    ("Enabled", Some(SortField::Enabled)),
];

pub fn render_grid(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let list = ctx.screen.list();
    let mut title = match list.current_result() {
        Some(page) => format!(
            "Users · page {}/{} (total {})",
            page.page,
            page.page_count(),
            page.total
        ),
        None => "Users".to_string(),
    };
    if list.is_loading() {
        title.push_str(" · loading…");
    }
    let border_style = if ctx.focus == Focus::Grid {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    let (table_area, error_area) = match list.error() {
        Some(_) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(2)])
                .split(area);
            (chunks[0], Some(chunks[1]))
        }
        None => (area, None),
    };

    let rows = ctx.screen.rows();
    if rows.is_empty() {
        let text = if list.current_result().is_some() {
            "No users match the current filter."
        } else if list.is_loading() {
            "Loading users…"
        } else {
            "No data."
        };
        frame.render_widget(Paragraph::new(text).block(block), table_area);
    } else {
        let sort = list.query().sort;
        let header = Row::new(
            COLUMNS
                .iter()
                .map(|(label, field)| Cell::from(header_label(label, *field, sort))),
        )
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let selected = ctx.screen.selection();
        let body = rows.iter().map(|user| {
            let row = user_row(user);
            if Some(&user.id) == selected {
                row.style(
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
            } else if !user.enabled {
                row.style(Style::default().fg(Color::DarkGray))
            } else {
                row
            }
        });
        let table = Table::new(
            body,
            [
                Constraint::Length(6),
                Constraint::Percentage(18),
                Constraint::Percentage(22),
                Constraint::Percentage(30),
                Constraint::Percentage(18),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("» ");

        let mut state = TableState::default();
        state.select(Some(ctx.grid_cursor.min(rows.len() - 1)));
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    if let (Some(error), Some(error_area)) = (list.error(), error_area) {
        let message = Paragraph::new(Line::from(format!("⚠ {error} (r to retry)")))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(message, error_area);
    }
}

fn header_label(label: &str, field: Option<SortField>, sort: Sort) -> String {
    match field {
        Some(field) if field == sort.field => {
            let arrow = match sort.dir {
                SortDir::Asc => '▲',
                SortDir::Desc => '▼',
            };
            format!("{label} {arrow}")
        }
        _ => label.to_string(),
    }
}

fn user_row(user: &User) -> Row<'static> {
    let roles = user
        .roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(",");
    Row::new(vec![
        Cell::from(user.id.to_string()),
        Cell::from(user.username.clone()),
        Cell::from(user.display_name.clone()),
        Cell::from(user.email.clone()),
        Cell::from(roles),
        Cell::from(if user.enabled { "yes" } else { "no" }),
    ])
}
