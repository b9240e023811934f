use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::Screen;

use super::components::{
    render_discard_dialog, render_footer, render_form, render_grid, render_header,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Grid,
    Form,
}

/// Everything one frame needs. UI-only cursors live here, not in [`Screen`].
pub struct UiContext<'a> {
    pub title: &'a str,
    pub screen: &'a Screen,
    pub focus: Focus,
    pub grid_cursor: usize,
    pub form_cursor: usize,
    pub role_cursor: usize,
    pub filter_editing: bool,
    pub help: Option<&'a str>,
}

pub fn draw(frame: &mut Frame<'_>, ctx: &UiContext<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let dialog_open = ctx.screen.pending().is_some();
    render_header(frame, rows[0], ctx, !dialog_open);
    render_grid(frame, body[0], ctx);
    render_form(frame, body[1], ctx, !dialog_open && !ctx.filter_editing);
    render_footer(frame, rows[2], ctx);

    if let Some(pending) = ctx.screen.pending() {
        render_discard_dialog(frame, pending);
    }
}
