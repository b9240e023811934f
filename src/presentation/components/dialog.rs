use ratatui::{
    Frame,
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::sync::PendingChange;

use super::layout::popup_rect;

const DIALOG_WIDTH: u16 = 52;
const DIALOG_HEIGHT: u16 = 7;

pub fn render_discard_dialog(frame: &mut Frame<'_>, pending: &PendingChange) {
    let question = match pending {
        PendingChange::SelectRow(user) => format!("Discard them and open {}?", user.username),
        PendingChange::NewUser => "Discard them and start a new user?".to_string(),
        PendingChange::Leave => "Discard them and quit?".to_string(),
    };
    let width = DIALOG_WIDTH.min(frame.area().width.saturating_sub(2).max(1));
    let height = DIALOG_HEIGHT.min(frame.area().height.max(3));
    let area = popup_rect(frame.area(), width, height);
    frame.render_widget(Clear, area);

    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from("You have unsaved changes."),
        Line::from(question),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", key),
            Span::raw(" discard   "),
            Span::styled("n", key),
            Span::raw(" keep editing"),
        ]),
    ];
    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Unsaved changes")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(dialog, area);
}
