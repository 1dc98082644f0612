pub mod confirm_dialog;
pub mod help_overlay;
pub mod login_form;
pub mod now_playing;
pub mod settings_sheet;
pub mod station_form;
pub mod station_list;
pub mod ticker;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// A popup `percent_x` wide and `height` rows tall, centered in `r`.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
