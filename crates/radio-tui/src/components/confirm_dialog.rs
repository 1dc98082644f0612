//! Delete confirmation.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use radio_core::protocol::{Station, StationId};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ERROR, C_MUTED, C_PRIMARY},
    widgets::pane_chrome::overlay_chrome,
};

use super::centered_rect;

pub struct ConfirmDelete {
    id: StationId,
    name: String,
}

impl ConfirmDelete {
    pub fn new(station: &Station) -> Self {
        Self {
            id: station.id,
            name: station.name.clone(),
        }
    }
}

impl Component for ConfirmDelete {
    fn id(&self) -> ComponentId {
        ComponentId::ConfirmDelete
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                vec![Action::CloseOverlay, Action::ConfirmDelete(self.id)]
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => vec![Action::CloseOverlay],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        let popup = centered_rect(50, 6, area);
        frame.render_widget(Clear, popup);
        let lines = vec![
            Line::from(vec![
                Span::styled(" Delete ", Style::default().fg(C_PRIMARY)),
                Span::styled(
                    format!("\"{}\"", self.name),
                    Style::default().fg(C_ERROR).add_modifier(Modifier::BOLD),
                ),
                Span::styled("?", Style::default().fg(C_PRIMARY)),
            ]),
            Line::from(Span::styled(
                " This removes it for every listener.",
                Style::default().fg(C_MUTED),
            )),
            Line::from(""),
            Line::from(Span::styled(" y delete   n / Esc keep", Style::default().fg(C_MUTED))),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .block(overlay_chrome("delete station"))
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}
