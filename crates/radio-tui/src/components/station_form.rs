//! Add / edit station dialog.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use radio_core::protocol::{Station, StationDraft, DEFAULT_STATION_COLOR};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{parse_hex_color, style_error, C_MUTED},
    widgets::{
        pane_chrome::overlay_chrome,
        text_field::{FieldCursor, TextField},
    },
};

use super::centered_rect;

const NAME: usize = 0;
const URL: usize = 1;
const CITY: usize = 2;
const COLOR: usize = 3;

pub struct StationForm {
    editing: Option<Station>,
    fields: [TextField; 4],
    cursor: FieldCursor,
    error: Option<String>,
    submitting: bool,
}

impl StationForm {
    pub fn add() -> Self {
        Self {
            editing: None,
            fields: [
                TextField::new("Name"),
                TextField::new("Stream"),
                TextField::new("Kota").with_hint("optional"),
                TextField::new("Color").with_value(DEFAULT_STATION_COLOR),
            ],
            cursor: FieldCursor::default(),
            error: None,
            submitting: false,
        }
    }

    pub fn edit(station: &Station) -> Self {
        let mut form = Self::add();
        form.fields[NAME].set_value(&station.name);
        form.fields[URL].set_value(&station.url);
        form.fields[CITY].set_value(station.city().unwrap_or(""));
        form.fields[COLOR].set_value(station.color_or_default());
        form.editing = Some(station.clone());
        form
    }

    /// The request failed; reopen for another try.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.submitting = false;
    }

    fn submit(&mut self) -> Vec<Action> {
        if self.submitting {
            return vec![];
        }
        let color = self.fields[COLOR].value().trim();
        if !color.is_empty() && parse_hex_color(color).is_none() {
            self.error = Some("color must look like #rrggbb".to_string());
            self.cursor.index = COLOR;
            return vec![];
        }
        match StationDraft::from_fields(
            self.fields[NAME].value(),
            self.fields[URL].value(),
            self.fields[CITY].value(),
            color,
        ) {
            Ok(draft) => {
                self.error = None;
                self.submitting = true;
                vec![Action::SubmitStation {
                    editing: self.editing.clone(),
                    draft,
                }]
            }
            Err(e) => {
                self.error = Some(e.to_string());
                vec![]
            }
        }
    }

    fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "edit station"
        } else {
            "add station"
        }
    }
}

impl Component for StationForm {
    fn id(&self) -> ComponentId {
        ComponentId::StationForm
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let count = self.fields.len();
        match key.code {
            KeyCode::Esc => return vec![Action::CloseOverlay],
            KeyCode::Tab | KeyCode::Down => self.cursor.next(count),
            KeyCode::BackTab | KeyCode::Up => self.cursor.prev(count),
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.submit()
            }
            KeyCode::Enter if self.cursor.is_last(count) => return self.submit(),
            KeyCode::Enter => self.cursor.next(count),
            _ => self.fields[self.cursor.index].handle_key(key),
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        let popup = centered_rect(60, 10, area);
        frame.render_widget(Clear, popup);
        let block = overlay_chrome(self.title());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        for (i, field) in self.fields.iter().enumerate() {
            field.draw(frame, rows[i], i == self.cursor.index);
        }

        // Swatch preview beside the color value.
        if let Some(color) = parse_hex_color(self.fields[COLOR].value()) {
            let row = rows[COLOR];
            let x = row.x + row.width.saturating_sub(3);
            frame.render_widget(
                Paragraph::new(Span::styled("██", Style::default().fg(color))),
                Rect { x, width: 2, ..row },
            );
        }

        let footer = if let Some(err) = &self.error {
            Line::from(Span::styled(format!(" {}", err), style_error()))
        } else if self.submitting {
            Line::from(Span::styled(" saving…", Style::default().fg(C_MUTED)))
        } else {
            Line::from(Span::styled(
                " Enter on last field or Ctrl+S to save, Esc to cancel",
                Style::default().fg(C_MUTED),
            ))
        };
        frame.render_widget(Paragraph::new(footer), rows[5]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_core::settings::AppSettings;
    use radio_core::state::RadioState;

    fn state() -> AppState {
        AppState::new(RadioState::default(), AppSettings::default())
    }

    fn type_str(form: &mut StationForm, s: &str) {
        for c in s.chars() {
            form.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), &state());
        }
    }

    fn key(form: &mut StationForm, code: KeyCode) -> Vec<Action> {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &state())
    }

    #[test]
    fn test_missing_url_is_rejected_inline() {
        let mut form = StationForm::add();
        type_str(&mut form, "Prambors");
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(form.handle_key(ctrl_s, &state()).is_empty());
        assert_eq!(form.error.as_deref(), Some("stream URL is required"));
    }

    #[test]
    fn test_enter_walks_fields_then_submits() {
        let mut form = StationForm::add();
        type_str(&mut form, " Gen FM ");
        key(&mut form, KeyCode::Enter);
        type_str(&mut form, "https://stream.example/gen");
        key(&mut form, KeyCode::Enter);
        key(&mut form, KeyCode::Enter);
        let actions = key(&mut form, KeyCode::Enter);
        match actions.as_slice() {
            [Action::SubmitStation { editing: None, draft }] => {
                assert_eq!(draft.name, "Gen FM");
                assert_eq!(draft.city, None);
                assert_eq!(draft.color.as_deref(), Some(DEFAULT_STATION_COLOR));
            }
            other => panic!("unexpected {:?}", other),
        }
        // A second Enter while the request is in flight does nothing.
        assert!(key(&mut form, KeyCode::Enter).is_empty());
    }

    #[test]
    fn test_edit_keeps_identity_and_rejects_bad_color() {
        let station = Station {
            id: 9,
            name: "Sonora".into(),
            url: "https://stream.example/sonora".into(),
            city: Some("Bandung".into()),
            color: Some("#ef4444".into()),
            created_at: None,
        };
        let mut form = StationForm::edit(&station);
        form.cursor.index = COLOR;
        type_str(&mut form, "zz");
        assert!(key(&mut form, KeyCode::Enter).is_empty());
        assert!(form.error.is_some());

        key(&mut form, KeyCode::Backspace);
        key(&mut form, KeyCode::Backspace);
        let actions = key(&mut form, KeyCode::Enter);
        assert!(matches!(
            actions.as_slice(),
            [Action::SubmitStation { editing: Some(s), .. }] if s.id == 9
        ));
    }
}
