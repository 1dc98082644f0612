//! Admin sign-in dialog.  The auth service's error message is shown as-is.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_error, C_MUTED},
    widgets::{
        pane_chrome::overlay_chrome,
        text_field::{FieldCursor, TextField},
    },
};

use super::centered_rect;

pub struct LoginForm {
    email: TextField,
    password: TextField,
    cursor: FieldCursor,
    error: Option<String>,
    pending: bool,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            email: TextField::new("Email"),
            password: TextField::new("Password").masked(),
            cursor: FieldCursor::default(),
            error: None,
            pending: false,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.pending = false;
        self.password.set_value("");
        self.cursor.index = 1;
    }

    fn submit(&mut self) -> Vec<Action> {
        if self.pending {
            return vec![];
        }
        let email = self.email.value().trim().to_string();
        if email.is_empty() || self.password.value().is_empty() {
            self.error = Some("email and password are required".to_string());
            return vec![];
        }
        self.error = None;
        self.pending = true;
        vec![Action::SubmitLogin {
            email,
            password: self.password.value().to_string(),
        }]
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LoginForm {
    fn id(&self) -> ComponentId {
        ComponentId::LoginForm
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Esc => return vec![Action::CloseOverlay],
            KeyCode::Tab | KeyCode::Down => self.cursor.next(2),
            KeyCode::BackTab | KeyCode::Up => self.cursor.prev(2),
            KeyCode::Enter if self.cursor.is_last(2) => return self.submit(),
            KeyCode::Enter => self.cursor.next(2),
            _ if self.cursor.index == 0 => self.email.handle_key(key),
            _ => self.password.handle_key(key),
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        let popup = centered_rect(50, 6, area);
        frame.render_widget(Clear, popup);
        let block = overlay_chrome("admin sign in");
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        self.email.draw(frame, rows[0], self.cursor.index == 0);
        self.password.draw(frame, rows[1], self.cursor.index == 1);

        let footer = match (&self.error, self.pending) {
            (Some(err), _) => Line::from(Span::styled(format!(" {}", err), style_error())),
            (None, true) => Line::from(Span::styled(" signing in…", Style::default().fg(C_MUTED))),
            (None, false) => Line::from(Span::styled(
                " Enter to sign in, Esc to cancel",
                Style::default().fg(C_MUTED),
            )),
        };
        frame.render_widget(Paragraph::new(footer), rows[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_core::settings::AppSettings;
    use radio_core::state::RadioState;
    use ratatui::crossterm::event::KeyModifiers;

    #[test]
    fn test_submit_then_rejection_clears_password() {
        let state = AppState::new(RadioState::default(), AppSettings::default());
        let mut form = LoginForm::new();
        let press = |form: &mut LoginForm, code| {
            form.handle_key(KeyEvent::new(code, KeyModifiers::NONE), &state)
        };
        for c in "a@b.c".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        assert!(press(&mut form, KeyCode::Tab).is_empty());
        for c in "pw".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        let actions = press(&mut form, KeyCode::Enter);
        assert!(matches!(
            actions.as_slice(),
            [Action::SubmitLogin { email, password }] if email == "a@b.c" && password == "pw"
        ));

        form.set_error("Invalid login credentials");
        assert_eq!(form.error.as_deref(), Some("Invalid login credentials"));
        assert_eq!(form.password.value(), "");
        assert!(press(&mut form, KeyCode::Enter).is_empty());
    }
}
