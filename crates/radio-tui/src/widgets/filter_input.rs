//! FilterInput: wraps tui-input for the search bar above the station list.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

#[derive(Debug, PartialEq)]
pub enum FilterAction {
    Changed(String),
    Confirmed,
    Cancelled,
}

pub struct FilterInput {
    input: Input,
    active: bool,
    placeholder: String,
}

impl FilterInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    /// Esc with text clears it (bar stays open); Esc on an empty bar closes.
    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc => {
                if !self.input.value().is_empty() {
                    self.input = Input::default();
                    FilterAction::Changed(String::new())
                } else {
                    self.deactivate();
                    FilterAction::Cancelled
                }
            }
            KeyCode::Enter => {
                self.deactivate();
                FilterAction::Confirmed
            }
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                FilterAction::Changed(self.input.value().to_string())
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(4) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(
                format!("/ {}", self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("/ {}", visible), Style::default().fg(C_FILTER_FG))
        };

        let paragraph =
            Paragraph::new(Line::from(vec![display])).style(Style::default().bg(C_FILTER_BG));
        frame.render_widget(paragraph, area);

        if self.active && area.width > 2 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_double_escape() {
        let mut f = FilterInput::new("search");
        f.activate();
        assert_eq!(f.handle_key(key(KeyCode::Char('j'))), FilterAction::Changed("j".into()));
        assert_eq!(f.handle_key(key(KeyCode::Esc)), FilterAction::Changed(String::new()));
        assert!(f.is_active());
        assert_eq!(f.handle_key(key(KeyCode::Esc)), FilterAction::Cancelled);
        assert!(!f.is_active());
    }

    #[test]
    fn test_enter_keeps_text() {
        let mut f = FilterInput::new("search");
        f.activate();
        f.handle_key(key(KeyCode::Char('a')));
        assert_eq!(f.handle_key(key(KeyCode::Enter)), FilterAction::Confirmed);
        assert_eq!(f.text(), "a");
    }
}
