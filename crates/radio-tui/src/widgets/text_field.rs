//! Labelled single-line text field for the modal forms.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED, C_PRIMARY, C_SECONDARY};

const LABEL_WIDTH: u16 = 10;

pub struct TextField {
    label: &'static str,
    input: Input,
    masked: bool,
    hint: &'static str,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
            masked: false,
            hint: "",
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.input
            .handle_event(&ratatui::crossterm::event::Event::Key(key));
    }

    /// One row: label, then the value (or hint when empty).
    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if area.width <= LABEL_WIDTH + 1 || area.height == 0 {
            return;
        }
        let label_style = if focused {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY)
        };
        let field_width = area.width.saturating_sub(LABEL_WIDTH) as usize;
        let scroll = self.input.visual_scroll(field_width.saturating_sub(1));
        let value = self.input.value();

        let shown = if value.is_empty() {
            Span::styled(self.hint, Style::default().fg(C_MUTED))
        } else if self.masked {
            Span::styled(
                "•".repeat(value.chars().count().saturating_sub(scroll)),
                Style::default().fg(C_FILTER_FG),
            )
        } else {
            Span::styled(
                value.chars().skip(scroll).collect::<String>(),
                Style::default().fg(C_FILTER_FG),
            )
        };

        let line = Line::from(vec![
            Span::styled(
                format!("{:<width$}", self.label, width = LABEL_WIDTH as usize),
                label_style,
            ),
            shown,
        ]);
        let bg = if focused { C_FILTER_BG } else { ratatui::style::Color::Reset };
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);

        if focused {
            let cursor_x = area.x + LABEL_WIDTH + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

/// Which field of a form has focus, with wrap-around.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldCursor {
    pub index: usize,
}

impl FieldCursor {
    pub fn next(&mut self, count: usize) {
        if count > 0 {
            self.index = (self.index + 1) % count;
        }
    }

    pub fn prev(&mut self, count: usize) {
        if count > 0 {
            self.index = (self.index + count - 1) % count;
        }
    }

    pub fn is_last(&self, count: usize) -> bool {
        self.index + 1 >= count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_field_cursor_wraps() {
        let mut c = FieldCursor::default();
        c.prev(4);
        assert_eq!(c.index, 3);
        assert!(c.is_last(4));
        c.next(4);
        assert_eq!(c.index, 0);
    }

    #[test]
    fn test_typing_edits_value() {
        let mut f = TextField::new("Name").with_value("Gen");
        f.handle_key(KeyEvent::new(KeyCode::Char('!'), KeyModifiers::NONE));
        assert_eq!(f.value(), "Gen!");
        f.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(f.value(), "Gen");
    }
}
