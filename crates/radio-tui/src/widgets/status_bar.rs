//! Status bar: bottom line with input mode, session and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ADMIN, C_MODE_FILTER, C_MODE_FORM, C_MODE_NORMAL, C_MUTED, C_SECONDARY};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    /// A modal form or dialog owns the keyboard.
    Form,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "RADIO",
            Self::Filter => "SEARCH",
            Self::Form => "FORM",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
            Self::Form => C_MODE_FORM,
        }
    }
}

pub fn keys_hint(mode: InputMode, admin: bool) -> &'static str {
    match mode {
        InputMode::Normal if admin => {
            " ↑↓/jk move  Enter play  Space pause  n/p next/prev  ←→ vol  m mute  s sort  / search  y copy  a add  e edit  d delete  K/J reorder  S settings  L logout  ? help  q quit"
        }
        InputMode::Normal => {
            " ↑↓/jk move  Enter play  Space pause  n/p next/prev  ←→ vol  m mute  s sort  / search  y copy  L login  ? help  q quit"
        }
        InputMode::Filter => " type name or city  ↑↓ move  Enter keep  Esc clear+close",
        InputMode::Form => " Tab/↓ next field  Shift+Tab/↑ prev  Enter submit  Esc cancel",
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, user: Option<&str>) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default()
            .fg(mode.color())
            .add_modifier(Modifier::BOLD),
    )];
    match user {
        Some(email) => spans.push(Span::styled(
            format!("● {} ", email),
            Style::default().fg(C_ADMIN),
        )),
        None => spans.push(Span::styled("○ guest ", Style::default().fg(C_SECONDARY))),
    }
    spans.push(Span::styled(
        keys_hint(mode, user.is_some()),
        Style::default().fg(C_MUTED),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
