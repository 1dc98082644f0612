//! Appearance settings: background and running text.
//!
//! Works on a local copy; nothing changes until the sheet is saved.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use radio_core::settings::{AppSettings, BackgroundType, FontFamily, MAX_SPEED, MIN_SPEED};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{parse_hex_color, style_error, C_FILTER_FG, C_MUTED, C_PRIMARY, C_SECONDARY},
    widgets::{
        pane_chrome::overlay_chrome,
        text_field::{FieldCursor, TextField},
    },
};

use super::centered_rect;

const SPEED_STEP: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Row {
    Kind,
    Color1,
    Color2,
    ImageUrl,
    Show,
    Speed,
    Font,
}

const ROWS: [Row; 7] = [
    Row::Kind,
    Row::Color1,
    Row::Color2,
    Row::ImageUrl,
    Row::Show,
    Row::Speed,
    Row::Font,
];

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let pos = all.iter().position(|&x| x == current).unwrap_or(0);
    let len = all.len();
    let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
    all[next]
}

pub struct SettingsSheet {
    draft: AppSettings,
    color1: TextField,
    color2: TextField,
    image_url: TextField,
    cursor: FieldCursor,
    error: Option<String>,
}

impl SettingsSheet {
    pub fn new(current: &AppSettings) -> Self {
        let bg = &current.background;
        Self {
            draft: current.clone(),
            color1: TextField::new("Color 1").with_value(&bg.color1),
            color2: TextField::new("Color 2").with_value(&bg.color2),
            image_url: TextField::new("Image")
                .with_value(&bg.image_url)
                .with_hint("https://example.com/image.jpg"),
            cursor: FieldCursor::default(),
            error: None,
        }
    }

    fn row(&self) -> Row {
        ROWS[self.cursor.index]
    }

    fn text_field(&mut self, row: Row) -> Option<&mut TextField> {
        match row {
            Row::Color1 => Some(&mut self.color1),
            Row::Color2 => Some(&mut self.color2),
            Row::ImageUrl => Some(&mut self.image_url),
            _ => None,
        }
    }

    /// ←/→ (and space) on the choice rows.
    fn adjust(&mut self, forward: bool) {
        let row = self.row();
        let rt = &mut self.draft.running_text;
        match row {
            Row::Kind => {
                self.draft.background.kind =
                    cycle(&BackgroundType::ALL, self.draft.background.kind, forward)
            }
            Row::Show => rt.show = !rt.show,
            Row::Speed => {
                rt.speed = if forward {
                    (rt.speed + SPEED_STEP).min(MAX_SPEED)
                } else {
                    rt.speed.saturating_sub(SPEED_STEP).max(MIN_SPEED)
                }
            }
            Row::Font => rt.font_family = cycle(&FontFamily::ALL, rt.font_family, forward),
            Row::Color1 | Row::Color2 | Row::ImageUrl => {}
        }
    }

    fn save(&mut self) -> Vec<Action> {
        let color1 = self.color1.value().trim().to_string();
        let color2 = self.color2.value().trim().to_string();
        for c in [&color1, &color2] {
            if parse_hex_color(c).is_none() {
                self.error = Some(format!("\"{}\" is not a #rrggbb color", c));
                return vec![];
            }
        }
        let mut out = self.draft.clone();
        out.background.color1 = color1;
        out.background.color2 = color2;
        out.background.image_url = self.image_url.value().trim().to_string();
        vec![Action::CloseOverlay, Action::SaveSettings(out)]
    }

    fn choice_line(&self, row: Row, label: &str, value: String) -> Line<'static> {
        let focused = self.row() == row;
        let label_style = if focused {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY)
        };
        let arrows = if focused { ("‹ ", " ›") } else { ("  ", "  ") };
        Line::from(vec![
            Span::styled(format!("{:<10}", label), label_style),
            Span::styled(arrows.0, Style::default().fg(C_MUTED)),
            Span::styled(value, Style::default().fg(C_FILTER_FG)),
            Span::styled(arrows.1, Style::default().fg(C_MUTED)),
        ])
    }
}

impl Component for SettingsSheet {
    fn id(&self) -> ComponentId {
        ComponentId::SettingsSheet
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let count = ROWS.len();
        let row = self.row();
        match key.code {
            KeyCode::Esc => return vec![Action::CloseOverlay],
            KeyCode::Enter => return self.save(),
            KeyCode::Tab | KeyCode::Down => self.cursor.next(count),
            KeyCode::BackTab | KeyCode::Up => self.cursor.prev(count),
            _ => match row {
                Row::Color1 | Row::Color2 | Row::ImageUrl => {
                    if let Some(field) = self.text_field(row) {
                        field.handle_key(key);
                    }
                }
                _ => match key.code {
                    KeyCode::Left | KeyCode::Char('h') => self.adjust(false),
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => self.adjust(true),
                    _ => {}
                },
            },
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        let popup = centered_rect(60, 13, area);
        frame.render_widget(Clear, popup);
        let block = overlay_chrome("appearance");
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let line_at = |i: u16| Rect {
            y: inner.y + i,
            height: 1,
            ..inner
        };
        if inner.height < 11 {
            return;
        }

        let rt = &self.draft.running_text;
        let kind = self.choice_line(Row::Kind, "Backdrop", self.draft.background.kind.label().to_string());
        let show = self.choice_line(Row::Show, "Ticker", if rt.show { "on" } else { "off" }.to_string());
        let speed = self.choice_line(Row::Speed, "Speed", format!("{}s per loop", rt.speed));
        let font = self.choice_line(Row::Font, "Font", rt.font_family.label().to_string());

        frame.render_widget(
            Paragraph::new(Line::styled(" background", Style::default().fg(C_MUTED))),
            line_at(0),
        );
        frame.render_widget(Paragraph::new(kind), line_at(1));
        self.color1.draw(frame, line_at(2), self.row() == Row::Color1);
        self.color2.draw(frame, line_at(3), self.row() == Row::Color2);
        self.image_url.draw(frame, line_at(4), self.row() == Row::ImageUrl);
        frame.render_widget(
            Paragraph::new(Line::styled(" running text", Style::default().fg(C_MUTED))),
            line_at(5),
        );
        frame.render_widget(Paragraph::new(show), line_at(6));
        frame.render_widget(Paragraph::new(speed), line_at(7));
        frame.render_widget(Paragraph::new(font), line_at(8));

        let footer = match &self.error {
            Some(err) => Line::from(Span::styled(format!(" {}", err), style_error())),
            None => Line::styled(
                " ←→ change  ↑↓ move  Enter save  Esc cancel",
                Style::default().fg(C_MUTED),
            ),
        };
        frame.render_widget(Paragraph::new(footer), line_at(10));
    }
}
