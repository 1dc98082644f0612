//! Ticker component: one scrolling row with the Indonesian date, clock
//! and weather.  Not focusable.

use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use radio_core::ticker::{format_date, format_time, marquee_offset, marquee_window, text_width};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, WeatherLine},
    component::Component,
    theme::{backdrop, font_modifier, C_FILTER_FG, C_SECONDARY},
};

const SEPARATOR: &str = "   •   ";

pub struct Ticker {
    started: Instant,
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

/// The loop text for one frame, separator included so the seam reads well.
pub fn ticker_text(now: &chrono::DateTime<chrono::Local>, weather: &WeatherLine) -> String {
    let weather = match weather {
        WeatherLine::Loading => "Memuat cuaca…",
        WeatherLine::Ready(summary) => summary.as_str(),
        WeatherLine::Unavailable(reason) => reason.as_str(),
    };
    format!(
        "{}{}{}{}{}{}",
        format_date(now),
        SEPARATOR,
        format_time(now),
        SEPARATOR,
        weather,
        SEPARATOR
    )
}

impl Component for Ticker {
    fn id(&self) -> ComponentId {
        ComponentId::Ticker
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let running = &state.settings.running_text;
        let (_, bg) = backdrop(&state.settings);
        let text = ticker_text(&chrono::Local::now(), &state.weather);
        let offset = marquee_offset(text_width(&text), running.speed, self.started.elapsed());
        let window = marquee_window(&text, area.width as usize, offset);

        let color = match state.weather {
            WeatherLine::Unavailable(_) => C_SECONDARY,
            _ => C_FILTER_FG,
        };
        let style = Style::default()
            .fg(color)
            .bg(bg)
            .add_modifier(font_modifier(running.font_family));
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(window, style))).style(Style::default().bg(bg)),
            area,
        );
    }
}
