//! NowPlaying component: right pane: current station, playback state,
//! volume, listeners and visitors.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        parse_hex_color, C_ADMIN, C_ERROR, C_LOCATION, C_MUTED, C_PAUSED, C_PLAYING, C_PRIMARY,
        C_SECONDARY,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const VOLUME_STEP: f32 = 0.05;

pub struct NowPlaying;

impl Component for NowPlaying {
    fn id(&self) -> ComponentId {
        ComponentId::NowPlaying
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::Volume(VOLUME_STEP)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::Volume(-VOLUME_STEP)],
            KeyCode::Enter | KeyCode::Char(' ') => vec![Action::TogglePause],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let online = format!("{} online", state.online_count);
        let block = pane_chrome(
            "now playing",
            Some('2'),
            focused,
            Some(Badge {
                text: &online,
                color: if state.online_count > 0 { C_PLAYING } else { C_MUTED },
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(station_lines(state)), rows[0]);
        draw_volume(frame, rows[2], state);
        frame.render_widget(Paragraph::new(footer_lines(state)), rows[4]);
    }
}

fn station_lines(state: &AppState) -> Vec<Line<'_>> {
    let selection = state.radio.selection();
    let Some(station) = state.radio.current_station() else {
        return vec![
            Line::from(Span::styled(" nothing playing", Style::default().fg(C_MUTED))),
            Line::from(Span::styled(
                " pick a station and press enter",
                Style::default().fg(C_MUTED),
            )),
        ];
    };

    let (status, color) = if !state.audio_ready {
        ("✗ audio unavailable", C_ERROR)
    } else if selection.is_playing && state.buffering {
        ("⋯ buffering", C_PAUSED)
    } else if selection.is_playing {
        ("▶ playing", C_PLAYING)
    } else {
        ("⏸ paused", C_PAUSED)
    };
    let swatch = parse_hex_color(station.color_or_default()).unwrap_or(C_PRIMARY);

    let mut title = vec![
        Span::raw(" "),
        Span::styled("● ", Style::default().fg(swatch)),
        Span::styled(
            station.name.as_str(),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(city) = station.city() {
        title.push(Span::styled(format!("  {}", city), Style::default().fg(C_LOCATION)));
    }
    vec![
        Line::from(title),
        Line::from(Span::styled(format!(" {}", status), Style::default().fg(color))),
        Line::from(Span::styled(
            format!(" {}", station.url),
            Style::default().fg(C_MUTED),
        )),
    ]
}

/// Smooth Unicode bar, 8 steps per cell.
fn volume_bar(fraction: f32, width: usize) -> String {
    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
    let eighths = (fraction.clamp(0.0, 1.0) * width as f32 * 8.0).round() as usize;
    let full = (eighths / 8).min(width);
    let mut bar = "█".repeat(full);
    if full < width {
        bar.push(BLOCKS[eighths % 8]);
        bar.push_str(&" ".repeat(width - full - 1));
    }
    bar
}

fn draw_volume(frame: &mut Frame, area: Rect, state: &AppState) {
    let playback = &state.radio.playback;
    let label = if playback.is_muted() {
        " vol  muted ".to_string()
    } else {
        format!(" vol {:>4.0}% ", playback.volume() * 100.0)
    };
    let bar_w = (area.width as usize).saturating_sub(label.chars().count() + 1);
    let color = if playback.is_muted() { C_MUTED } else { C_PLAYING };
    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(C_SECONDARY)),
        Span::styled(
            volume_bar(playback.effective_volume(), bar_w),
            Style::default().fg(color),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn footer_lines(state: &AppState) -> Vec<Line<'_>> {
    let visits = match state.visit_count {
        Some(n) => format!(" visitors {}", n),
        None => " visitors –".to_string(),
    };
    let who = match state.user_email() {
        Some(email) => Span::styled(format!(" admin {}", email), Style::default().fg(C_ADMIN)),
        None if state.is_admin() => Span::styled(" admin", Style::default().fg(C_ADMIN)),
        None => Span::styled(" guest", Style::default().fg(C_MUTED)),
    };
    vec![
        Line::from(Span::styled(visits, Style::default().fg(C_SECONDARY))),
        Line::from(who),
    ]
}
