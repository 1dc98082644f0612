//! HelpOverlay component: centered popup with keyboard shortcut reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ADMIN, C_MUTED, C_PANEL_BORDER, C_PRIMARY, C_SECONDARY},
};

use super::centered_rect;

pub struct HelpOverlay;

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => vec![Action::CloseOverlay],
            // Consume everything else while open.
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let admin = state.is_admin();
        let mut lines: Vec<Line> = vec![
            Line::from(Span::styled(
                " keyboard shortcuts",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section(" playback"),
            help_row("enter", "play selected station, again to pause"),
            help_row("space", "pause / resume"),
            help_row("x", "stop"),
            help_row("n / p", "next / previous in the shown list"),
            help_row("← / →  or  - / +", "volume down / up"),
            help_row("m", "mute"),
            Line::from(""),
            section(" list"),
            help_row("↑ / ↓  or  j / k", "move selection"),
            help_row("home / end  or  g / G", "jump first / last"),
            help_row("/", "search name or city (Esc clears + closes)"),
            help_row("s", "sort by city, flip direction"),
            help_row("y", "copy stream url"),
            help_row("tab", "switch pane"),
            help_row("r", "reload stations"),
            Line::from(""),
            section(" account"),
            help_row("L", if admin { "sign out" } else { "sign in" }),
        ];
        if admin {
            lines.extend([
                Line::from(""),
                Line::from(Span::styled(
                    " admin",
                    Style::default().fg(C_ADMIN).add_modifier(Modifier::BOLD),
                )),
                help_row("a", "add station"),
                help_row("e", "edit selected station"),
                help_row("d", "delete selected station"),
                help_row("K / J", "move selected station up / down"),
                help_row("S", "appearance settings"),
            ]);
        }
        lines.extend([
            Line::from(""),
            help_row("?", "toggle this help"),
            help_row("q / Ctrl+C", "quit"),
            Line::from(""),
            Line::from(Span::styled(" press ? or esc to close", Style::default().fg(C_MUTED))),
        ]);

        let popup = centered_rect(64, lines.len() as u16 + 2, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER))
                        .style(Style::default().bg(ratatui::style::Color::Rgb(18, 18, 26))),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
    ))
}

fn help_row<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<22}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}
