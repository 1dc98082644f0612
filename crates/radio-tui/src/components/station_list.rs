//! StationList component: the left pane.  Rows come from the store's
//! display list (sorted, then filtered); the cursor follows a station id so
//! it survives reloads, sort flips and reorders.

use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use radio_core::protocol::{SortMode, Station, StationId};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        parse_hex_color, C_ERROR, C_LOCATION, C_MUTED, C_NUMBER_HINT, C_PAUSED, C_PLAYING,
        C_PRIMARY, C_SECONDARY, C_SELECTION_BG,
    },
    widgets::{
        filter_input::{FilterAction, FilterInput},
        list_cursor::ListCursor,
        pane_chrome::{pane_chrome, Badge},
    },
};

pub struct StationList {
    cursor: ListCursor,
    cursor_id: Option<StationId>,
    pub filter_input: FilterInput,
    list_state: ListState,
    last_click: Option<(usize, Instant)>,
}

impl StationList {
    pub fn new() -> Self {
        Self {
            cursor: ListCursor::default(),
            cursor_id: None,
            filter_input: FilterInput::new("name or city…"),
            list_state: ListState::default(),
            last_click: None,
        }
    }

    pub fn selected_id(&self) -> Option<StationId> {
        self.cursor_id
    }

    /// Put the cursor back on its station after the rows changed.
    fn sync_cursor(&mut self, ids: &[StationId]) {
        if let Some(pos) = self
            .cursor_id
            .and_then(|id| ids.iter().position(|&x| x == id))
        {
            self.cursor.selected = pos;
        }
        self.cursor.clamp(ids.len());
        self.cursor_id = ids.get(self.cursor.selected).copied();
    }

    fn moved(&mut self, ids: &[StationId]) {
        self.cursor_id = ids.get(self.cursor.selected).copied();
    }

    fn follow(&mut self, id: Option<StationId>) {
        if id.is_some() {
            self.cursor_id = id;
        }
    }

    /// Neighbour of the cursor row `delta` rows away, for reordering.
    fn neighbour(&self, ids: &[StationId], delta: isize) -> Option<StationId> {
        let target = self.cursor.selected.checked_add_signed(delta)?;
        ids.get(target).copied()
    }

    fn render_item<'a>(
        &self,
        number: usize,
        station: &'a Station,
        is_selected: bool,
        state: &AppState,
    ) -> ListItem<'a> {
        let selection = state.radio.selection();
        let is_current = selection.current_station_id == Some(station.id);

        let (icon, icon_color) = match (is_current, selection.is_playing) {
            (true, true) => ("▶", C_PLAYING),
            (true, false) => ("⏸", C_PAUSED),
            _ => (" ", C_MUTED),
        };

        let name_color = if is_current {
            icon_color
        } else if is_selected {
            C_PRIMARY
        } else {
            C_SECONDARY
        };
        let mut name_style = Style::default().fg(name_color);
        if is_current || is_selected {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }

        let swatch = parse_hex_color(station.color_or_default()).unwrap_or(C_MUTED);

        let mut spans = vec![
            Span::styled(format!("{:>3} ", number), Style::default().fg(C_NUMBER_HINT)),
            Span::styled(icon, Style::default().fg(icon_color)),
            Span::raw(" "),
            Span::styled("●", Style::default().fg(swatch)),
            Span::raw(" "),
            Span::styled(station.name.as_str(), name_style),
        ];
        if let Some(city) = station.city() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(city, Style::default().fg(C_LOCATION)));
        }

        let bg = if is_selected {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };
        ListItem::new(Line::from(spans)).style(bg)
    }

    fn empty_message(state: &AppState) -> Line<'static> {
        let store = &state.radio.store;
        if !state.radio.loaded {
            return Line::styled("  loading stations…", Style::default().fg(C_MUTED));
        }
        if let Some(err) = &state.load_error {
            if store.is_empty() {
                return Line::styled(
                    format!("  could not load stations: {}", err),
                    Style::default().fg(C_ERROR),
                );
            }
        }
        if !store.query().trim().is_empty() {
            return Line::styled(
                format!("  no station matches \"{}\"", store.query().trim()),
                Style::default().fg(C_MUTED),
            );
        }
        if state.is_admin() {
            Line::styled("  no stations yet, press a to add one", Style::default().fg(C_MUTED))
        } else {
            Line::styled("  no stations yet", Style::default().fg(C_MUTED))
        }
    }
}

impl Default for StationList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StationList {
    fn id(&self) -> ComponentId {
        ComponentId::StationList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let ids = state.radio.store.display_ids();
        self.sync_cursor(&ids);

        if self.filter_input.is_active() {
            match key.code {
                KeyCode::Up => {
                    self.cursor.select_up(1);
                    self.moved(&ids);
                    return vec![];
                }
                KeyCode::Down => {
                    self.cursor.select_down(1, ids.len());
                    self.moved(&ids);
                    return vec![];
                }
                _ => {}
            }
            return match self.filter_input.handle_key(key) {
                FilterAction::Changed(q) => vec![Action::FilterChanged(q)],
                FilterAction::Confirmed => vec![Action::CloseFilter],
                FilterAction::Cancelled => {
                    vec![Action::FilterChanged(String::new()), Action::CloseFilter]
                }
            };
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.cursor.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.select_down(step, ids.len()),
            KeyCode::PageUp => self.cursor.select_up(10),
            KeyCode::PageDown => self.cursor.select_down(10, ids.len()),
            KeyCode::Home | KeyCode::Char('g') => self.cursor.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.cursor.select_last(ids.len()),

            KeyCode::Enter => {
                if let Some(id) = self.cursor_id {
                    return vec![Action::Select(id)];
                }
            }
            KeyCode::Char(' ') => {
                if state.radio.selection().current_station_id.is_some() {
                    return vec![Action::TogglePause];
                } else if let Some(id) = self.cursor_id {
                    return vec![Action::Select(id)];
                }
            }

            KeyCode::Char('/') => {
                self.filter_input.activate();
                return vec![Action::OpenFilter];
            }
            KeyCode::Char('s') => return vec![Action::ToggleSort],
            KeyCode::Char('y') => {
                if let Some(st) = self.cursor_id.and_then(|id| state.radio.store.get(id)) {
                    return vec![Action::CopyToClipboard(st.url.clone())];
                }
            }

            KeyCode::Char('a') => return vec![Action::OpenAddForm],
            KeyCode::Char('e') => {
                if let Some(id) = self.cursor_id {
                    return vec![Action::OpenEditForm(id)];
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.cursor_id {
                    return vec![Action::RequestDelete(id)];
                }
            }
            KeyCode::Char('K') => {
                if let (Some(active), Some(over)) = (self.cursor_id, self.neighbour(&ids, -1)) {
                    return vec![Action::MoveStation { active, over }];
                }
            }
            KeyCode::Char('J') => {
                if let (Some(active), Some(over)) = (self.cursor_id, self.neighbour(&ids, 1)) {
                    return vec![Action::MoveStation { active, over }];
                }
            }
            _ => return vec![],
        }

        self.moved(&ids);
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let ids = state.radio.store.display_ids();
        self.sync_cursor(&ids);
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        match event.kind {
            MouseEventKind::ScrollUp => self.cursor.select_up(1),
            MouseEventKind::ScrollDown => self.cursor.select_down(1, ids.len()),
            MouseEventKind::Down(MouseButton::Left) => {
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);
                if self.cursor.handle_click(rel_row, ids.len()) {
                    self.moved(&ids);
                    if is_double {
                        self.last_click = None;
                        if let Some(id) = self.cursor_id {
                            return vec![Action::Select(id)];
                        }
                    } else {
                        self.last_click = Some((rel_row, now));
                    }
                }
                return vec![];
            }
            _ => return vec![],
        }
        self.moved(&ids);
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            // Keep the cursor on whatever next/prev started playing.
            Action::Next | Action::Prev => {
                self.follow(state.radio.selection().current_station_id);
            }
            Action::FilterChanged(_) => {
                self.cursor.scroll_offset = 0;
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let store = &state.radio.store;
        let badge_text = match store.sort_mode() {
            SortMode::Manual => "manual".to_string(),
            SortMode::Auto => format!("city {}", store.sort_order().arrow()),
        };
        let block = pane_chrome(
            "stations",
            Some('1'),
            focused,
            Some(Badge {
                text: &badge_text,
                color: C_SECONDARY,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_filter = self.filter_input.is_active() || !self.filter_input.is_empty();
        let list_area = if show_filter {
            let filter_area = Rect {
                y: inner.y + inner.height.saturating_sub(1),
                height: inner.height.min(1),
                ..inner
            };
            self.filter_input.draw(frame, filter_area);
            Rect {
                height: inner.height.saturating_sub(1),
                ..inner
            }
        } else {
            inner
        };

        let rows = store.display_list();
        let ids: Vec<StationId> = rows.iter().map(|s| s.id).collect();
        self.sync_cursor(&ids);

        if rows.is_empty() {
            frame.render_widget(Paragraph::new(Self::empty_message(state)), list_area);
            return;
        }

        let height = list_area.height as usize;
        self.cursor.ensure_visible(height);
        let range = self.cursor.visible_range(height, rows.len());
        let sel_in_view = self.cursor.selected.saturating_sub(range.start);

        let items: Vec<ListItem> = rows[range.clone()]
            .iter()
            .enumerate()
            .map(|(i, station)| {
                let row = range.start + i;
                self.render_item(row + 1, station, row == self.cursor.selected, state)
            })
            .collect();

        let list = List::new(items).highlight_style(Style::default());
        self.list_state.select(Some(sel_in_view));
        frame.render_stateful_widget(list, list_area, &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_core::settings::AppSettings;
    use radio_core::state::RadioState;
    use ratatui::crossterm::event::KeyModifiers;

    fn station(id: StationId, name: &str, city: &str) -> Station {
        Station {
            id,
            name: name.to_string(),
            url: format!("https://stream.example/{id}"),
            city: Some(city.to_string()),
            color: None,
            created_at: None,
        }
    }

    fn state() -> AppState {
        let mut radio = RadioState::default();
        radio.load_stations(vec![
            station(1, "Prambors", "Jakarta"),
            station(2, "Suara Surabaya", "Surabaya"),
            station(3, "Sonora", "Bandung"),
        ]);
        AppState::new(radio, AppSettings::default())
    }

    fn press(list: &mut StationList, state: &AppState, code: KeyCode) -> Vec<Action> {
        list.handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    #[test]
    fn test_enter_selects_row_under_cursor() {
        let state = state();
        let mut list = StationList::new();
        press(&mut list, &state, KeyCode::Down);
        let actions = press(&mut list, &state, KeyCode::Enter);
        // Display order is Bandung, Jakarta, Surabaya.
        assert!(matches!(actions.as_slice(), [Action::Select(1)]));
    }

    #[test]
    fn test_reorder_targets_neighbour() {
        let state = state();
        let mut list = StationList::new();
        press(&mut list, &state, KeyCode::Down);
        let up = list.handle_key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT), &state);
        assert!(matches!(up.as_slice(), [Action::MoveStation { active: 1, over: 3 }]));

        press(&mut list, &state, KeyCode::Char('g'));
        let up = list.handle_key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT), &state);
        assert!(up.is_empty());
    }

    #[test]
    fn test_move_up_in_descending_view_swaps_visible_rows() {
        let mut state = state();
        state.radio.toggle_sort();
        assert_eq!(state.radio.store.display_ids(), vec![2, 1, 3]);

        let mut list = StationList::new();
        press(&mut list, &state, KeyCode::Down);
        let up = list.handle_key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT), &state);
        let [Action::MoveStation { active, over }] = up.as_slice() else {
            panic!("expected a move, got {up:?}");
        };
        assert_eq!((*active, *over), (1, 2));

        state.radio.reorder(*active, *over);
        assert_eq!(state.radio.store.display_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_cursor_follows_station_after_sort_flip() {
        let mut state = state();
        let mut list = StationList::new();
        press(&mut list, &state, KeyCode::Down);
        assert_eq!(list.selected_id(), Some(1));

        state.radio.toggle_sort();
        let actions = press(&mut list, &state, KeyCode::Enter);
        assert!(matches!(actions.as_slice(), [Action::Select(1)]));
    }

    #[test]
    fn test_filter_escape_twice_closes() {
        let state = state();
        let mut list = StationList::new();
        let open = press(&mut list, &state, KeyCode::Char('/'));
        assert!(matches!(open.as_slice(), [Action::OpenFilter]));
        let typed = press(&mut list, &state, KeyCode::Char('s'));
        assert!(matches!(typed.as_slice(), [Action::FilterChanged(q)] if q == "s"));
        press(&mut list, &state, KeyCode::Esc);
        let closed = press(&mut list, &state, KeyCode::Esc);
        assert!(matches!(
            closed.as_slice(),
            [Action::FilterChanged(q), Action::CloseFilter] if q.is_empty()
        ));
    }
}
