use crate::playback::{AudioCommand, PlaybackController};
use crate::protocol::{PlaybackSelection, Station, StationId};
use crate::store::StationStore;

/// Root state container: the station store and the playback controller
/// it drives.  Owned by the UI loop; everything else sees snapshots.
#[derive(Debug, Clone)]
pub struct RadioState {
    /// Monotonic revision counter, bumped on every change.
    pub rev: u64,
    pub store: StationStore,
    pub playback: PlaybackController,
    /// Set once the first fetch has completed (successfully or not).
    pub loaded: bool,
}

impl RadioState {
    pub fn new(volume: f32) -> Self {
        Self {
            rev: 1,
            store: StationStore::new(),
            playback: PlaybackController::new(volume),
            loaded: false,
        }
    }

    /// Apply a completed fetch. A selection pointing at a station that is
    /// gone gets cleared.
    pub fn load_stations(&mut self, stations: Vec<Station>) -> Vec<AudioCommand> {
        self.store.load(stations);
        self.loaded = true;
        self.rev += 1;
        let known = self.store.ids();
        self.playback.retain_known(&known)
    }

    pub fn selection(&self) -> PlaybackSelection {
        self.playback.selection()
    }

    pub fn current_station(&self) -> Option<&Station> {
        self.playback.current_id().and_then(|id| self.store.get(id))
    }

    /// Select a station by id (toggle when it is already current).
    pub fn select(&mut self, id: StationId) -> Vec<AudioCommand> {
        let Some(station) = self.store.get(id).cloned() else {
            return Vec::new();
        };
        self.rev += 1;
        self.playback.select(&station)
    }

    pub fn toggle_pause(&mut self) -> Vec<AudioCommand> {
        self.rev += 1;
        self.playback.toggle_pause()
    }

    pub fn stop(&mut self) -> Vec<AudioCommand> {
        self.rev += 1;
        self.playback.stop()
    }

    /// Next over the displayed (sorted + filtered) list.
    pub fn next(&mut self) -> Vec<AudioCommand> {
        self.rev += 1;
        let view = self.store.display_list();
        self.playback.next(&view)
    }

    pub fn previous(&mut self) -> Vec<AudioCommand> {
        self.rev += 1;
        let view = self.store.display_list();
        self.playback.previous(&view)
    }

    pub fn reorder(&mut self, active: StationId, over: StationId) {
        self.rev += 1;
        self.store.reorder(active, over);
    }

    pub fn toggle_sort(&mut self) {
        self.rev += 1;
        self.store.toggle_sort();
    }

    pub fn set_query(&mut self, query: &str) {
        self.rev += 1;
        self.store.set_query(query);
    }
}

impl Default for RadioState {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackState;

    fn st(id: StationId, name: &str) -> Station {
        Station {
            id,
            name: name.to_string(),
            url: format!("http://stream/{id}"),
            city: None,
            color: None,
            created_at: None,
        }
    }

    #[test]
    fn test_deleting_current_station_clears_selection() {
        let mut radio = RadioState::default();
        radio.load_stations(vec![st(1, "A"), st(2, "B")]);
        radio.select(2);
        assert!(radio.selection().is_playing);

        let cmds = radio.load_stations(vec![st(1, "A")]);
        assert_eq!(cmds, vec![AudioCommand::Stop]);
        assert_eq!(radio.selection().current_station_id, None);
        assert!(!radio.selection().is_playing);
    }

    #[test]
    fn test_reload_keeps_surviving_selection() {
        let mut radio = RadioState::default();
        radio.load_stations(vec![st(1, "A"), st(2, "B")]);
        radio.select(1);
        assert!(radio.load_stations(vec![st(1, "A2")]).is_empty());
        assert_eq!(radio.playback.state(), PlaybackState::Playing(1));
        assert_eq!(radio.current_station().map(|s| s.name.as_str()), Some("A2"));
    }

    #[test]
    fn test_next_follows_filtered_view() {
        let mut radio = RadioState::default();
        radio.load_stations(vec![st(1, "Jazz One"), st(2, "Rock"), st(3, "Jazz Two")]);
        radio.set_query("jazz");
        radio.select(1);
        radio.next();
        assert_eq!(radio.playback.current_id(), Some(3));
        radio.next();
        assert_eq!(radio.playback.current_id(), Some(1));
    }

    #[test]
    fn test_select_unknown_id_is_noop() {
        let mut radio = RadioState::default();
        radio.load_stations(vec![st(1, "A")]);
        assert!(radio.select(42).is_empty());
        assert_eq!(radio.playback.state(), PlaybackState::Stopped);
    }
}
