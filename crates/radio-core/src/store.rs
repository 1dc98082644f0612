//! StationStore: the in-memory station collection and its derived display list.
//!
//! The collection is only ever replaced wholesale by `load()` (fed from a
//! completed remote fetch) or rearranged by `reorder()`.  Search never
//! touches it.  Sorting is applied when the display list is derived, except
//! that the first reorder out of auto mode freezes the sorted order into
//! the collection so the list does not jump.

use std::cmp::Ordering;

use crate::protocol::{SortMode, SortOrder, Station, StationId};

/// Sort key for a station without a city. Sorts after every real city.
const NO_CITY: &str = "\u{10FFFF}";

#[derive(Debug, Clone, Default)]
pub struct StationStore {
    stations: Vec<Station>,
    sort_mode: SortMode,
    sort_order: SortOrder,
    query: String,
}

impl StationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection and go back to auto/ascending.
    pub fn load(&mut self, stations: Vec<Station>) {
        self.stations = stations;
        self.sort_mode = SortMode::Auto;
        self.sort_order = SortOrder::Asc;
    }

    /// Move `active` to the position `over` holds.  Always switches to
    /// manual ordering, starting from the order that was on screen.
    pub fn reorder(&mut self, active: StationId, over: StationId) {
        if self.sort_mode == SortMode::Auto {
            let order = self.sort_order;
            self.stations.sort_by(|a, b| compare_stations(a, b, order));
            self.sort_mode = SortMode::Manual;
        }
        if active == over {
            return;
        }
        let from = self.position(active);
        let to = self.position(over);
        if let (Some(from), Some(to)) = (from, to) {
            array_move(&mut self.stations, from, to);
        }
    }

    pub fn toggle_sort(&mut self) {
        self.sort_mode = SortMode::Auto;
        self.sort_order = self.sort_order.flip();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Underlying collection, in stored order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn get(&self, id: StationId) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: StationId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> Vec<StationId> {
        self.stations.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Sorted (auto) or stored (manual) order, then filtered by the query.
    pub fn display_list(&self) -> Vec<&Station> {
        let mut view: Vec<&Station> = self.stations.iter().collect();
        if self.sort_mode == SortMode::Auto {
            let order = self.sort_order;
            view.sort_by(|a, b| compare_stations(a, b, order));
        }
        view.retain(|s| station_matches(s, &self.query));
        view
    }

    /// Ids of the display list, in display order.
    pub fn display_ids(&self) -> Vec<StationId> {
        self.display_list().iter().map(|s| s.id).collect()
    }

    fn position(&self, id: StationId) -> Option<usize> {
        self.stations.iter().position(|s| s.id == id)
    }
}

/// Remove the element at `from` and reinsert it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

fn city_key(station: &Station) -> String {
    station
        .city()
        .map(str::to_lowercase)
        .unwrap_or_else(|| NO_CITY.to_string())
}

/// City then name, case-insensitive.  Both keys flip together with `order`;
/// stations without a city stay at the end either way.
pub fn compare_stations(a: &Station, b: &Station, order: SortOrder) -> Ordering {
    let (ca, cb) = (city_key(a), city_key(b));
    let (a_none, b_none) = (ca == NO_CITY, cb == NO_CITY);
    if a_none != b_none {
        return a_none.cmp(&b_none);
    }
    let ord = ca
        .cmp(&cb)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Case-insensitive substring match over name and city. A blank query
/// matches everything.
pub fn station_matches(station: &Station, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    station.name.to_lowercase().contains(&q)
        || station
            .city()
            .map(|c| c.to_lowercase().contains(&q))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(id: StationId, city: Option<&str>, name: &str) -> Station {
        Station {
            id,
            name: name.to_string(),
            url: format!("http://stream/{id}"),
            city: city.map(str::to_string),
            color: None,
            created_at: None,
        }
    }

    fn sample() -> Vec<Station> {
        vec![
            st(1, Some("A"), "Z"),
            st(2, Some("A"), "Y"),
            st(3, None, "X"),
        ]
    }

    #[test]
    fn test_auto_ascending_order() {
        let mut store = StationStore::new();
        store.load(sample());
        assert_eq!(store.display_ids(), vec![2, 1, 3]);
    }

    #[test]
    fn test_descending_keeps_missing_city_last() {
        let mut store = StationStore::new();
        store.load(sample());
        store.toggle_sort();
        assert_eq!(store.sort_order(), SortOrder::Desc);
        assert_eq!(store.display_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_city_sorts_as_missing() {
        let mut store = StationStore::new();
        store.load(vec![st(1, Some(""), "A"), st(2, Some("Bandung"), "B")]);
        assert_eq!(store.display_ids(), vec![2, 1]);
    }

    #[test]
    fn test_city_compare_ignores_case() {
        let mut store = StationStore::new();
        store.load(vec![st(1, Some("bandung"), "B"), st(2, Some("Ambon"), "A")]);
        assert_eq!(store.display_ids(), vec![2, 1]);
    }

    #[test]
    fn test_load_resets_sort() {
        let mut store = StationStore::new();
        store.load(sample());
        store.reorder(3, 1);
        store.toggle_sort();
        store.load(sample());
        assert_eq!(store.sort_mode(), SortMode::Auto);
        assert_eq!(store.sort_order(), SortOrder::Asc);
    }

    #[test]
    fn test_reorder_moves_in_collection() {
        let mut store = StationStore::new();
        store.load(sample());
        // Shown as [2, 1, 3]; 3 takes the slot 1 had.
        store.reorder(3, 1);
        assert_eq!(store.sort_mode(), SortMode::Manual);
        assert_eq!(store.ids(), vec![2, 3, 1]);
        assert_eq!(store.display_ids(), vec![2, 3, 1]);
    }

    #[test]
    fn test_reorder_starts_from_descending_view() {
        let mut store = StationStore::new();
        store.load(vec![
            st(1, Some("A"), "One"),
            st(2, Some("B"), "Two"),
            st(3, Some("C"), "Three"),
        ]);
        store.toggle_sort();
        assert_eq!(store.display_ids(), vec![3, 2, 1]);

        // Second row moves up one.
        store.reorder(2, 3);
        assert_eq!(store.sort_mode(), SortMode::Manual);
        assert_eq!(store.display_ids(), vec![2, 3, 1]);
    }

    #[test]
    fn test_reorder_under_filter_moves_within_full_list() {
        let mut store = StationStore::new();
        store.load(vec![
            st(1, Some("Bandung"), "Sonora"),
            st(2, Some("Jakarta"), "Prambors"),
            st(3, Some("Bandung"), "Ardan"),
        ]);
        store.set_query("bandung");
        assert_eq!(store.display_ids(), vec![3, 1]);
        store.reorder(1, 3);
        assert_eq!(store.display_ids(), vec![1, 3]);
        store.set_query("");
        assert_eq!(store.display_ids(), vec![1, 3, 2]);
    }

    #[test]
    fn test_reorder_unknown_or_same_id_is_noop() {
        let mut store = StationStore::new();
        store.load(sample());
        store.reorder(1, 99);
        // Only the shown order is frozen.
        assert_eq!(store.ids(), vec![2, 1, 3]);
        store.reorder(2, 2);
        assert_eq!(store.ids(), vec![2, 1, 3]);
        assert_eq!(store.display_ids(), vec![2, 1, 3]);
        assert_eq!(store.sort_mode(), SortMode::Manual);
    }

    #[test]
    fn test_toggle_sort_leaves_manual() {
        let mut store = StationStore::new();
        store.load(sample());
        store.reorder(1, 3);
        store.toggle_sort();
        assert_eq!(store.sort_mode(), SortMode::Auto);
    }

    #[test]
    fn test_search_name_and_city() {
        let mut store = StationStore::new();
        store.load(vec![
            st(1, Some("Tasikmalaya"), "Radio Dakwah"),
            st(2, Some("Bandung"), "Prambors"),
            st(3, None, "Tasik FM"),
        ]);
        store.set_query("TASIK");
        assert_eq!(store.display_ids(), vec![1, 3]);
        store.set_query("  ");
        assert_eq!(store.display_ids().len(), 3);
        // filtering leaves the collection alone
        assert_eq!(store.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_array_move_bounds() {
        let mut v = vec![1, 2, 3];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec![2, 3, 1]);
        array_move(&mut v, 5, 0);
        assert_eq!(v, vec![2, 3, 1]);
    }
}
