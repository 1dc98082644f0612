//! Behavioural properties of the station list and playback navigation,
//! exercised through the public `RadioState` surface.

use radio_core::protocol::{SortMode, SortOrder, Station, StationId};
use radio_core::settings::AppSettings;
use radio_core::state::RadioState;

fn station(id: StationId, name: &str, city: Option<&str>) -> Station {
    Station {
        id,
        name: name.to_string(),
        url: format!("https://stream.example/{id}"),
        city: city.map(str::to_string),
        color: None,
        created_at: None,
    }
}

fn catalog() -> Vec<Station> {
    vec![
        station(1, "Prambors", Some("Jakarta")),
        station(2, "Suara Surabaya", Some("Surabaya")),
        station(3, "Gen FM", Some("Jakarta")),
        station(4, "Radio Online", None),
        station(5, "Sonora", Some("bandung")),
    ]
}

#[test]
fn auto_ascending_orders_by_city_then_name_with_missing_city_last() {
    let mut radio = RadioState::default();
    radio.load_stations(vec![
        station(1, "A", Some("Z")),
        station(2, "A", Some("Y")),
        station(3, "X", None),
    ]);
    assert_eq!(radio.store.display_ids(), vec![2, 1, 3]);
}

#[test]
fn missing_city_stays_last_when_descending() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    radio.toggle_sort();
    assert_eq!(radio.store.sort_order(), SortOrder::Desc);
    assert_eq!(radio.store.display_ids(), vec![2, 1, 3, 5, 4]);
}

#[test]
fn toggling_sort_twice_restores_display() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    let before = radio.store.display_ids();
    radio.toggle_sort();
    assert_ne!(radio.store.display_ids(), before);
    radio.toggle_sort();
    assert_eq!(radio.store.display_ids(), before);
}

#[test]
fn adjacent_reorder_is_reversible_and_sets_manual() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    let before = radio.store.display_ids();
    assert_eq!(before, vec![5, 3, 1, 2, 4]);

    // 1 and 2 sit next to each other on screen.
    radio.reorder(2, 1);
    assert_eq!(radio.store.sort_mode(), SortMode::Manual);
    assert_eq!(radio.store.display_ids(), vec![5, 3, 2, 1, 4]);

    radio.reorder(1, 2);
    assert_eq!(radio.store.sort_mode(), SortMode::Manual);
    assert_eq!(radio.store.display_ids(), before);
}

#[test]
fn manual_order_survives_until_sort_toggle_or_reload() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    radio.reorder(4, 5);
    assert_eq!(radio.store.display_ids(), vec![4, 5, 3, 1, 2]);

    radio.toggle_sort();
    assert_eq!(radio.store.sort_mode(), SortMode::Auto);

    radio.reorder(4, 4);
    assert_eq!(radio.store.sort_mode(), SortMode::Manual);

    radio.load_stations(catalog());
    assert_eq!(radio.store.sort_mode(), SortMode::Auto);
    assert_eq!(radio.store.sort_order(), SortOrder::Asc);
}

#[test]
fn search_is_idempotent_and_leaves_collection_alone() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    radio.set_query("  JAKARTA ");
    let once = radio.store.display_ids();
    radio.set_query("  JAKARTA ");
    assert_eq!(radio.store.display_ids(), once);
    assert_eq!(once, vec![3, 1]);
    assert_eq!(radio.store.len(), 5);

    radio.set_query("");
    assert_eq!(radio.store.display_ids().len(), 5);
}

#[test]
fn next_len_times_returns_to_start() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    let start = radio.store.display_ids()[2];
    radio.select(start);
    for _ in 0..radio.store.len() {
        radio.next();
        assert!(radio.selection().is_playing);
    }
    assert_eq!(radio.selection().current_station_id, Some(start));
}

#[test]
fn deleting_current_station_clears_selection() {
    let mut radio = RadioState::default();
    radio.load_stations(catalog());
    radio.select(3);
    let remaining: Vec<Station> = catalog().into_iter().filter(|s| s.id != 3).collect();
    radio.load_stations(remaining);
    let sel = radio.selection();
    assert_eq!(sel.current_station_id, None);
    assert!(!sel.is_playing);
}

#[test]
fn settings_merge_keeps_untouched_fields() {
    let blob = serde_json::json!({ "runningText": { "speed": 45 } });
    let merged = AppSettings::from_value(&blob);
    let defaults = AppSettings::default();
    assert_eq!(merged.running_text.speed, 45);
    assert_eq!(merged.running_text.show, defaults.running_text.show);
    assert_eq!(merged.running_text.font_family, defaults.running_text.font_family);
    assert_eq!(merged.background, defaults.background);
}
