use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned primary key of a station row.
pub type StationId = i64;

/// Swatch used when a station row carries no color.
pub const DEFAULT_STATION_COLOR: &str = "#e2e8f0";

/// One row of the `stations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Stream endpoint handed to the audio output as-is.
    pub url: String,
    #[serde(default)]
    pub city: Option<String>,
    /// Hex color, e.g. `#ef4444`.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Station {
    /// City with blank values treated as missing.
    pub fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn color_or_default(&self) -> &str {
        self.color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_STATION_COLOR)
    }

    /// Editable columns of this row, as sent by update-by-id.
    pub fn to_patch(&self) -> StationPatch {
        StationPatch {
            name: self.name.clone(),
            url: self.url.clone(),
            color: self.color.clone(),
            city: self.city().map(str::to_string),
        }
    }
}

/// Input for a new station. The server assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDraft {
    pub name: String,
    pub url: String,
    pub city: Option<String>,
    pub color: Option<String>,
}

/// Why a draft was rejected before it reached the table API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("station name is required")]
    MissingName,
    #[error("stream URL is required")]
    MissingUrl,
}

impl StationDraft {
    /// Build a draft from raw form fields: trims everything, maps a blank
    /// city to `None` and a blank color to the default swatch.
    pub fn from_fields(name: &str, url: &str, city: &str, color: &str) -> Result<Self, DraftError> {
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        if url.is_empty() {
            return Err(DraftError::MissingUrl);
        }
        let city = Some(city.trim()).filter(|c| !c.is_empty()).map(str::to_string);
        let color = Some(color.trim())
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_STATION_COLOR)
            .to_string();
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            city,
            color: Some(color),
        })
    }

    /// Apply these fields to an existing row, keeping its identity.
    pub fn apply_to(&self, station: &Station) -> Station {
        Station {
            id: station.id,
            name: self.name.clone(),
            url: self.url.clone(),
            city: self.city.clone(),
            color: self.color.clone(),
            created_at: station.created_at,
        }
    }
}

/// Partial update payload for update-by-id. Only these columns are patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPatch {
    pub name: String,
    pub url: String,
    pub color: Option<String>,
    pub city: Option<String>,
}

/// How the displayed list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Comparator-driven (city, then name).
    #[default]
    Auto,
    /// Frozen at the order left by the last reorder.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// PostgREST order direction keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

/// `{ currentStationId, isPlaying }` as seen by the station list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSelection {
    pub current_station_id: Option<StationId>,
    pub is_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_deserializes_table_row() {
        let row = r##"{"id":7,"name":"Lofi","url":"https://x/lofi","city":null,"color":"#ef4444","created_at":"2024-05-01T10:00:00+00:00"}"##;
        let station: Station = serde_json::from_str(row).unwrap();
        assert_eq!(station.id, 7);
        assert_eq!(station.city(), None);
        assert_eq!(station.color_or_default(), "#ef4444");
        assert!(station.created_at.is_some());
    }

    #[test]
    fn test_station_missing_optional_columns() {
        let station: Station = serde_json::from_str(r#"{"id":1,"name":"A","url":"u"}"#).unwrap();
        assert_eq!(station.color_or_default(), DEFAULT_STATION_COLOR);
        assert!(station.created_at.is_none());
    }

    #[test]
    fn test_blank_city_is_missing() {
        let station = Station {
            id: 1,
            name: "A".into(),
            url: "u".into(),
            city: Some("   ".into()),
            color: None,
            created_at: None,
        };
        assert_eq!(station.city(), None);
        assert_eq!(station.to_patch().city, None);
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(
            StationDraft::from_fields(" ", "u", "", ""),
            Err(DraftError::MissingName)
        );
        assert_eq!(
            StationDraft::from_fields("n", "  ", "", ""),
            Err(DraftError::MissingUrl)
        );
        let draft = StationDraft::from_fields(" Jazz ", " http://s ", "  ", "").unwrap();
        assert_eq!(draft.name, "Jazz");
        assert_eq!(draft.url, "http://s");
        assert_eq!(draft.city, None);
        assert_eq!(draft.color.as_deref(), Some(DEFAULT_STATION_COLOR));
    }

    #[test]
    fn test_sort_order_flip() {
        assert_eq!(SortOrder::Asc.flip(), SortOrder::Desc);
        assert_eq!(SortOrder::Asc.flip().flip(), SortOrder::Asc);
        assert_eq!(SortOrder::Desc.as_str(), "desc");
    }
}
