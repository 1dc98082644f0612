//! Appearance settings persisted as a single JSON entry.
//!
//! Reads are forgiving: each leaf of the stored blob is checked on its own and
//! falls back to its default when missing or malformed.  Writes replace the
//! whole value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

pub const MIN_SPEED: u32 = 10;
pub const MAX_SPEED: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    Color,
    Gradient,
    Image,
}

impl BackgroundType {
    pub const ALL: [BackgroundType; 3] = [Self::Color, Self::Gradient, Self::Image];

    pub fn label(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Gradient => "gradient",
            Self::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [Self::Sans, Self::Serif, Self::Mono];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sans => "sans",
            Self::Serif => "serif",
            Self::Mono => "mono",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundSettings {
    #[serde(rename = "type")]
    pub kind: BackgroundType,
    pub color1: String,
    pub color2: String,
    pub image_url: String,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            kind: BackgroundType::Color,
            color1: "#0f172a".to_string(),
            color2: "#1e293b".to_string(),
            image_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTextSettings {
    pub show: bool,
    pub speed: u32,
    pub font_family: FontFamily,
}

impl Default for RunningTextSettings {
    fn default() -> Self {
        Self {
            show: true,
            speed: 30,
            font_family: FontFamily::Sans,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub background: BackgroundSettings,
    pub running_text: RunningTextSettings,
}

impl AppSettings {
    /// Merge a stored blob over the defaults, leaf by leaf.
    pub fn from_value(value: &Value) -> Self {
        let mut out = Self::default();
        let Some(root) = value.as_object() else {
            return out;
        };

        // Early builds stored the background object alone at the top level.
        let background = match root.get("background").and_then(Value::as_object) {
            Some(bg) => Some(bg),
            None if is_legacy_background(root) => Some(root),
            None => None,
        };
        if let Some(bg) = background {
            merge_background(&mut out.background, bg);
        }
        if let Some(rt) = root.get("runningText").and_then(Value::as_object) {
            merge_running_text(&mut out.running_text, rt);
        }
        out
    }
}

fn is_legacy_background(root: &Map<String, Value>) -> bool {
    !root.contains_key("runningText")
        && ["type", "color1", "color2", "imageUrl"]
            .iter()
            .any(|k| root.contains_key(*k))
}

fn merge_background(out: &mut BackgroundSettings, bg: &Map<String, Value>) {
    if let Some(kind) = enum_field::<BackgroundType>(bg, "type") {
        out.kind = kind;
    }
    if let Some(s) = string_field(bg, "color1") {
        out.color1 = s;
    }
    if let Some(s) = string_field(bg, "color2") {
        out.color2 = s;
    }
    if let Some(s) = string_field(bg, "imageUrl") {
        out.image_url = s;
    }
}

fn merge_running_text(out: &mut RunningTextSettings, rt: &Map<String, Value>) {
    if let Some(show) = rt.get("show").and_then(Value::as_bool) {
        out.show = show;
    }
    if let Some(speed) = rt.get("speed").and_then(Value::as_f64) {
        out.speed = clamp_speed(speed.round() as i64);
    }
    if let Some(font) = enum_field::<FontFamily>(rt, "fontFamily") {
        out.font_family = font;
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn enum_field<T: serde::de::DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    map.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

pub fn clamp_speed(speed: i64) -> u32 {
    speed.clamp(MIN_SPEED as i64, MAX_SPEED as i64) as u32
}

/// Owns the current settings and the file they persist to.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: AppSettings,
}

impl SettingsStore {
    /// Load from `path`; absence or a parse failure yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    debug!("[settings] loaded {}", path.display());
                    AppSettings::from_value(&value)
                }
                Err(e) => {
                    warn!("[settings] {} is not valid JSON ({}), using defaults", path.display(), e);
                    AppSettings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[settings] no {} yet, using defaults", path.display());
                AppSettings::default()
            }
            Err(e) => {
                warn!("[settings] failed to read {}: {}", path.display(), e);
                AppSettings::default()
            }
        };
        Self { path, current }
    }

    pub fn current(&self) -> &AppSettings {
        &self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the settings.  The in-memory value is updated even when the
    /// write fails.
    pub fn save(&mut self, mut new: AppSettings) -> anyhow::Result<()> {
        new.running_text.speed = clamp_speed(new.running_text.speed as i64);
        self.current = new;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.path, json)?;
        info!("[settings] saved {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_blob_keeps_other_defaults() {
        let s = AppSettings::from_value(&json!({ "runningText": { "speed": 45 } }));
        let mut expected = AppSettings::default();
        expected.running_text.speed = 45;
        assert_eq!(s, expected);
    }

    #[test]
    fn test_bad_leaves_fall_back_individually() {
        let s = AppSettings::from_value(&json!({
            "background": { "type": "plaid", "color1": "#111111", "color2": 7 },
            "runningText": { "show": "yes", "speed": 500, "fontFamily": "mono" }
        }));
        assert_eq!(s.background.kind, BackgroundType::Color);
        assert_eq!(s.background.color1, "#111111");
        assert_eq!(s.background.color2, "#1e293b");
        assert!(s.running_text.show);
        assert_eq!(s.running_text.speed, MAX_SPEED);
        assert_eq!(s.running_text.font_family, FontFamily::Mono);
    }

    #[test]
    fn test_legacy_top_level_background() {
        let s = AppSettings::from_value(&json!({ "type": "gradient", "color1": "#000000" }));
        assert_eq!(s.background.kind, BackgroundType::Gradient);
        assert_eq!(s.background.color1, "#000000");
        assert_eq!(s.running_text, RunningTextSettings::default());
    }

    #[test]
    fn test_non_object_is_default() {
        assert_eq!(AppSettings::from_value(&json!([1, 2])), AppSettings::default());
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let v = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(v["background"]["type"], "color");
        assert_eq!(v["background"]["imageUrl"], "");
        assert_eq!(v["runningText"]["fontFamily"], "sans");
    }

    #[test]
    fn test_save_then_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app-settings.json");
        let mut store = SettingsStore::open(&path);
        assert_eq!(store.current(), &AppSettings::default());

        let mut next = AppSettings::default();
        next.running_text.font_family = FontFamily::Serif;
        next.running_text.speed = 5;
        store.save(next).unwrap();
        assert_eq!(store.current().running_text.speed, MIN_SPEED);

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.current().running_text.font_family, FontFamily::Serif);
    }

    #[test]
    fn test_failed_write_still_updates_memory() {
        // A directory where the file should be makes the write fail.
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app-settings.json");
        std::fs::create_dir_all(&path).unwrap();
        let mut store = SettingsStore::open(&path);
        let mut next = AppSettings::default();
        next.running_text.show = false;
        assert!(store.save(next).is_err());
        assert!(!store.current().running_text.show);
    }
}
