use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Hosted backend project.  `url` and `anon_key` can also come from the
/// `SUPABASE_URL` / `SUPABASE_ANON_KEY` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_realtime_channel")]
    pub realtime_channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
}

/// Weather line of the ticker.  Without an API key or coordinates the
/// ticker shows the clock and an inline notice only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    #[serde(default)]
    pub weather_api_key: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_refresh_mins")]
    pub refresh_mins: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Appearance settings JSON.  Defaults to `<data_dir>/app-settings.json`.
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: default_table(),
            realtime_channel: default_realtime_channel(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            weather_api_key: String::new(),
            latitude: None,
            longitude: None,
            refresh_mins: default_refresh_mins(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
        }
    }
}

fn default_table() -> String {
    "stations".to_string()
}

fn default_realtime_channel() -> String {
    "online-users".to_string()
}

fn default_volume() -> f32 {
    0.5
}

fn default_refresh_mins() -> u64 {
    30
}

fn default_settings_file() -> PathBuf {
    platform::data_dir().join("app-settings.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            config
        } else {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Non-empty `SUPABASE_URL` / `SUPABASE_ANON_KEY` win over the file.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SUPABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.supabase.url = url;
        }
        if let Some(key) = var("SUPABASE_ANON_KEY").filter(|v| !v.trim().is_empty()) {
            self.supabase.anon_key = key;
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.supabase.table, "stations");
        assert!(config.supabase.url.is_empty());
        assert_eq!(config.audio.default_volume, 0.5);
        assert_eq!(config.ticker.refresh_mins, 30);
        assert!(config
            .paths
            .settings_file
            .ends_with("radioplay/app-settings.json"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [supabase]
            url = "https://abc.supabase.co"

            [ticker]
            latitude = -6.2
            "#,
        )
        .unwrap();
        assert_eq!(config.supabase.url, "https://abc.supabase.co");
        assert_eq!(config.supabase.realtime_channel, "online-users");
        assert_eq!(config.ticker.latitude, Some(-6.2));
        assert_eq!(config.ticker.longitude, None);
        assert_eq!(config.audio.default_volume, 0.5);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.supabase.url = "https://file.example".into();
        config.apply_env(|name| match name {
            "SUPABASE_ANON_KEY" => Some("env-key".to_string()),
            "SUPABASE_URL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.supabase.url, "https://file.example");
        assert_eq!(config.supabase.anon_key, "env-key");
    }
}
