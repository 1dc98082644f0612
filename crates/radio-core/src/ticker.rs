//! Ticker line content: Indonesian clock/date, optional weather, and the
//! scrolling window over it.

use std::time::Duration;

use chrono::{Datelike, Timelike, Weekday};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::config::TickerConfig;

const OPENWEATHER_BASE: &str = "https://api.openweathermap.org";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

const MONTHS: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

/// `Senin, 19 Oktober 2026`
pub fn format_date<D: Datelike>(date: &D) -> String {
    format!(
        "{}, {} {} {}",
        weekday_name(date.weekday()),
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// `14.05.09`
pub fn format_time<T: Timelike>(time: &T) -> String {
    format!(
        "{:02}.{:02}.{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("Cuaca tidak tersedia: API key belum diatur")]
    MissingApiKey,
    #[error("Cuaca tidak tersedia: lokasi tidak diizinkan")]
    NoLocation,
    #[error("Gagal memuat cuaca: {0}")]
    Network(String),
    #[error("Gagal memuat cuaca (HTTP {0})")]
    Api(u16),
    #[error("Lokasi tidak ditemukan")]
    UnknownPlace,
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Network(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub place: String,
    pub description: String,
    pub temp_c: f64,
}

impl WeatherReport {
    pub fn summary(&self) -> String {
        format!("{} {:.0}°C, {}", self.place, self.temp_c, self.description)
    }
}

#[derive(Deserialize)]
struct GeoPlace {
    name: String,
}

#[derive(Deserialize)]
struct WeatherBody {
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    main: WeatherMain,
}

#[derive(Deserialize)]
struct WeatherCondition {
    description: String,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: f64,
}

pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    coords: Option<(f64, f64)>,
}

impl WeatherClient {
    pub fn new(config: &TickerConfig) -> Result<Self, LookupError> {
        Self::with_base_url(config, OPENWEATHER_BASE)
    }

    pub fn with_base_url(config: &TickerConfig, base_url: &str) -> Result<Self, LookupError> {
        let api_key = config.weather_api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(LookupError::MissingApiKey);
        }
        let http = Client::builder().timeout(LOOKUP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            coords: config.latitude.zip(config.longitude),
        })
    }

    /// Coordinates → place name → current weather.  One attempt each.
    pub async fn lookup(&self) -> Result<WeatherReport, LookupError> {
        let (lat, lon) = self.coords.ok_or(LookupError::NoLocation)?;
        let (lat, lon) = (lat.to_string(), lon.to_string());

        let resp = self
            .http
            .get(format!("{}/geo/1.0/reverse", self.base_url))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(LookupError::Api(resp.status().as_u16()));
        }
        let places: Vec<GeoPlace> = resp.json().await?;
        let place = places
            .into_iter()
            .next()
            .map(|p| p.name)
            .ok_or(LookupError::UnknownPlace)?;

        let resp = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", "metric"),
                ("lang", "id"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(LookupError::Api(resp.status().as_u16()));
        }
        let body: WeatherBody = resp.json().await?;
        let description = body
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_default();
        debug!("[ticker] weather for {}: {} {}", place, body.main.temp, description);
        Ok(WeatherReport {
            place,
            description,
            temp_c: body.main.temp,
        })
    }
}

/// Columns scrolled after `elapsed`, for a loop of `cycle_cols` columns that
/// takes `speed_secs` to pass once.
pub fn marquee_offset(cycle_cols: usize, speed_secs: u32, elapsed: Duration) -> usize {
    if cycle_cols == 0 || speed_secs == 0 {
        return 0;
    }
    let cols = elapsed.as_secs_f64() * cycle_cols as f64 / speed_secs as f64;
    (cols as usize) % cycle_cols
}

/// Display width of `text` in terminal columns.
pub fn text_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// A `width`-column window into `text` repeated end to end, starting
/// `offset` columns in.  Wide glyphs cut at the left edge become spaces.
pub fn marquee_window(text: &str, width: usize, offset: usize) -> String {
    let cycle = text_width(text);
    if cycle == 0 || width == 0 {
        return String::new();
    }
    let mut skip = offset % cycle;
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars().cycle() {
        let w = c.width().unwrap_or(0);
        if skip > 0 {
            if w > skip {
                out.extend(std::iter::repeat(' ').take(w - skip));
                used += w - skip;
                skip = 0;
            } else {
                skip -= w;
            }
            continue;
        }
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
        if used == width {
            break;
        }
    }
    out
}
