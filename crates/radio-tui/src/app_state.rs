//! AppState: shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it.  The App event-loop is the only
//! thing that writes to AppState.

use radio_core::session::Session;
use radio_core::settings::AppSettings;
use radio_core::state::RadioState;

use crate::widgets::status_bar::InputMode;

/// What the ticker shows after the clock.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLine {
    Loading,
    Ready(String),
    Unavailable(String),
}

pub struct AppState {
    pub radio: RadioState,
    pub session: Option<Session>,
    pub settings: AppSettings,
    pub online_count: usize,
    pub visit_count: Option<i64>,
    pub weather: WeatherLine,
    /// Inline error from the last failed fetch, cleared by the next success.
    pub load_error: Option<String>,
    /// mpv is up and taking commands.
    pub audio_ready: bool,
    /// mpv reports the stream as idle while we think it is playing.
    pub buffering: bool,
    pub input_mode: InputMode,
}

impl AppState {
    pub fn new(radio: RadioState, settings: AppSettings) -> Self {
        Self {
            radio,
            session: None,
            settings,
            online_count: 0,
            visit_count: None,
            weather: WeatherLine::Loading,
            load_error: None,
            audio_ready: false,
            buffering: false,
            input_mode: InputMode::Normal,
        }
    }

    pub fn is_admin(&self) -> bool {
        radio_core::session::is_admin(self.session.as_ref())
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session.as_ref()?.user.email.as_deref()
    }
}
