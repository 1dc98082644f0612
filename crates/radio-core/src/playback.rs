//! Playback controller: selection state machine plus volume/mute.
//!
//! The controller never touches the audio output itself.  Every transition
//! returns the `AudioCommand`s the single audio output must apply, in order.
//!
//! ```text
//!   Stopped ──select(s)──▶ Playing(s) ──select(s)──▶ Paused(s)
//!      ▲                      │  ▲                      │
//!      └──────stop()──────────┘  └──────select(s)───────┘
//!   select(t), t != s  : any ──▶ Playing(t)   (source replaced)
//! ```

use crate::protocol::{PlaybackSelection, Station, StationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing(StationId),
    Paused(StationId),
}

impl PlaybackState {
    pub fn station_id(self) -> Option<StationId> {
        match self {
            Self::Stopped => None,
            Self::Playing(id) | Self::Paused(id) => Some(id),
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing(_))
    }
}

/// Instructions for the audio output.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Replace the source and start playing it.
    Load { url: String },
    Pause,
    Resume,
    Stop,
    /// Effective output level, 0.0..=1.0.
    SetVolume(f32),
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    state: PlaybackState,
    volume: f32,
    muted: bool,
}

impl PlaybackController {
    pub fn new(volume: f32) -> Self {
        Self {
            state: PlaybackState::Stopped,
            volume: volume.clamp(0.0, 1.0),
            muted: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn selection(&self) -> PlaybackSelection {
        PlaybackSelection {
            current_station_id: self.state.station_id(),
            is_playing: self.state.is_playing(),
        }
    }

    pub fn current_id(&self) -> Option<StationId> {
        self.state.station_id()
    }

    /// Same station toggles play/pause, any other station starts playing.
    pub fn select(&mut self, station: &Station) -> Vec<AudioCommand> {
        match self.state {
            PlaybackState::Playing(id) if id == station.id => {
                self.state = PlaybackState::Paused(id);
                vec![AudioCommand::Pause]
            }
            PlaybackState::Paused(id) if id == station.id => {
                self.state = PlaybackState::Playing(id);
                vec![AudioCommand::Resume]
            }
            _ => self.start(station),
        }
    }

    /// Force `station` into Playing without the toggle rule.
    pub fn play(&mut self, station: &Station) -> Vec<AudioCommand> {
        match self.state {
            PlaybackState::Playing(id) if id == station.id => Vec::new(),
            PlaybackState::Paused(id) if id == station.id => {
                self.state = PlaybackState::Playing(id);
                vec![AudioCommand::Resume]
            }
            _ => self.start(station),
        }
    }

    /// Pause or resume whatever is current. No-op when stopped.
    pub fn toggle_pause(&mut self) -> Vec<AudioCommand> {
        match self.state {
            PlaybackState::Playing(id) => {
                self.state = PlaybackState::Paused(id);
                vec![AudioCommand::Pause]
            }
            PlaybackState::Paused(id) => {
                self.state = PlaybackState::Playing(id);
                vec![AudioCommand::Resume]
            }
            PlaybackState::Stopped => Vec::new(),
        }
    }

    pub fn stop(&mut self) -> Vec<AudioCommand> {
        if self.state == PlaybackState::Stopped {
            return Vec::new();
        }
        self.state = PlaybackState::Stopped;
        vec![AudioCommand::Stop]
    }

    /// Step forward through `view`, wrapping. No-op on an empty view.
    pub fn next(&mut self, view: &[&Station]) -> Vec<AudioCommand> {
        if view.is_empty() {
            return Vec::new();
        }
        let len = view.len();
        let target = match self.index_in(view) {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.play(view[target])
    }

    /// Step backward through `view`, wrapping. No-op on an empty view.
    pub fn previous(&mut self, view: &[&Station]) -> Vec<AudioCommand> {
        if view.is_empty() {
            return Vec::new();
        }
        let len = view.len();
        let target = match self.index_in(view) {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.play(view[target])
    }

    /// Clear the selection if its station is no longer known.
    pub fn retain_known(&mut self, known: &[StationId]) -> Vec<AudioCommand> {
        match self.state.station_id() {
            Some(id) if !known.contains(&id) => self.stop(),
            _ => Vec::new(),
        }
    }

    /// The output could not start the stream. Keeps the station selected.
    pub fn playback_failed(&mut self) {
        if let PlaybackState::Playing(id) = self.state {
            self.state = PlaybackState::Paused(id);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> Vec<AudioCommand> {
        self.volume = volume.clamp(0.0, 1.0);
        vec![AudioCommand::SetVolume(self.effective_volume())]
    }

    pub fn adjust_volume(&mut self, delta: f32) -> Vec<AudioCommand> {
        self.set_volume(self.volume + delta)
    }

    pub fn toggle_mute(&mut self) -> Vec<AudioCommand> {
        self.muted = !self.muted;
        vec![AudioCommand::SetVolume(self.effective_volume())]
    }

    fn start(&mut self, station: &Station) -> Vec<AudioCommand> {
        self.state = PlaybackState::Playing(station.id);
        vec![
            AudioCommand::Load {
                url: station.url.clone(),
            },
            AudioCommand::SetVolume(self.effective_volume()),
        ]
    }

    fn index_in(&self, view: &[&Station]) -> Option<usize> {
        let id = self.state.station_id()?;
        view.iter().position(|s| s.id == id)
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(0.5)
    }
}
