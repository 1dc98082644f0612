//! Action enum: all user-initiated intents and internal events.

use radio_core::protocol::{Station, StationDraft, StationId};
use radio_core::settings::AppSettings;

/// Unique identifier for a focusable component or overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    StationList,
    NowPlaying,
    Ticker,
    HelpOverlay,
    StationForm,
    LoginForm,
    SettingsSheet,
    ConfirmDelete,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    /// Play a station, or toggle it when it is already current.
    Select(StationId),
    TogglePause,
    Stop,
    Next,
    Prev,
    Volume(f32),
    Mute,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPane(ComponentId),

    // ── Station list ─────────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,
    FilterChanged(String),
    ToggleSort,
    /// Move `active` to the position `over` currently holds.
    MoveStation { active: StationId, over: StationId },
    CopyToClipboard(String),

    // ── Admin ────────────────────────────────────────────────────────────────
    OpenAddForm,
    OpenEditForm(StationId),
    SubmitStation {
        editing: Option<Station>,
        draft: StationDraft,
    },
    RequestDelete(StationId),
    ConfirmDelete(StationId),
    OpenSettings,
    SaveSettings(AppSettings),

    // ── Session ──────────────────────────────────────────────────────────────
    OpenLogin,
    SubmitLogin { email: String, password: String },
    Logout,

    // ── Application ──────────────────────────────────────────────────────────
    ToggleHelp,
    CloseOverlay,
    Reload,
    Quit,
}

impl Action {
    /// Actions only a signed-in session may run.
    pub fn needs_admin(&self) -> bool {
        matches!(
            self,
            Action::MoveStation { .. }
                | Action::OpenAddForm
                | Action::OpenEditForm(_)
                | Action::SubmitStation { .. }
                | Action::RequestDelete(_)
                | Action::ConfirmDelete(_)
                | Action::OpenSettings
                | Action::SaveSettings(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gate_covers_mutations_only() {
        assert!(Action::OpenAddForm.needs_admin());
        assert!(Action::ConfirmDelete(3).needs_admin());
        assert!(Action::MoveStation { active: 1, over: 2 }.needs_admin());
        assert!(Action::OpenSettings.needs_admin());

        assert!(!Action::Select(1).needs_admin());
        assert!(!Action::ToggleSort.needs_admin());
        assert!(!Action::FilterChanged("x".into()).needs_admin());
        assert!(!Action::OpenLogin.needs_admin());
        assert!(!Action::CopyToClipboard("u".into()).needs_admin());
    }
}
