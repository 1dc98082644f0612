//! Toast notification system: transient status messages plus spinners for
//! requests still in flight.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Severity::Info => C_TOAST_INFO,
            Severity::Success => C_TOAST_SUCCESS,
            Severity::Warning => C_TOAST_WARNING,
            Severity::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// Handle for a spinner started with [`ToastManager::spinner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinnerId(u64);

struct SpinnerToast {
    id: SpinnerId,
    message: String,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinners: Vec<SpinnerToast>,
    next_spinner: u64,
    frame: usize,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinners: Vec::new(),
            next_spinner: 1,
            frame: 0,
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(5));
    }

    /// Start a spinner that animates until resolved or dismissed.
    pub fn spinner(&mut self, message: impl Into<String>) -> SpinnerId {
        let id = SpinnerId(self.next_spinner);
        self.next_spinner += 1;
        self.spinners.push(SpinnerToast {
            id,
            message: message.into(),
        });
        id
    }

    /// Replace a spinner with a normal expiring toast.
    pub fn resolve_spinner(&mut self, id: SpinnerId, severity: Severity, message: impl Into<String>) {
        self.dismiss_spinner(id);
        let duration = match severity {
            Severity::Error => Duration::from_secs(5),
            _ => Duration::from_secs(3),
        };
        self.push(message, severity, duration);
    }

    pub fn dismiss_spinner(&mut self, id: SpinnerId) {
        self.spinners.retain(|s| s.id != id);
    }

    /// Remove expired toasts and advance the spinner frame. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinners.is_empty()
    }

    /// Render in the top-right corner of `area`, spinners first.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60);
        let bottom = area.y + area.height;

        let spinner_rows = self
            .spinners
            .iter()
            .map(|s| (SPINNER_FRAMES[self.frame], s.message.as_str(), C_TOAST_INFO));
        let toast_rows = self
            .toasts
            .iter()
            .rev()
            .take(self.max_visible)
            .map(|t| (t.severity.icon(), t.message.as_str(), t.severity.color()));

        for (y, (icon, message, color)) in (area.y + 1..bottom).zip(spinner_rows.chain(toast_rows)) {
            let msg_len = message.chars().count() as u16;
            let w = (msg_len + 4).min(max_width).min(area.width);
            let x = area.x + area.width.saturating_sub(w + 1);
            let toast_area = Rect {
                x,
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            let paragraph = Paragraph::new(Line::from(vec![Span::styled(
                format!(" {} {} ", icon, message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]));
            frame.render_widget(paragraph, toast_area);
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolving_one_spinner_keeps_others() {
        let mut toasts = ToastManager::new();
        let a = toasts.spinner("Saving");
        let b = toasts.spinner("Deleting");
        toasts.resolve_spinner(a, Severity::Success, "Saved");
        assert_eq!(toasts.spinners.len(), 1);
        assert_eq!(toasts.spinners[0].id, b);
        assert_eq!(toasts.toasts.len(), 1);

        toasts.dismiss_spinner(b);
        assert!(!toasts.is_empty());
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut toasts = ToastManager::new();
        toasts.info("Copied");
        toasts.info("Copied");
        assert_eq!(toasts.toasts.len(), 1);
    }
}
