//! Color palette and style constants for the radio TUI.

use ratatui::style::{Color, Modifier, Style};

use radio_core::settings::{AppSettings, BackgroundType, FontFamily};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_PAUSED: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_NUMBER_HINT: Color = Color::Rgb(90, 90, 115);
pub const C_FILTER_BG: Color = Color::Rgb(20, 20, 32);
pub const C_FILTER_FG: Color = Color::Rgb(255, 200, 80);
pub const C_LOCATION: Color = Color::Rgb(100, 160, 130);
pub const C_ADMIN: Color = Color::Rgb(180, 120, 220);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_MODE_NORMAL: Color = Color::Rgb(115, 115, 138);
pub const C_MODE_FILTER: Color = Color::Rgb(255, 200, 80);
pub const C_MODE_FORM: Color = Color::Rgb(120, 100, 200);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_error() -> Style {
    Style::default().fg(C_ERROR)
}

// ── User appearance settings ──────────────────────────────────────────────────

/// `#rrggbb` or `#rgb` into a terminal color.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        3 => {
            let (r, g, b) = (channel(0, 1)?, channel(1, 1)?, channel(2, 1)?);
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

/// Body and ticker backgrounds from the appearance settings.  A terminal
/// cannot paint images, so the image mode keeps the first color.
pub fn backdrop(settings: &AppSettings) -> (Color, Color) {
    let bg = &settings.background;
    let first = parse_hex_color(&bg.color1).unwrap_or(Color::Reset);
    let second = match bg.kind {
        BackgroundType::Gradient => parse_hex_color(&bg.color2).unwrap_or(first),
        BackgroundType::Color | BackgroundType::Image => first,
    };
    (first, second)
}

/// Terminals have one font, so the family maps to a text modifier.
pub fn font_modifier(family: FontFamily) -> Modifier {
    match family {
        FontFamily::Sans => Modifier::empty(),
        FontFamily::Serif => Modifier::ITALIC,
        FontFamily::Mono => Modifier::BOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ef4444"), Some(Color::Rgb(0xef, 0x44, 0x44)));
        assert_eq!(parse_hex_color(" #FFF "), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("ef4444"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_gradient_uses_second_color() {
        let mut settings = AppSettings::default();
        let (a, b) = backdrop(&settings);
        assert_eq!(a, b);

        settings.background.kind = BackgroundType::Gradient;
        settings.background.color2 = "#000000".into();
        let (_, b) = backdrop(&settings);
        assert_eq!(b, Color::Rgb(0, 0, 0));
    }
}
