// Colors and styles for both dashboard themes.
// "System" follows the dark palette; terminals do not report their scheme.

use pulseboard_core::models::{TaskStatus, Theme};
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg_app: Color,
    pub bg_sidebar: Color,
    pub bg_selected: Color,
    pub bg_modal: Color,
    pub text_primary: Color,
    pub text_muted: Color,
    pub text_dim: Color,
    pub accent_primary: Color,
    pub accent_success: Color,
    pub accent_warning: Color,
    pub accent_error: Color,
    pub border: Color,
}

// =============================================================================
// DARK - near-black background, muted accents
// =============================================================================

pub const DARK: Palette = Palette {
    bg_app: Color::Rgb(0, 0, 0),
    bg_sidebar: Color::Rgb(12, 12, 12),
    bg_selected: Color::Rgb(32, 32, 32),
    bg_modal: Color::Rgb(18, 18, 18),
    text_primary: Color::Rgb(220, 220, 220),
    text_muted: Color::Rgb(128, 128, 128),
    text_dim: Color::Rgb(90, 90, 90),
    accent_primary: Color::Rgb(86, 156, 214),
    accent_success: Color::Rgb(106, 153, 85),
    accent_warning: Color::Rgb(206, 145, 120),
    accent_error: Color::Rgb(244, 112, 112),
    border: Color::Rgb(60, 60, 60),
};

// =============================================================================
// LIGHT
// =============================================================================

pub const LIGHT: Palette = Palette {
    bg_app: Color::Rgb(250, 250, 250),
    bg_sidebar: Color::Rgb(240, 240, 242),
    bg_selected: Color::Rgb(225, 228, 235),
    bg_modal: Color::Rgb(255, 255, 255),
    text_primary: Color::Rgb(30, 30, 30),
    text_muted: Color::Rgb(100, 100, 100),
    text_dim: Color::Rgb(150, 150, 150),
    accent_primary: Color::Rgb(37, 99, 235),
    accent_success: Color::Rgb(22, 128, 61),
    accent_warning: Color::Rgb(180, 83, 9),
    accent_error: Color::Rgb(200, 40, 40),
    border: Color::Rgb(200, 200, 200),
};

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => LIGHT,
        Theme::Dark | Theme::System => DARK,
    }
}

impl Palette {
    pub fn text(&self) -> Style {
        Style::default().fg(self.text_primary)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    pub fn heading(&self) -> Style {
        Style::default()
            .fg(self.accent_primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default().bg(self.bg_selected).fg(self.text_primary)
    }

    pub fn status_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Pending => self.text_muted,
            TaskStatus::InProgress => self.accent_warning,
            TaskStatus::Completed => self.accent_success,
        }
    }
}

pub fn status_glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::InProgress => "◐",
        TaskStatus::Completed => "●",
    }
}

/// Parse a `#rrggbb` profile color
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#3b82f6"), Some(Color::Rgb(59, 130, 246)));
        assert_eq!(hex_color("3b82f6"), None);
        assert_eq!(hex_color("#fff"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_system_uses_dark() {
        assert_eq!(palette(Theme::System), DARK);
        assert_eq!(palette(Theme::Light), LIGHT);
    }
}
