//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

use crate::config::ThemeSetting;

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Score-based colors (share of the 0-100 scale)
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,
    pub bar_empty: Color,

    // Form colors
    pub row_alt_bg: Color,
    pub section_color: Color,
    pub row_selected: Style,
    pub header_style: Style,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,

    // Load failure banner
    pub banner_bg: Color,
    pub banner_fg: Color,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            score_high: Color::Green,
            score_mid: Color::Yellow,
            score_low: Color::Red,
            bar_empty: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            section_color: Color::Cyan,
            row_selected: Style::new().reversed(),
            header_style: Style::new().bold(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            banner_bg: Color::Rgb(120, 80, 0),
            banner_fg: Color::White,
        }
    }

    pub fn light() -> Self {
        Self {
            score_high: Color::Rgb(0, 128, 0),
            score_mid: Color::Rgb(170, 110, 0),
            score_low: Color::Rgb(180, 0, 0),
            bar_empty: Color::Indexed(250),
            row_alt_bg: Color::Indexed(254),
            section_color: Color::Blue,
            row_selected: Style::new().reversed(),
            header_style: Style::new().bold(),
            muted: Color::DarkGray,
            title_color: Color::Blue,
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Rgb(0, 128, 0),
            flash_error: Color::Rgb(180, 0, 0),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            banner_bg: Color::Rgb(255, 230, 160),
            banner_fg: Color::Black,
        }
    }

    /// Returns the color for a normalized score (0-100)
    pub fn score_color(&self, normalized: f64) -> Color {
        if normalized >= 70.0 {
            self.score_high
        } else if normalized >= 40.0 {
            self.score_mid
        } else {
            self.score_low
        }
    }
}

/// Pick a palette. `Auto` asks the terminal for its background luminance
/// and falls back to dark when it cannot tell.
pub fn resolve_theme(setting: ThemeSetting) -> ThemeColors {
    match setting {
        ThemeSetting::Dark => ThemeColors::dark(),
        ThemeSetting::Light => ThemeColors::light(),
        ThemeSetting::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => ThemeColors::light(),
            _ => ThemeColors::dark(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_color_thresholds() {
        let theme = ThemeColors::dark();
        assert_eq!(theme.score_color(100.0), Color::Green);
        assert_eq!(theme.score_color(70.0), Color::Green);
        assert_eq!(theme.score_color(55.0), Color::Yellow);
        assert_eq!(theme.score_color(10.0), Color::Red);
    }

    #[test]
    fn test_explicit_settings() {
        assert_eq!(resolve_theme(ThemeSetting::Light).title_color, Color::Blue);
        assert_eq!(resolve_theme(ThemeSetting::Dark).title_color, Color::Cyan);
    }
}
