use crate::config::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Colours for one theme; views never hardcode colours
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub user: Color,
    pub assistant: Color,
    pub key_fg: Color,
    pub key_bg: Color,
    pub badge_bg: Color,
    pub error: Color,
    pub chip_bg: Color,
}

impl Palette {
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                text: Color::Black,
                muted: Color::Gray,
                border: Color::Gray,
                accent: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
                key_fg: Color::White,
                key_bg: Color::Blue,
                badge_bg: Color::Magenta,
                error: Color::Red,
                chip_bg: Color::LightYellow,
            },
            Theme::Dark => Self {
                text: Color::White,
                muted: Color::DarkGray,
                border: Color::DarkGray,
                accent: Color::Cyan,
                user: Color::Cyan,
                assistant: Color::Magenta,
                key_fg: Color::Black,
                key_bg: Color::Yellow,
                badge_bg: Color::Magenta,
                error: Color::LightRed,
                chip_bg: Color::Yellow,
            },
        }
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn key_style(&self) -> Style {
        Style::default().fg(self.key_fg).bg(self.key_bg)
    }

    pub fn badge_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.badge_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn chip_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.chip_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Highlight for the selected row of a list
    pub fn selected_style(&self, is_selected: bool) -> Style {
        if is_selected {
            Style::default()
                .fg(self.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            self.text_style()
        }
    }
}
