#![forbid(unsafe_code)]

use crate::console::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub screen_fg: Color,
    pub screen_bg: Color,
    pub title_fg: Color,
    pub title_bg: Color,
    pub panel_bg: Color,
    pub panel_border_active: Color,
    pub panel_border_inactive: Color,
    pub header_fg: Color,
    pub file_fg_active: Color,
    pub file_fg_inactive: Color,
    pub button_key_fg: Color,
    pub button_fg: Color,
    pub log_fg: Color,
    pub log_bg: Color,
    pub dialog_fg: Color,
    pub dialog_bg: Color,
    pub viewer_fg: Color,
    pub viewer_bg: Color,
}

impl ThemeColors {
    pub fn classic() -> Self {
        Self {
            screen_fg: Color::LightGray,
            screen_bg: Color::Blue,
            title_fg: Color::Black,
            title_bg: Color::Cyan,
            panel_bg: Color::Blue,
            panel_border_active: Color::LightCyan,
            panel_border_inactive: Color::DarkGray,
            header_fg: Color::Yellow,
            file_fg_active: Color::White,
            file_fg_inactive: Color::LightGray,
            button_key_fg: Color::Yellow,
            button_fg: Color::LightGray,
            log_fg: Color::LightGreen,
            log_bg: Color::Black,
            dialog_fg: Color::Black,
            dialog_bg: Color::LightGray,
            viewer_fg: Color::LightGray,
            viewer_bg: Color::Black,
        }
    }

    pub fn file_fg(&self, active: bool) -> Color {
        if active { self.file_fg_active } else { self.file_fg_inactive }
    }

    pub fn border(&self, active: bool) -> Color {
        if active { self.panel_border_active } else { self.panel_border_inactive }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::classic()
    }
}
