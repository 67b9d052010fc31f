#![forbid(unsafe_code)]

use crate::console::{Console, SCREEN_COLS, SCREEN_ROWS, fit};
use crate::menu::BUTTONS;
use crate::msglog::{LOG_ROWS, LOG_Y};
use crate::strings::{StringId, StringTable};
use crate::theme::ThemeColors;

pub const TITLE_BAR_Y: u16 = 0;
pub const PANEL_INNER_WIDTH: u16 = 33;
pub const LEFT_PANEL_X: u16 = 1;
pub const RIGHT_PANEL_X: u16 = SCREEN_COLS - 1 - PANEL_INNER_WIDTH;
pub const PANEL_TAB_Y: u16 = 2;
pub const PANEL_HEADER_Y: u16 = PANEL_TAB_Y + 2;
pub const PANEL_CONTENT_Y: u16 = PANEL_HEADER_Y + 1;
pub const PANEL_CONTENT_HEIGHT: u16 = LOG_Y - 3 - PANEL_CONTENT_Y;
pub const BUTTONS_X: u16 = LEFT_PANEL_X + PANEL_INNER_WIDTH + 2;
pub const BUTTONS_WIDTH: u16 = RIGHT_PANEL_X - 2 - BUTTONS_X;

pub fn draw_chrome(console: &mut dyn Console, theme: &ThemeColors, strings: &StringTable) {
    let last_col = SCREEN_COLS - 1;
    console.fill_rect(0, 0, last_col, SCREEN_ROWS - 1, ' ', theme.screen_fg, theme.screen_bg);

    let title = strings.lookup(StringId::AppTitle);
    let pad = (SCREEN_COLS as usize).saturating_sub(title.chars().count()) / 2;
    let bar = fit(&format!("{}{title}", " ".repeat(pad)), SCREEN_COLS as usize);
    console.draw_text(0, TITLE_BAR_Y, &bar, theme.title_fg, theme.title_bg);

    draw_buttons(console, theme);

    let log_top = LOG_Y - 1;
    let log_bottom = LOG_Y + LOG_ROWS as u16;
    console.fill_rect(1, LOG_Y, last_col - 1, log_bottom - 1, ' ', theme.log_fg, theme.log_bg);
    console.draw_box(0, log_top, last_col, log_bottom, theme.panel_border_inactive, theme.screen_bg);
}

pub fn draw_buttons(console: &mut dyn Console, theme: &ThemeColors) {
    for (idx, button) in BUTTONS.iter().enumerate() {
        let y = PANEL_CONTENT_Y + 2 * idx as u16;
        if y >= PANEL_CONTENT_Y + PANEL_CONTENT_HEIGHT {
            log::warn!("command column overflows at {}", button.label);
            break;
        }
        console.draw_text(BUTTONS_X, y, button.key, theme.button_key_fg, theme.screen_bg);
        let label = fit(button.label, BUTTONS_WIDTH as usize - 2);
        console.draw_text(BUTTONS_X + 2, y, &label, theme.button_fg, theme.screen_bg);
    }
}

pub fn draw_sort_indicator(console: &mut dyn Console, theme: &ThemeColors, x: u16, y: u16, label: &str, active: bool) {
    let text = format!(" {} ", fit(label, 12).trim_end());
    console.draw_text(x, y, &text, theme.border(active), theme.panel_bg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConsole;
    use crate::msglog::{LOG_COLS, LOG_X};

    #[test]
    fn panels_buttons_and_log_share_the_screen() {
        assert_eq!(RIGHT_PANEL_X, 46);
        assert_eq!(PANEL_CONTENT_Y, 5);
        assert_eq!(PANEL_CONTENT_HEIGHT, 44);
        assert_eq!(BUTTONS_X, 36);
        assert!(BUTTONS_X + BUTTONS_WIDTH < RIGHT_PANEL_X);
        assert_eq!(LOG_X as usize + LOG_COLS, SCREEN_COLS as usize - 1);
    }

    #[test]
    fn chrome_shows_title_and_buttons() {
        let mut console = MockConsole::new();
        draw_chrome(&mut console, &ThemeColors::classic(), &StringTable::english());
        assert!(console.grid().row_text(TITLE_BAR_Y).contains("f256commander"));
        assert_eq!(console.grid().text_at(BUTTONS_X, PANEL_CONTENT_Y, 6), "C Copy");
        assert_eq!(console.grid().text_at(0, LOG_Y - 1, 1), "┌");
    }
}
