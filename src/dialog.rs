#![forbid(unsafe_code)]

use crate::console::{Console, SCREEN_COLS, SCREEN_ROWS, fit, keys};
use crate::msglog::wrap;
use crate::strings::{StringId, StringTable};
use crate::theme::ThemeColors;

pub const DIALOG_WIDTH: u16 = 50;
const BODY_WIDTH: usize = DIALOG_WIDTH as usize - 4;
const MAX_BODY_ROWS: usize = 6;

/// Blocking dialogs. A declined confirmation is `false` and a cancelled
/// prompt is `None`; neither is an error.
pub trait Dialogs {
    fn confirm(&mut self, console: &mut dyn Console, title: &str, body: &str) -> bool;

    /// Asks for one line of text, at most `max_len` characters. Surrounding
    /// blanks are trimmed and an empty answer counts as cancelled.
    fn prompt_text(
        &mut self,
        console: &mut dyn Console,
        title: &str,
        body: &str,
        prefill: &str,
        max_len: usize,
    ) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct TextDialogs {
    theme: ThemeColors,
    yes_no_hint: String,
    input_hint: String,
}

impl TextDialogs {
    pub fn new(theme: &ThemeColors, strings: &StringTable) -> Self {
        Self {
            theme: *theme,
            yes_no_hint: strings.lookup(StringId::DialogYesNo).to_string(),
            input_hint: strings.lookup(StringId::DialogInput).to_string(),
        }
    }

    fn frame(&self, console: &mut dyn Console, title: &str, body: &str, extra_rows: u16) -> (u16, u16) {
        let lines: Vec<String> = wrap(body, BODY_WIDTH).into_iter().take(MAX_BODY_ROWS).collect();
        let height = lines.len() as u16 + extra_rows + 4;
        let x1 = (SCREEN_COLS - DIALOG_WIDTH) / 2;
        let y1 = (SCREEN_ROWS - height) / 2;
        let x2 = x1 + DIALOG_WIDTH - 1;
        let y2 = y1 + height - 1;
        let (fg, bg) = (self.theme.dialog_fg, self.theme.dialog_bg);
        console.fill_rect(x1, y1, x2, y2, ' ', fg, bg);
        console.draw_box(x1, y1, x2, y2, self.theme.panel_border_active, bg);
        let label = format!(" {} ", fit(title, BODY_WIDTH - 2).trim_end());
        let title_x = x1 + (DIALOG_WIDTH - label.chars().count() as u16) / 2;
        console.draw_text(title_x, y1, &label, fg, bg);
        for (idx, line) in lines.iter().enumerate() {
            console.draw_text(x1 + 2, y1 + 2 + idx as u16, line, fg, bg);
        }
        (x1 + 2, y1 + 2 + lines.len() as u16 + 1)
    }
}

impl Dialogs for TextDialogs {
    fn confirm(&mut self, console: &mut dyn Console, title: &str, body: &str) -> bool {
        let (x, y) = self.frame(console, title, body, 1);
        console.draw_text(x, y, &self.yes_no_hint, self.theme.dialog_fg, self.theme.dialog_bg);
        loop {
            match console.read_key() {
                b'y' | b'Y' | keys::ENTER => return true,
                b'n' | b'N' | keys::ESC => return false,
                _ => {}
            }
        }
    }

    fn prompt_text(
        &mut self,
        console: &mut dyn Console,
        title: &str,
        body: &str,
        prefill: &str,
        max_len: usize,
    ) -> Option<String> {
        let (x, y) = self.frame(console, title, body, 3);
        let (fg, bg) = (self.theme.dialog_fg, self.theme.dialog_bg);
        console.draw_text(x, y + 2, &self.input_hint, fg, bg);
        let max_len = max_len.min(BODY_WIDTH - 1);
        let mut input = LineInput::new(prefill, max_len);
        loop {
            console.draw_text(x, y, &fit(input.value(), BODY_WIDTH), self.theme.viewer_fg, self.theme.viewer_bg);
            let cursor_x = x + input.cursor() as u16;
            console.invert_rect(cursor_x, y, cursor_x, y);
            match console.read_key() {
                keys::ESC => return None,
                keys::ENTER => {
                    let value = input.value().trim().to_string();
                    return if value.is_empty() { None } else { Some(value) };
                }
                key => input.apply(key),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    chars: Vec<char>,
    cursor: usize,
    max_len: usize,
    value: String,
}

impl LineInput {
    pub fn new(prefill: &str, max_len: usize) -> Self {
        let chars: Vec<char> = prefill.chars().take(max_len).collect();
        let cursor = chars.len();
        let value = chars.iter().collect();
        Self { chars, cursor, max_len, value }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn apply(&mut self, key: u8) {
        match key {
            keys::LEFT => self.cursor = self.cursor.saturating_sub(1),
            keys::RIGHT => self.cursor = (self.cursor + 1).min(self.chars.len()),
            keys::BACKSPACE => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.chars.remove(self.cursor);
                }
            }
            keys::DELETE => {
                if self.cursor < self.chars.len() {
                    self.chars.remove(self.cursor);
                }
            }
            0x20..=0x7E if self.chars.len() < self.max_len => {
                self.chars.insert(self.cursor, key as char);
                self.cursor += 1;
            }
            _ => {}
        }
        self.value = self.chars.iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConsole;

    fn dialogs() -> TextDialogs {
        TextDialogs::new(&ThemeColors::classic(), &StringTable::english())
    }

    #[test]
    fn confirm_waits_for_a_decision() {
        let mut console = MockConsole::with_keys(b"xqy");
        assert!(dialogs().confirm(&mut console, "Delete", "Delete a.txt?"));
        assert_eq!(console.keys_read(), 3);
        let mut console = MockConsole::with_keys(&[keys::ESC]);
        assert!(!dialogs().confirm(&mut console, "Delete", "Delete a.txt?"));
    }

    #[test]
    fn confirm_shows_title_and_body() {
        let mut console = MockConsole::with_keys(b"n");
        dialogs().confirm(&mut console, "Format drive", "All data will be erased.");
        let screen: Vec<String> = (0..SCREEN_ROWS).map(|y| console.grid().row_text(y)).collect();
        assert!(screen.iter().any(|row| row.contains(" Format drive ")));
        assert!(screen.iter().any(|row| row.contains("All data will be erased.")));
    }

    #[test]
    fn prompt_edits_the_prefill() {
        let mut console = MockConsole::with_keys(&[keys::BACKSPACE, keys::BACKSPACE, keys::BACKSPACE, b'b', b'i', b'n', keys::ENTER]);
        let answer = dialogs().prompt_text(&mut console, "Rename", "New name:", "a.txt", 20);
        assert_eq!(answer.as_deref(), Some("a.bin"));
    }

    #[test]
    fn prompt_cancels_on_escape_or_blank_input() {
        let mut console = MockConsole::with_keys(b"abc\x1b");
        assert_eq!(dialogs().prompt_text(&mut console, "t", "b", "", 20), None);
        let mut console = MockConsole::with_keys(&[b' ', keys::ENTER]);
        assert_eq!(dialogs().prompt_text(&mut console, "t", "b", "", 20), None);
    }

    #[test]
    fn line_input_respects_the_length_limit_and_cursor() {
        let mut input = LineInput::new("abcdef", 4);
        assert_eq!(input.value(), "abcd");
        input.apply(b'x');
        assert_eq!(input.value(), "abcd");
        input.apply(keys::LEFT);
        input.apply(keys::LEFT);
        input.apply(keys::DELETE);
        assert_eq!(input.value(), "abd");
        input.apply(b'Z');
        assert_eq!(input.value(), "abZd");
        assert_eq!(input.cursor(), 3);
    }
}
