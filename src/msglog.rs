#![forbid(unsafe_code)]

use std::collections::VecDeque;

use crate::console::{Color, Console, fit};
use crate::theme::ThemeColors;

pub const LOG_ROWS: usize = 7;
pub const LOG_COLS: usize = 78;
pub const LOG_X: u16 = 1;
pub const LOG_Y: u16 = 52;

#[derive(Debug, Clone)]
pub struct MessageLog {
    rows: VecDeque<String>,
    lines_since_ack: usize,
    x: u16,
    y: u16,
    fg: Color,
    bg: Color,
}

impl MessageLog {
    pub fn new(theme: &ThemeColors) -> Self {
        Self::at(LOG_X, LOG_Y, theme.log_fg, theme.log_bg)
    }

    pub fn at(x: u16, y: u16, fg: Color, bg: Color) -> Self {
        let rows = (0..LOG_ROWS).map(|_| " ".repeat(LOG_COLS)).collect();
        Self { rows, lines_since_ack: 0, x, y, fg, bg }
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(String::as_str)
    }

    pub fn lines_since_ack(&self) -> usize {
        self.lines_since_ack
    }

    pub fn acknowledge(&mut self) {
        self.lines_since_ack = 0;
    }

    pub fn clear(&mut self, console: &mut dyn Console) {
        for row in self.rows.iter_mut() {
            *row = " ".repeat(LOG_COLS);
        }
        self.refresh_display(console);
    }

    pub fn refresh_display(&self, console: &mut dyn Console) {
        for (idx, row) in self.rows.iter().enumerate() {
            let width = row.chars().count();
            if width > LOG_COLS {
                log::warn!("log row {idx} is {width} columns wide, truncating");
            }
            let text = fit(row, LOG_COLS);
            console.draw_text(self.x, self.y + idx as u16, &text, self.fg, self.bg);
        }
    }

    /// Word-wraps `text` into the log. Never blocks: once a screenful has
    /// gone by without a key press the counter simply starts over.
    pub fn post_message(&mut self, console: &mut dyn Console, text: &str) {
        if self.lines_since_ack >= LOG_ROWS {
            self.lines_since_ack = 0;
        }
        for line in wrap(text, LOG_COLS) {
            self.push_row(console, &line);
            self.lines_since_ack += 1;
        }
    }

    fn push_row(&mut self, console: &mut dyn Console, line: &str) {
        self.rows.pop_front();
        self.rows.push_back(fit(line, LOG_COLS));
        self.refresh_display(console);
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(&ThemeColors::classic())
    }
}

/// Splits `text` into rows of at most `width` characters.
///
/// A row longer than `width` is cut at the last space at or before index
/// `width`; the spaces at the cut are dropped. With no space in range the
/// row is cut hard at `width`. A cut that uses up the text adds no blank
/// row. Newlines always start a new row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    if width == 0 {
        return rows;
    }
    for line in text.split('\n') {
        let mut rest: Vec<char> = line.trim_end_matches('\r').chars().collect();
        let mut was_cut = false;
        while rest.len() > width {
            let cut = (1..=width).rev().find(|&idx| rest[idx] == ' ');
            let (row, skip) = match cut {
                Some(idx) => (rest[..idx].iter().collect::<String>(), idx + 1),
                None => (rest[..width].iter().collect::<String>(), width),
            };
            rows.push(row);
            rest.drain(..skip);
            let spaces = rest.iter().take_while(|&&ch| ch == ' ').count();
            rest.drain(..spaces);
            was_cut = true;
        }
        if !(was_cut && rest.is_empty()) {
            rows.push(rest.into_iter().collect());
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConsole;

    #[test]
    fn short_message_becomes_one_padded_row() {
        let mut console = MockConsole::new();
        let mut log = MessageLog::default();
        log.post_message(&mut console, "Copied a.txt");
        let rows: Vec<_> = log.rows().collect();
        assert_eq!(rows[LOG_ROWS - 1], fit("Copied a.txt", LOG_COLS));
        assert_eq!(rows[LOG_ROWS - 1].chars().count(), LOG_COLS);
        assert!(rows[..LOG_ROWS - 1].iter().all(|row| row.trim().is_empty()));
        assert_eq!(console.grid().text_at(LOG_X, LOG_Y + 6, 12), "Copied a.txt");
    }

    #[test]
    fn space_at_width_splits_into_two_lossless_rows() {
        let first = "a".repeat(LOG_COLS);
        let second = "b".repeat(LOG_COLS - 1);
        let text = format!("{first} {second}");
        assert_eq!(text.len(), 2 * LOG_COLS);
        let rows = wrap(&text, LOG_COLS);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.chars().count() <= LOG_COLS));
        assert_eq!(format!("{} {}", rows[0].trim(), rows[1].trim()), text);
    }

    #[test]
    fn wrap_prefers_the_last_space_and_hard_cuts_without_one() {
        assert_eq!(wrap("one two three", 9), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("top\nbottom", 20), vec!["top", "bottom"]);
    }

    #[test]
    fn runs_of_spaces_at_a_cut_are_dropped() {
        assert_eq!(wrap("aaaaa  bbbbb", 5), vec!["aaaaa", "bbbbb"]);
        assert_eq!(wrap("abcdefgh   ij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn trailing_space_at_the_cut_posts_no_blank_row() {
        let mut console = MockConsole::new();
        let mut log = MessageLog::default();
        log.post_message(&mut console, "keep me");
        let long = format!("{} ", "x".repeat(LOG_COLS));
        assert_eq!(wrap(&long, LOG_COLS), vec!["x".repeat(LOG_COLS)]);
        log.post_message(&mut console, &long);
        let rows: Vec<_> = log.rows().collect();
        assert_eq!(rows[LOG_ROWS - 2].trim(), "keep me");
        assert_eq!(rows[LOG_ROWS - 1], "x".repeat(LOG_COLS));
        assert_eq!(log.lines_since_ack(), 2);
    }

    #[test]
    fn oldest_rows_scroll_off_the_top() {
        let mut console = MockConsole::new();
        let mut log = MessageLog::default();
        for idx in 0..(LOG_ROWS + 2) {
            log.post_message(&mut console, &format!("message {idx}"));
        }
        let first = log.rows().next().map(str::trim).map(str::to_string);
        assert_eq!(first.as_deref(), Some("message 2"));
    }

    #[test]
    fn counter_resets_instead_of_blocking() {
        let mut console = MockConsole::new();
        let mut log = MessageLog::default();
        for _ in 0..LOG_ROWS {
            log.post_message(&mut console, "x");
        }
        assert_eq!(log.lines_since_ack(), LOG_ROWS);
        log.post_message(&mut console, "y");
        assert_eq!(log.lines_since_ack(), 1);
        assert_eq!(console.keys_read(), 0);
        log.acknowledge();
        assert_eq!(log.lines_since_ack(), 0);
    }

    #[test]
    fn clear_blanks_memory_and_screen() {
        let mut console = MockConsole::new();
        let mut log = MessageLog::default();
        log.post_message(&mut console, "hello");
        log.clear(&mut console);
        assert!(log.rows().all(|row| row.trim().is_empty()));
        assert!(console.grid().row_text(LOG_Y + 6).trim().is_empty());
    }

    mod properties {
        use super::super::wrap;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn rows_never_exceed_width(text in "[a-z ]{0,300}", width in 1usize..90) {
                for row in wrap(&text, width) {
                    prop_assert!(row.chars().count() <= width);
                }
            }

            #[test]
            fn wrapping_keeps_every_non_space_character(text in "[a-z ]{0,300}", width in 1usize..90) {
                let original: String = text.chars().filter(|c| *c != ' ').collect();
                let wrapped: String = wrap(&text, width).concat().chars().filter(|c| *c != ' ').collect();
                prop_assert_eq!(original, wrapped);
            }

            #[test]
            fn only_empty_input_yields_an_empty_row(text in "[a-z ]{1,300}", width in 1usize..90) {
                for row in wrap(&text, width) {
                    prop_assert!(!row.is_empty());
                }
            }
        }
    }
}
