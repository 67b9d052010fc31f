#![forbid(unsafe_code)]

use std::io::{self, Read};

use crate::console::{Console, SCREEN_COLS, SCREEN_ROWS, fit, glyph, keys};
use crate::strings::{StringId, StringTable};
use crate::theme::ThemeColors;

pub const HEX_BYTES_PER_ROW: usize = 16;
pub const VIEWER_ROWS: u16 = SCREEN_ROWS - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Text,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEnd {
    EndOfFile,
    Quit,
}

#[derive(Debug, Clone)]
pub struct PagedViewer {
    mode: ViewMode,
    address: u32,
    rows_per_page: u16,
}

impl PagedViewer {
    pub fn new(mode: ViewMode, address: u32) -> Self {
        Self { mode, address, rows_per_page: VIEWER_ROWS }
    }

    pub fn with_rows_per_page(mut self, rows: u16) -> Self {
        self.rows_per_page = rows.clamp(1, VIEWER_ROWS);
        self
    }

    pub fn bytes_per_row(&self) -> usize {
        match self.mode {
            ViewMode::Text => SCREEN_COLS as usize,
            ViewMode::Hex => HEX_BYTES_PER_ROW,
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn run(
        &mut self,
        reader: &mut dyn Read,
        console: &mut dyn Console,
        theme: &ThemeColors,
        strings: &StringTable,
        title: &str,
    ) -> io::Result<ViewEnd> {
        let width = SCREEN_COLS as usize;
        let last_col = SCREEN_COLS - 1;
        console.fill_rect(0, 0, last_col, SCREEN_ROWS - 1, ' ', theme.viewer_fg, theme.viewer_bg);
        console.draw_text(0, 0, &fit(title, width), theme.viewer_fg, theme.viewer_bg);
        console.invert_rect(0, 0, last_col, 0);

        let mut buf = vec![0u8; self.bytes_per_row()];
        let mut row: u16 = 0;
        loop {
            let n = read_chunk(reader, &mut buf)?;
            if n > 0 {
                let line = match self.mode {
                    ViewMode::Text => format_text_row(&buf[..n]),
                    ViewMode::Hex => format_hex_row(self.address, &buf[..n]),
                };
                console.draw_text(0, 1 + row, &line, theme.viewer_fg, theme.viewer_bg);
                self.address = self.address.wrapping_add(n as u32);
                row += 1;
            }
            if n < buf.len() {
                self.footer(console, theme, strings.lookup(StringId::ViewerEnd));
                console.read_key();
                return Ok(ViewEnd::EndOfFile);
            }
            if row == self.rows_per_page {
                self.footer(console, theme, strings.lookup(StringId::ViewerMore));
                let key = console.read_key();
                if key == keys::ESC || key == b'q' || key == b'Q' {
                    return Ok(ViewEnd::Quit);
                }
                console.fill_rect(0, 1, last_col, self.rows_per_page, ' ', theme.viewer_fg, theme.viewer_bg);
                row = 0;
            }
        }
    }

    fn footer(&self, console: &mut dyn Console, theme: &ThemeColors, text: &str) {
        let y = SCREEN_ROWS - 1;
        console.draw_text(0, y, &fit(text, SCREEN_COLS as usize), theme.viewer_fg, theme.viewer_bg);
        console.invert_rect(0, y, SCREEN_COLS - 1, y);
    }
}

fn read_chunk(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

pub fn format_text_row(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            b'\n' | b'\r' | b'\t' => ' ',
            other => glyph(other),
        })
        .collect()
}

pub fn format_hex_row(address: u32, bytes: &[u8]) -> String {
    let mut line = format!("{address:06X}: ");
    for byte in bytes {
        line.push_str(&format!("{byte:02X} "));
    }
    for _ in bytes.len()..HEX_BYTES_PER_ROW {
        line.push_str("   ");
    }
    line.extend(bytes.iter().map(|&b| glyph(b)));
    line
}
