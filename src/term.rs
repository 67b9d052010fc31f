#![forbid(unsafe_code)]

use std::io::{self, Stdout};

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::ResetColor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend, buffer::Buffer, style};

use crate::console::{Color, Console, TextGrid, keys};

pub struct TermConsole {
    grid: TextGrid,
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TermConsole {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(Self { grid: TextGrid::screen(), terminal })
    }

    fn present(&mut self) -> io::Result<()> {
        let grid = &self.grid;
        self.terminal.draw(|frame| paint(grid, frame.buffer_mut()))?;
        Ok(())
    }
}

impl Drop for TermConsole {
    fn drop(&mut self) {
        execute!(self.terminal.backend_mut(), ResetColor, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

/// Copies the grid into a frame buffer, clipped to whatever the terminal
/// currently holds.
pub fn paint(grid: &TextGrid, buf: &mut Buffer) {
    for y in 0..grid.height() {
        for (x, cell) in grid.row(y).iter().enumerate() {
            let Ok(x) = u16::try_from(x) else { break };
            if let Some(target) = buf.cell_mut((x, y)) {
                target.set_char(cell.ch).set_fg(to_term(cell.fg)).set_bg(to_term(cell.bg));
            }
        }
    }
}

impl Console for TermConsole {
    fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color, bg: Color) {
        self.grid.draw_text(x, y, text, fg, bg);
    }

    fn fill_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, ch: char, fg: Color, bg: Color) {
        self.grid.fill_rect(x1, y1, x2, y2, ch, fg, bg);
    }

    fn invert_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) {
        self.grid.invert_rect(x1, y1, x2, y2);
    }

    fn draw_box(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, fg: Color, bg: Color) {
        self.grid.draw_box(x1, y1, x2, y2, fg, bg);
    }

    fn read_key(&mut self) -> u8 {
        loop {
            if let Err(err) = self.present() {
                log::error!("terminal write failed: {err}");
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if let Some(byte) = key_byte(key) {
                        return byte;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::error!("keyboard read failed: {err}");
                    return keys::ESC;
                }
            }
        }
    }
}

pub fn key_byte(key: KeyEvent) -> Option<u8> {
    let byte = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => keys::ESC,
        KeyCode::Char(ch) if ch.is_ascii() => ch as u8,
        KeyCode::Left => keys::LEFT,
        KeyCode::Right => keys::RIGHT,
        KeyCode::Up => keys::UP,
        KeyCode::Down => keys::DOWN,
        KeyCode::Backspace => keys::BACKSPACE,
        KeyCode::Tab | KeyCode::BackTab => keys::TAB,
        KeyCode::Enter => keys::ENTER,
        KeyCode::Esc => keys::ESC,
        KeyCode::Delete => keys::DELETE,
        KeyCode::F(1) => keys::F1,
        KeyCode::F(3) => keys::F3,
        KeyCode::F(5) => keys::F5,
        KeyCode::F(7) => keys::F7,
        _ => return None,
    };
    Some(byte)
}

pub fn to_term(color: Color) -> style::Color {
    let (r, g, b) = match color {
        Color::Black => (0x00, 0x00, 0x00),
        Color::Blue => (0x00, 0x00, 0xAA),
        Color::Green => (0x00, 0xAA, 0x00),
        Color::Cyan => (0x00, 0xAA, 0xAA),
        Color::Red => (0xAA, 0x00, 0x00),
        Color::Magenta => (0xAA, 0x00, 0xAA),
        Color::Brown => (0xAA, 0x55, 0x00),
        Color::LightGray => (0xAA, 0xAA, 0xAA),
        Color::DarkGray => (0x55, 0x55, 0x55),
        Color::LightBlue => (0x55, 0x55, 0xFF),
        Color::LightGreen => (0x55, 0xFF, 0x55),
        Color::LightCyan => (0x55, 0xFF, 0xFF),
        Color::LightRed => (0xFF, 0x55, 0x55),
        Color::LightMagenta => (0xFF, 0x55, 0xFF),
        Color::Yellow => (0xFF, 0xFF, 0x55),
        Color::White => (0xFF, 0xFF, 0xFF),
    };
    style::Color::Rgb(r, g, b)
}
