#![forbid(unsafe_code)]

pub const SCREEN_COLS: u16 = 80;
pub const SCREEN_ROWS: u16 = 60;

pub mod keys {
    pub const LEFT: u8 = 0x02;
    pub const RIGHT: u8 = 0x06;
    pub const BACKSPACE: u8 = 0x08;
    pub const TAB: u8 = 0x09;
    pub const ENTER: u8 = 0x0D;
    pub const DOWN: u8 = 0x0E;
    pub const UP: u8 = 0x10;
    pub const ESC: u8 = 0x1B;
    pub const DELETE: u8 = 0x7F;
    pub const F1: u8 = 0x81;
    pub const F3: u8 = 0x83;
    pub const F5: u8 = 0x85;
    pub const F7: u8 = 0x87;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Brown,
    LightGray,
    DarkGray,
    LightBlue,
    LightGreen,
    LightCyan,
    LightRed,
    LightMagenta,
    Yellow,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', fg: Color::LightGray, bg: Color::Black }
    }
}

/// Screen and keyboard primitives. Rectangles are inclusive; anything
/// outside the grid is clipped.
pub trait Console {
    fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color, bg: Color);
    #[allow(clippy::too_many_arguments)]
    fn fill_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, ch: char, fg: Color, bg: Color);
    fn invert_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16);
    fn draw_box(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, fg: Color, bg: Color);
    /// Blocks until a key is available.
    fn read_key(&mut self) -> u8;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl TextGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, cells: vec![Cell::default(); width as usize * height as usize] }
    }

    pub fn screen() -> Self {
        Self::new(SCREEN_COLS, SCREEN_ROWS)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    pub fn row_text(&self, y: u16) -> String {
        self.row(y).iter().map(|cell| cell.ch).collect()
    }

    pub fn text_at(&self, x: u16, y: u16, len: usize) -> String {
        self.row_text(y).chars().skip(x as usize).take(len).collect()
    }

    pub fn put(&mut self, x: u16, y: u16, ch: char, fg: Color, bg: Color) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell { ch, fg, bg };
        }
    }

    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color, bg: Color) {
        for (offset, ch) in text.chars().enumerate() {
            let Ok(offset) = u16::try_from(offset) else { break };
            let Some(cx) = x.checked_add(offset) else { break };
            if cx >= self.width {
                break;
            }
            self.put(cx, y, ch, fg, bg);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, ch: char, fg: Color, bg: Color) {
        for y in y1..=y2.min(self.height.saturating_sub(1)) {
            for x in x1..=x2.min(self.width.saturating_sub(1)) {
                self.put(x, y, ch, fg, bg);
            }
        }
    }

    pub fn invert_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) {
        for y in y1..=y2.min(self.height.saturating_sub(1)) {
            for x in x1..=x2.min(self.width.saturating_sub(1)) {
                if let Some(idx) = self.index(x, y) {
                    let cell = &mut self.cells[idx];
                    std::mem::swap(&mut cell.fg, &mut cell.bg);
                }
            }
        }
    }

    pub fn draw_box(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, fg: Color, bg: Color) {
        if x2 <= x1 || y2 <= y1 {
            return;
        }
        for x in x1 + 1..x2 {
            self.put(x, y1, '─', fg, bg);
            self.put(x, y2, '─', fg, bg);
        }
        for y in y1 + 1..y2 {
            self.put(x1, y, '│', fg, bg);
            self.put(x2, y, '│', fg, bg);
        }
        self.put(x1, y1, '┌', fg, bg);
        self.put(x2, y1, '┐', fg, bg);
        self.put(x1, y2, '└', fg, bg);
        self.put(x2, y2, '┘', fg, bg);
    }
}

pub fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

pub fn fit_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().skip(len - width).collect()
    } else {
        format!("{}{}", " ".repeat(width - len), text)
    }
}

pub fn glyph(byte: u8) -> char {
    if (0x20..0x7F).contains(&byte) { byte as char } else { '.' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_clips_at_the_grid_edge() {
        let mut grid = TextGrid::new(10, 2);
        grid.draw_text(7, 0, "abcdef", Color::White, Color::Blue);
        assert_eq!(grid.row_text(0), "       abc");
        grid.fill_rect(8, 1, 40, 9, '#', Color::White, Color::Blue);
        assert_eq!(grid.row_text(1), "        ##");
    }

    #[test]
    fn invert_swaps_colors_in_place() {
        let mut grid = TextGrid::new(4, 1);
        grid.draw_text(0, 0, "ab", Color::White, Color::Blue);
        grid.invert_rect(0, 0, 0, 0);
        assert_eq!(grid.cell(0, 0).map(|c| (c.fg, c.bg)), Some((Color::Blue, Color::White)));
        assert_eq!(grid.cell(1, 0).map(|c| (c.fg, c.bg)), Some((Color::White, Color::Blue)));
    }

    #[test]
    fn boxes_have_corners() {
        let mut grid = TextGrid::new(4, 3);
        grid.draw_box(0, 0, 3, 2, Color::White, Color::Blue);
        assert_eq!(grid.row_text(0), "┌──┐");
        assert_eq!(grid.row_text(1), "│  │");
        assert_eq!(grid.row_text(2), "└──┘");
    }

    #[test]
    fn fit_helpers_pad_and_cut() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
        assert_eq!(fit_right("42", 6), "    42");
        assert_eq!(fit_right("1234567", 6), "234567");
        assert_eq!(glyph(b'A'), 'A');
        assert_eq!(glyph(0x0A), '.');
    }
}
