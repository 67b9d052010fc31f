#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use crate::console::Console;
use crate::theme::ThemeColors;

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_PATH_LEN: usize = 255;

pub const BANK_SIZE: usize = 8192;
pub const BANKS_PER_DEVICE: usize = 64;
pub const RESERVED_RAM_BANKS: usize = 8;
pub const BASIC_STAGING_BANK: usize = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u8);

impl DeviceId {
    pub const SD_CARD: DeviceId = DeviceId(0);
    pub const FLOPPY_1: DeviceId = DeviceId(1);
    pub const FLOPPY_2: DeviceId = DeviceId(2);
    pub const RAM: DeviceId = DeviceId(3);
    pub const FLASH: DeviceId = DeviceId(4);

    const LAST_DISK: u8 = 2;
    const LAST: u8 = 4;

    pub fn is_memory(self) -> bool {
        self.0 > Self::LAST_DISK
    }

    pub fn is_valid(self) -> bool {
        self.0 <= Self::LAST
    }

    pub fn next(self) -> DeviceId {
        if self.0 >= Self::LAST { DeviceId(0) } else { DeviceId(self.0 + 1) }
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "SD card",
            1 => "Floppy 1",
            2 => "Floppy 2",
            3 => "RAM",
            4 => "Flash",
            _ => "Unknown",
        }
    }

    pub fn root_path(self) -> String {
        format!("{}:", self.0)
    }

    pub fn base_address(self) -> u32 {
        if self == DeviceId::FLASH { 0x8_0000 } else { 0 }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a browsable item. Declaration order is the type sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileType {
    Directory,
    Executable,
    Font,
    Image,
    Music,
    Basic,
    Other,
}

impl FileType {
    pub fn label(self) -> &'static str {
        match self {
            FileType::Directory => "Dir",
            FileType::Executable => "Exe",
            FileType::Font => "Font",
            FileType::Image => "Image",
            FileType::Music => "Music",
            FileType::Basic => "Basic",
            FileType::Other => "File",
        }
    }
}

fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() { None } else { Some(ext) }
}

pub fn hint_from_extension(name: &str) -> FileType {
    let Some(ext) = extension(name) else { return FileType::Other };
    match ext.to_ascii_lowercase().as_str() {
        "256" | "lbm" | "img" => FileType::Image,
        "vgm" | "mod" | "rad" | "wav" => FileType::Music,
        "bas" => FileType::Basic,
        _ => FileType::Other,
    }
}

pub fn refine_by_extension(name: &str, hint: FileType) -> FileType {
    let Some(ext) = extension(name) else { return hint };
    match ext.to_ascii_lowercase().as_str() {
        "fnt" => FileType::Font,
        "pgz" | "pgx" | "kup" => FileType::Executable,
        _ => hint,
    }
}

pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{name}")
}

pub fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.ends_with(':') {
        return None;
    }
    let (parent, _) = trimmed.rsplit_once('/')?;
    Some(parent.to_string())
}

pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.ends_with(':') {
        return "";
    }
    trimmed.rsplit('/').next().unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Name,
    Size,
    Type,
}

impl SortBy {
    pub fn ordering<T>(after: impl Fn(&T, &T) -> bool, a: &T, b: &T) -> Ordering {
        if after(a, b) {
            Ordering::Greater
        } else if after(b, a) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowPosition {
    pub col: u16,
    pub display_row: Option<u16>,
    pub absolute_row: usize,
}

impl RowPosition {
    pub fn at_row(absolute_row: usize) -> Self {
        Self { col: 0, display_row: None, absolute_row }
    }
}

pub trait ListItem {
    fn position(&self) -> &RowPosition;
    fn position_mut(&mut self) -> &mut RowPosition;
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
    fn display_name(&self) -> &str;

    fn render(
        &self,
        console: &mut dyn Console,
        theme: &ThemeColors,
        as_selected: bool,
        y_offset: u16,
        as_active: bool,
    );

    fn mark_selected(
        &mut self,
        console: &mut dyn Console,
        theme: &ThemeColors,
        y_offset: u16,
        as_active: bool,
    ) -> bool {
        if self.is_selected() {
            return false;
        }
        self.set_selected(true);
        self.render(console, theme, true, y_offset, as_active);
        true
    }

    fn mark_unselected(
        &mut self,
        console: &mut dyn Console,
        theme: &ThemeColors,
        y_offset: u16,
        as_active: bool,
    ) -> bool {
        if !self.is_selected() {
            return false;
        }
        self.set_selected(false);
        self.render(console, theme, false, y_offset, as_active);
        true
    }
}

pub trait Listing {
    type Item: ListItem;

    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut [Self::Item];
    fn current_row(&self) -> Option<usize>;
    fn set_current_row(&mut self, row: Option<usize>);

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn find_by_row(&self, row: usize) -> Option<&Self::Item> {
        self.items().get(row)
    }

    fn current_item(&self) -> Option<&Self::Item> {
        self.current_row().and_then(|row| self.items().get(row))
    }
}
