#![forbid(unsafe_code)]

use crate::console::{Console, fit, fit_right};
use crate::error::{EntryError, EntryResult};
use crate::host::Host;
use crate::model::{
    DeviceId, FileType, ListItem, MAX_NAME_LEN, MAX_PATH_LEN, RowPosition, file_name,
    hint_from_extension, refine_by_extension,
};
use crate::strings::StringTable;
use crate::theme::ThemeColors;
use crate::viewer::{PagedViewer, ViewEnd, ViewMode};

pub const NAME_COL_WIDTH: usize = 20;
pub const TYPE_COL_WIDTH: usize = 5;
pub const SIZE_COL_WIDTH: usize = 6;
pub const ROW_WIDTH: usize = NAME_COL_WIDTH + 1 + TYPE_COL_WIDTH + 1 + SIZE_COL_WIDTH;

#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub name: Option<&'a str>,
    pub path: &'a str,
    pub is_directory: bool,
    pub size: u64,
    pub type_hint: FileType,
    pub device: DeviceId,
    pub unit: u8,
    pub row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    path: String,
    is_directory: bool,
    size: u64,
    file_type: FileType,
    device: DeviceId,
    unit: u8,
    selected: bool,
    position: RowPosition,
}

fn check_name(name: &str) -> EntryResult<()> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EntryError::NameTooLong { max: MAX_NAME_LEN });
    }
    Ok(())
}

fn check_path(path: &str) -> EntryResult<()> {
    if path.chars().count() > MAX_PATH_LEN {
        return Err(EntryError::PathTooLong { max: MAX_PATH_LEN });
    }
    Ok(())
}

impl Entry {
    pub fn create(new: NewEntry<'_>) -> EntryResult<Entry> {
        let name = match new.name {
            Some(name) => name,
            None => file_name(new.path),
        };
        if name.is_empty() {
            return Err(EntryError::EmptyName(new.path.to_string()));
        }
        check_name(name)?;
        check_path(new.path)?;
        let file_type = if new.is_directory {
            FileType::Directory
        } else {
            refine_by_extension(name, new.type_hint)
        };
        Ok(Entry {
            name: name.to_string(),
            path: new.path.to_string(),
            is_directory: new.is_directory,
            size: new.size,
            file_type,
            device: new.device,
            unit: new.unit,
            selected: false,
            position: RowPosition::at_row(new.row),
        })
    }

    pub fn duplicate(&self) -> EntryResult<Entry> {
        check_name(&self.name)?;
        check_path(&self.path)?;
        Ok(Entry { selected: false, ..self.clone() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_parent_link(&self) -> bool {
        self.is_directory && self.name == ".."
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn unit(&self) -> u8 {
        self.unit
    }

    pub fn update_name(&mut self, name: &str) -> EntryResult<()> {
        if self.name.eq_ignore_ascii_case(name) {
            return Ok(());
        }
        check_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn update_path(&mut self, path: &str) -> EntryResult<()> {
        if self.path == path {
            return Ok(());
        }
        check_path(path)?;
        self.path = path.to_string();
        Ok(())
    }

    pub fn delete(&self, host: &mut dyn Host) -> EntryResult<()> {
        host.remove(&self.path).map_err(|err| {
            log::warn!("remove {} failed: {err} (code {:?})", self.path, err.code());
            EntryError::from(err)
        })
    }

    /// Renames on the host, then swaps in both new fields. Both are
    /// validated up front, so on any error the entry is unchanged.
    pub fn rename(&mut self, host: &mut dyn Host, new_name: &str, new_path: &str) -> EntryResult<()> {
        if new_name.is_empty() {
            return Err(EntryError::EmptyName(new_path.to_string()));
        }
        check_name(new_name)?;
        check_path(new_path)?;
        host.rename(&self.path, new_path).map_err(|err| {
            log::warn!("rename {} -> {new_path} failed: {err}", self.path);
            EntryError::from(err)
        })?;
        self.update_name(new_name)?;
        self.update_path(new_path)?;
        if !self.is_directory {
            self.file_type = refine_by_extension(new_name, hint_from_extension(new_name));
        }
        Ok(())
    }

    pub fn get_text_contents(
        &self,
        host: &mut dyn Host,
        console: &mut dyn Console,
        theme: &ThemeColors,
        strings: &StringTable,
    ) -> EntryResult<ViewEnd> {
        self.view(host, console, theme, strings, ViewMode::Text)
    }

    pub fn get_hex_contents(
        &self,
        host: &mut dyn Host,
        console: &mut dyn Console,
        theme: &ThemeColors,
        strings: &StringTable,
    ) -> EntryResult<ViewEnd> {
        self.view(host, console, theme, strings, ViewMode::Hex)
    }

    fn view(
        &self,
        host: &mut dyn Host,
        console: &mut dyn Console,
        theme: &ThemeColors,
        strings: &StringTable,
        mode: ViewMode,
    ) -> EntryResult<ViewEnd> {
        if self.is_directory {
            return Err(EntryError::IsDirectory(self.name.clone()));
        }
        let mut reader = host.open_read(&self.path)?;
        let mut viewer = PagedViewer::new(mode, 0);
        Ok(viewer.run(&mut reader, console, theme, strings, &self.path)?)
    }

    pub fn row_text(&self) -> String {
        let size = if self.is_directory { String::new() } else { format_size(self.size) };
        format!(
            "{} {} {}",
            fit(&self.name, NAME_COL_WIDTH),
            fit(self.file_type.label(), TYPE_COL_WIDTH),
            fit_right(&size, SIZE_COL_WIDTH)
        )
    }
}

pub fn format_size(size: u64) -> String {
    if size <= 999_999 {
        size.to_string()
    } else if size / 1024 <= 99_999 {
        format!("{}K", size / 1024)
    } else {
        format!("{}M", size / (1024 * 1024))
    }
}

pub fn compare_size(a: &Entry, b: &Entry) -> bool {
    a.size < b.size
}

pub fn compare_type(a: &Entry, b: &Entry) -> bool {
    a.file_type > b.file_type
}

pub fn compare_name(a: &Entry, b: &Entry) -> bool {
    a.name.to_ascii_lowercase() > b.name.to_ascii_lowercase()
}

impl ListItem for Entry {
    fn position(&self) -> &RowPosition {
        &self.position
    }

    fn position_mut(&mut self) -> &mut RowPosition {
        &mut self.position
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn render(
        &self,
        console: &mut dyn Console,
        theme: &ThemeColors,
        as_selected: bool,
        y_offset: u16,
        as_active: bool,
    ) {
        let Some(row) = self.position.display_row else { return };
        let x = self.position.col;
        let y = y_offset + row;
        console.draw_text(x, y, &self.row_text(), theme.file_fg(as_active), theme.panel_bg);
        if as_selected {
            console.invert_rect(x, y, x + ROW_WIDTH as u16 - 1, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConsole, MockHost};

    fn file(name: &str, size: u64) -> Entry {
        Entry::create(NewEntry {
            name: None,
            path: &format!("0:/{name}"),
            is_directory: false,
            size,
            type_hint: hint_from_extension(name),
            device: DeviceId::SD_CARD,
            unit: 0,
            row: 0,
        })
        .expect("valid entry")
    }

    #[test]
    fn create_derives_name_and_type_from_path() {
        let entry = file("Beta.PGZ", 50);
        assert_eq!(entry.name(), "Beta.PGZ");
        assert_eq!(entry.file_type(), FileType::Executable);
        let font = file("petscii.fnt", 2048);
        assert_eq!(font.file_type(), FileType::Font);
        let song = file("tune.vgm", 10);
        assert_eq!(song.file_type(), FileType::Music);
    }

    #[test]
    fn create_rejects_overlong_text_and_empty_names() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let result = Entry::create(NewEntry {
            name: Some(&long),
            path: "0:/x",
            is_directory: false,
            size: 0,
            type_hint: FileType::Other,
            device: DeviceId::SD_CARD,
            unit: 0,
            row: 0,
        });
        assert!(matches!(result, Err(EntryError::NameTooLong { .. })));
        let result = Entry::create(NewEntry {
            name: None,
            path: "0:",
            is_directory: true,
            size: 0,
            type_hint: FileType::Other,
            device: DeviceId::SD_CARD,
            unit: 0,
            row: 0,
        });
        assert!(matches!(result, Err(EntryError::EmptyName(_))));
    }

    #[test]
    fn duplicate_copies_fields_but_not_selection() {
        let mut entry = file("a.txt", 5);
        entry.set_selected(true);
        entry.position_mut().display_row = Some(3);
        let twin = entry.duplicate().expect("duplicate");
        assert!(!twin.is_selected());
        assert_eq!(twin.path(), entry.path());
        assert_eq!(twin.position().display_row, Some(3));
    }

    #[test]
    fn update_name_ignores_case_only_changes() {
        let mut entry = file("Readme.txt", 5);
        entry.update_name("README.TXT").expect("no-op");
        assert_eq!(entry.name(), "Readme.txt");
        entry.update_name("other.txt").expect("update");
        assert_eq!(entry.name(), "other.txt");
    }

    #[test]
    fn update_path_skips_identical_and_rejects_overlong() {
        let mut entry = file("a.txt", 5);
        entry.update_path("0:/a.txt").expect("no-op");
        assert_eq!(entry.path(), "0:/a.txt");
        let long = format!("0:/{}", "p".repeat(MAX_PATH_LEN));
        assert!(matches!(entry.update_path(&long), Err(EntryError::PathTooLong { .. })));
        assert_eq!(entry.path(), "0:/a.txt");
        entry.update_path("0:/games/a.txt").expect("update");
        assert_eq!(entry.path(), "0:/games/a.txt");
    }

    #[test]
    fn rename_round_trip_restores_fields() {
        let mut host = MockHost::new();
        host.add_file("0:/A", b"data");
        let mut entry = file("A", 4);
        entry.rename(&mut host, "B", "0:/B").expect("rename to B");
        assert_eq!((entry.name(), entry.path()), ("B", "0:/B"));
        entry.rename(&mut host, "A", "0:/A").expect("rename back");
        assert_eq!((entry.name(), entry.path()), ("A", "0:/A"));
        assert!(host.exists_file("0:/A"));
    }

    #[test]
    fn failed_rename_leaves_entry_untouched() {
        let mut host = MockHost::new();
        let mut entry = file("ghost.txt", 4);
        assert!(entry.rename(&mut host, "new.txt", "0:/new.txt").is_err());
        assert_eq!((entry.name(), entry.path()), ("ghost.txt", "0:/ghost.txt"));
        let long = "p".repeat(MAX_PATH_LEN + 1);
        host.add_file("0:/ghost.txt", b"");
        assert!(entry.rename(&mut host, "ok", &long).is_err());
        assert!(host.exists_file("0:/ghost.txt"));
    }

    #[test]
    fn marking_is_idempotent() {
        let mut console = MockConsole::new();
        let theme = ThemeColors::classic();
        let mut entry = file("a.txt", 5);
        entry.position_mut().display_row = Some(0);
        assert!(entry.mark_selected(&mut console, &theme, 5, true));
        assert!(!entry.mark_selected(&mut console, &theme, 5, true));
        assert_eq!(console.text_draws_at(5).len(), 1);
        assert!(entry.mark_unselected(&mut console, &theme, 5, true));
        assert!(!entry.mark_unselected(&mut console, &theme, 5, true));
        assert_eq!(console.text_draws_at(5).len(), 2);
    }

    #[test]
    fn hidden_entries_do_not_render() {
        let mut console = MockConsole::new();
        let entry = file("a.txt", 5);
        entry.render(&mut console, &ThemeColors::classic(), false, 5, true);
        assert!(console.draws().is_empty());
    }

    #[test]
    fn row_layout_is_name_type_size() {
        let entry = file("alpha.txt", 100);
        let row = entry.row_text();
        assert_eq!(row.chars().count(), ROW_WIDTH);
        assert!(row.starts_with("alpha.txt "));
        assert!(row.ends_with("   100"));
        assert_eq!(format_size(1_500_000), "1464K");
    }

    #[test]
    fn comparators_are_strict() {
        let small = file("b", 1);
        let big = file("A", 9);
        assert!(compare_size(&small, &big));
        assert!(!compare_size(&big, &small));
        assert!(!compare_size(&big, &big));
        assert!(compare_name(&small, &big));
        assert!(!compare_name(&big, &big));
        assert!(!compare_type(&small, &big));
    }
}
