#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

macro_rules! string_ids {
    ($($id:ident => $key:literal, $text:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StringId {
            $($id,)*
        }

        impl StringId {
            pub const ALL: &'static [StringId] = &[$(StringId::$id,)*];

            pub fn key(self) -> &'static str {
                match self {
                    $(StringId::$id => $key,)*
                }
            }

            fn english(self) -> &'static str {
                match self {
                    $(StringId::$id => $text,)*
                }
            }
        }
    };
}

string_ids! {
    AppTitle => "app_title", "f256commander";
    Welcome => "welcome", "Ready. Tab switches panels, Enter opens, q quits.";
    HeaderName => "header_name", "Name";
    HeaderType => "header_type", "Type";
    HeaderSize => "header_size", "Size";
    HeaderBank => "header_bank", "Bank";
    HeaderAddr => "header_addr", "Addr";
    SortName => "sort_name", "Name";
    SortSize => "sort_size", "Size";
    SortType => "sort_type", "Type";
    SortFixed => "sort_fixed", "Bank order";
    NoSelection => "no_selection", "Nothing selected";
    DiskOnly => "disk_only", "Only available on disk devices";
    MemoryOnly => "memory_only", "Only available for memory banks";
    DeviceShown => "device_shown", "Now showing {}";
    RefreshFailed => "refresh_failed", "Could not read {}: {}";
    MkdirTitle => "mkdir_title", "Make directory";
    MkdirPrompt => "mkdir_prompt", "Name for the new folder:";
    MkdirDone => "mkdir_done", "Created folder {}";
    MkdirFailed => "mkdir_failed", "Could not create folder {}: {}";
    FormatTitle => "format_title", "Format drive";
    FormatConfirm => "format_confirm", "All data on {} will be erased. Continue?";
    FormatPrompt => "format_prompt", "Volume name:";
    FormatDone => "format_done", "Formatted {} as {}";
    FormatFailed => "format_failed", "Format of {} failed: {}";
    RenameTitle => "rename_title", "Rename";
    RenamePrompt => "rename_prompt", "New name for {}:";
    RenameDone => "rename_done", "Renamed {} to {}";
    RenameFailed => "rename_failed", "Could not rename {}: {}";
    DeleteTitle => "delete_title", "Delete";
    DeleteConfirm => "delete_confirm", "Delete {}?";
    DeleteDone => "delete_done", "Deleted {}";
    DeleteFailed => "delete_failed", "Could not delete {}: {}";
    CopyTitle => "copy_title", "Copy";
    CopyOverwrite => "copy_overwrite", "{} already exists. Overwrite?";
    CopyPrompt => "copy_prompt", "Save bank {} as:";
    CopyDone => "copy_done", "Copied {} to {}";
    CopyFailed => "copy_failed", "Copy of {} failed: {}";
    CopyFolder => "copy_folder", "Folders cannot be copied: {}";
    ViewFailed => "view_failed", "Could not show {}: {}";
    OpenFailed => "open_failed", "Could not open {}: {}";
    FontLoaded => "font_loaded", "Loaded font {}";
    Launching => "launching", "Launching {}";
    BasicStaged => "basic_staged", "Starting BASIC with {} ({} bytes)";
    FillTitle => "fill_title", "Fill bank";
    FillPrompt => "fill_prompt", "Fill bank {} with hex byte:";
    FillInvalid => "fill_invalid", "Not a hex byte: {}";
    FillDone => "fill_done", "Filled bank {} with ${}";
    FillFailed => "fill_failed", "Could not write bank {}: {}";
    ClearTitle => "clear_title", "Clear bank";
    ClearConfirm => "clear_confirm", "Set every byte of bank {} to zero?";
    ClearDone => "clear_done", "Cleared bank {}";
    BankProtected => "bank_protected", "Bank {} is write-protected";
    ViewerMore => "viewer_more", "-- more -- any key continues, Esc quits";
    ViewerEnd => "viewer_end", "-- end -- press any key";
    DialogYesNo => "dialog_yes_no", "Y = Yes    N = No";
    DialogInput => "dialog_input", "Enter = OK    Esc = Cancel";
}

#[derive(Debug, Clone, Default)]
pub struct StringTable {
    overrides: HashMap<StringId, String>,
}

impl StringTable {
    pub fn english() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> (Self, Vec<String>) {
        let mut table = Self::default();
        let mut unknown = Vec::new();
        for (key, text) in overrides {
            match StringId::ALL.iter().find(|id| id.key() == key) {
                Some(id) => {
                    table.overrides.insert(*id, text.clone());
                }
                None => unknown.push(key.clone()),
            }
        }
        (table, unknown)
    }

    pub fn lookup(&self, id: StringId) -> &str {
        self.overrides.get(&id).map(String::as_str).unwrap_or_else(|| id.english())
    }

    /// Fills the template's `{}` placeholders with `args` in order. Surplus
    /// placeholders render empty.
    pub fn format(&self, id: StringId, args: &[&dyn Display]) -> String {
        let template = self.lookup(id);
        let mut out = String::with_capacity(template.len() + 16);
        let mut args = args.iter();
        let mut rest = template;
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            if let Some(arg) = args.next() {
                out.push_str(&arg.to_string());
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}
