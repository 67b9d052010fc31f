#![forbid(unsafe_code)]

use crate::entry::{Entry, NewEntry, compare_name, compare_size, compare_type};
use crate::error::HostResult;
use crate::host::Host;
use crate::model::{DeviceId, FileType, ListItem, Listing, SortBy, hint_from_extension, join_path, parent_path};

#[derive(Debug, Clone)]
pub struct Folder {
    device: DeviceId,
    path: String,
    files: Vec<Entry>,
    current_row: Option<usize>,
}

impl Folder {
    pub fn new(device: DeviceId) -> Self {
        Self::at(device, &device.root_path())
    }

    pub fn at(device: DeviceId, path: &str) -> Self {
        Self { device, path: path.to_string(), files: Vec::new(), current_row: None }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent_path(&self) -> Option<String> {
        parent_path(&self.path)
    }

    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.current_row = None;
    }

    /// Rebuilds the listing from the host. Existing entries are dropped
    /// first, so a failed listing leaves the folder empty.
    pub fn populate(&mut self, host: &mut dyn Host) -> HostResult<()> {
        self.clear();
        let items = host.list_dir(&self.path)?;
        if let Some(parent) = self.parent_path() {
            match Entry::create(NewEntry {
                name: Some(".."),
                path: &parent,
                is_directory: true,
                size: 0,
                type_hint: FileType::Directory,
                device: self.device,
                unit: 0,
                row: 0,
            }) {
                Ok(entry) => self.files.push(entry),
                Err(err) => log::warn!("no parent link for {}: {err}", self.path),
            }
        }
        for item in items {
            let path = self.child_path(&item.name);
            let row = self.files.len();
            let created = Entry::create(NewEntry {
                name: Some(&item.name),
                path: &path,
                is_directory: item.is_dir,
                size: item.size,
                type_hint: hint_from_extension(&item.name),
                device: self.device,
                unit: 0,
                row,
            });
            match created {
                Ok(entry) => self.files.push(entry),
                Err(err) => log::warn!("skipping {path}: {err}"),
            }
        }
        log::debug!("listed {} entries in {}", self.files.len(), self.path);
        Ok(())
    }

    pub fn sort(&mut self, sort_by: SortBy) {
        let start = usize::from(self.files.first().is_some_and(Entry::is_parent_link));
        let after: fn(&Entry, &Entry) -> bool = match sort_by {
            SortBy::Name => compare_name,
            SortBy::Size => compare_size,
            SortBy::Type => compare_type,
        };
        self.files[start..].sort_by(|a, b| SortBy::ordering(after, a, b));
        for (row, entry) in self.files.iter_mut().enumerate() {
            entry.position_mut().absolute_row = row;
        }
    }

    pub fn current_file(&self) -> Option<&Entry> {
        self.current_item()
    }

    pub fn current_file_mut(&mut self) -> Option<&mut Entry> {
        let row = self.current_row?;
        self.files.get_mut(row)
    }

    pub fn find_row_by_name(&self, name: &str) -> Option<usize> {
        self.files
            .iter()
            .position(|entry| entry.name() == name)
            .or_else(|| self.files.iter().position(|entry| entry.name().eq_ignore_ascii_case(name)))
    }
}

impl Listing for Folder {
    type Item = Entry;

    fn items(&self) -> &[Entry] {
        &self.files
    }

    fn items_mut(&mut self) -> &mut [Entry] {
        &mut self.files
    }

    fn current_row(&self) -> Option<usize> {
        self.current_row
    }

    fn set_current_row(&mut self, row: Option<usize>) {
        self.current_row = row.filter(|&r| r < self.files.len());
    }
}
