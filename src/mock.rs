#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use crate::console::{Color, Console, TextGrid, keys};
use crate::dialog::Dialogs;
use crate::error::{HostError, HostResult};
use crate::host::{DirItem, Host, LaunchKind};
use crate::model::{BANK_SIZE, BANKS_PER_DEVICE, DeviceId, RESERVED_RAM_BANKS, parent_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Text { x: u16, y: u16, text: String, fg: Color, bg: Color },
    Fill { x1: u16, y1: u16, x2: u16, y2: u16, ch: char },
    Invert { x1: u16, y1: u16, x2: u16, y2: u16 },
    Frame { x1: u16, y1: u16, x2: u16, y2: u16 },
}

#[derive(Debug, Clone)]
pub struct MockConsole {
    grid: TextGrid,
    keys: VecDeque<u8>,
    keys_read: usize,
    calls: Vec<DrawCall>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self::with_keys(&[])
    }

    pub fn with_keys(keys: &[u8]) -> Self {
        Self { grid: TextGrid::screen(), keys: keys.iter().copied().collect(), keys_read: 0, calls: Vec::new() }
    }

    pub fn push_keys(&mut self, keys: &[u8]) {
        self.keys.extend(keys.iter().copied());
    }

    pub fn grid(&self) -> &TextGrid {
        &self.grid
    }

    pub fn keys_read(&self) -> usize {
        self.keys_read
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear_draws(&mut self) {
        self.calls.clear();
    }

    pub fn text_draws_at(&self, y: u16) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { y: row, text, .. } if *row == y => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for MockConsole {
    fn draw_text(&mut self, x: u16, y: u16, text: &str, fg: Color, bg: Color) {
        self.calls.push(DrawCall::Text { x, y, text: text.to_string(), fg, bg });
        self.grid.draw_text(x, y, text, fg, bg);
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, ch: char, fg: Color, bg: Color) {
        self.calls.push(DrawCall::Fill { x1, y1, x2, y2, ch });
        self.grid.fill_rect(x1, y1, x2, y2, ch, fg, bg);
    }

    fn invert_rect(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) {
        self.calls.push(DrawCall::Invert { x1, y1, x2, y2 });
        self.grid.invert_rect(x1, y1, x2, y2);
    }

    fn draw_box(&mut self, x1: u16, y1: u16, x2: u16, y2: u16, fg: Color, bg: Color) {
        self.calls.push(DrawCall::Frame { x1, y1, x2, y2 });
        self.grid.draw_box(x1, y1, x2, y2, fg, bg);
    }

    fn read_key(&mut self) -> u8 {
        self.keys_read += 1;
        self.keys.pop_front().unwrap_or(keys::ESC)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Rc<RefCell<Vec<u8>>>),
}

struct NodeWriter(Rc<RefCell<Vec<u8>>>);

impl Write for NodeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

fn device_of(path: &str) -> Option<DeviceId> {
    let (id, _) = path.split_once(':')?;
    id.parse().ok().map(DeviceId)
}

#[derive(Debug, Clone)]
pub struct MockHost {
    nodes: BTreeMap<String, Node>,
    present: BTreeSet<DeviceId>,
    banks: BTreeMap<DeviceId, Vec<Vec<u8>>>,
    fail_ops: HashSet<&'static str>,
    pub fonts: Vec<Vec<u8>>,
    pub launched: Vec<(String, LaunchKind)>,
    pub basic_runs: Vec<(usize, usize)>,
    pub formats: Vec<(DeviceId, String)>,
}

impl MockHost {
    pub fn new() -> Self {
        let mut host = Self {
            nodes: BTreeMap::new(),
            present: BTreeSet::new(),
            banks: BTreeMap::new(),
            fail_ops: HashSet::new(),
            fonts: Vec::new(),
            launched: Vec::new(),
            basic_runs: Vec::new(),
            formats: Vec::new(),
        };
        for device in [DeviceId::SD_CARD, DeviceId::FLOPPY_1, DeviceId::FLOPPY_2] {
            host.insert_device(device);
        }
        for device in [DeviceId::RAM, DeviceId::FLASH] {
            host.banks.insert(device, vec![vec![0u8; BANK_SIZE]; BANKS_PER_DEVICE]);
        }
        host
    }

    pub fn insert_device(&mut self, device: DeviceId) {
        self.present.insert(device);
        self.nodes.insert(device.root_path(), Node::Dir);
    }

    pub fn eject(&mut self, device: DeviceId) {
        self.present.remove(&device);
        self.nodes.retain(|path, _| device_of(path) != Some(device));
    }

    pub fn fail_on(&mut self, op: &'static str) {
        self.fail_ops.insert(op);
    }

    pub fn add_dir(&mut self, path: &str) {
        self.nodes.insert(normalize(path), Node::Dir);
    }

    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        self.nodes.insert(normalize(path), Node::File(Rc::new(RefCell::new(data.to_vec()))));
    }

    pub fn exists_file(&self, path: &str) -> bool {
        matches!(self.nodes.get(&normalize(path)), Some(Node::File(_)))
    }

    pub fn exists_dir(&self, path: &str) -> bool {
        matches!(self.nodes.get(&normalize(path)), Some(Node::Dir))
    }

    pub fn file_data(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.get(&normalize(path)) {
            Some(Node::File(data)) => Some(data.borrow().clone()),
            _ => None,
        }
    }

    pub fn bank(&self, device: DeviceId, bank: usize) -> &[u8] {
        self.banks.get(&device).and_then(|banks| banks.get(bank)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_bank(&mut self, device: DeviceId, bank: usize, data: &[u8]) {
        if let Some(slot) = self.banks.get_mut(&device).and_then(|banks| banks.get_mut(bank)) {
            slot.fill(0);
            let len = data.len().min(BANK_SIZE);
            slot[..len].copy_from_slice(&data[..len]);
        }
    }

    fn check(&self, op: &'static str) -> HostResult<()> {
        if self.fail_ops.contains(op) {
            return Err(HostError::Io(io::Error::other(format!("injected {op} failure"))));
        }
        Ok(())
    }

    fn check_device(&self, path: &str) -> HostResult<()> {
        match device_of(path) {
            Some(device) if self.present.contains(&device) => Ok(()),
            Some(device) => Err(HostError::DeviceUnavailable(device)),
            None => Err(HostError::InvalidPath(path.to_string())),
        }
    }

    fn check_parent(&self, path: &str) -> HostResult<()> {
        let parent = parent_path(path).ok_or_else(|| HostError::InvalidPath(path.to_string()))?;
        match self.nodes.get(&parent) {
            Some(Node::Dir) => Ok(()),
            _ => Err(HostError::NotFound(parent)),
        }
    }

    fn has_children(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.nodes.keys().any(|key| key.starts_with(&prefix))
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn list_dir(&mut self, path: &str) -> HostResult<Vec<DirItem>> {
        self.check("list_dir")?;
        let path = normalize(path);
        self.check_device(&path)?;
        if !self.exists_dir(&path) {
            return Err(HostError::NotFound(path));
        }
        let items = self
            .nodes
            .iter()
            .filter(|(key, _)| parent_path(key).as_deref() == Some(path.as_str()))
            .map(|(key, node)| DirItem {
                name: crate::model::file_name(key).to_string(),
                size: match node {
                    Node::Dir => 0,
                    Node::File(data) => data.borrow().len() as u64,
                },
                is_dir: matches!(node, Node::Dir),
            })
            .collect();
        Ok(items)
    }

    fn open_read(&mut self, path: &str) -> HostResult<Box<dyn Read>> {
        self.check("open_read")?;
        self.check_device(path)?;
        match self.nodes.get(&normalize(path)) {
            Some(Node::File(data)) => Ok(Box::new(Cursor::new(data.borrow().clone()))),
            _ => Err(HostError::NotFound(path.to_string())),
        }
    }

    fn create(&mut self, path: &str) -> HostResult<Box<dyn Write>> {
        self.check("create")?;
        self.check_device(path)?;
        let path = normalize(path);
        self.check_parent(&path)?;
        if self.exists_dir(&path) {
            return Err(HostError::AlreadyExists(path));
        }
        let data = Rc::new(RefCell::new(Vec::new()));
        self.nodes.insert(path, Node::File(Rc::clone(&data)));
        Ok(Box::new(NodeWriter(data)))
    }

    fn exists(&mut self, path: &str) -> bool {
        self.nodes.contains_key(&normalize(path))
    }

    fn rename(&mut self, from: &str, to: &str) -> HostResult<()> {
        self.check("rename")?;
        self.check_device(from)?;
        let (from, to) = (normalize(from), normalize(to));
        if !self.nodes.contains_key(&from) {
            return Err(HostError::NotFound(from));
        }
        if self.nodes.contains_key(&to) {
            return Err(HostError::AlreadyExists(to));
        }
        self.check_parent(&to)?;
        let prefix = format!("{from}/");
        let moved: Vec<String> =
            self.nodes.keys().filter(|key| **key == from || key.starts_with(&prefix)).cloned().collect();
        for key in moved {
            if let Some(node) = self.nodes.remove(&key) {
                let renamed = format!("{to}{}", &key[from.len()..]);
                self.nodes.insert(renamed, node);
            }
        }
        Ok(())
    }

    fn remove(&mut self, path: &str) -> HostResult<()> {
        self.check("remove")?;
        self.check_device(path)?;
        let path = normalize(path);
        if parent_path(&path).is_none() {
            return Err(HostError::InvalidPath(path));
        }
        if !self.nodes.contains_key(&path) {
            return Err(HostError::NotFound(path));
        }
        if self.has_children(&path) {
            return Err(HostError::Io(io::Error::other(format!("{path} is not empty"))));
        }
        self.nodes.remove(&path);
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> HostResult<()> {
        self.check("mkdir")?;
        self.check_device(path)?;
        let path = normalize(path);
        if self.nodes.contains_key(&path) {
            return Err(HostError::AlreadyExists(path));
        }
        self.check_parent(&path)?;
        self.nodes.insert(path, Node::Dir);
        Ok(())
    }

    fn format(&mut self, device: DeviceId, label: &str) -> HostResult<()> {
        self.check("format")?;
        if !self.present.contains(&device) {
            return Err(HostError::DeviceUnavailable(device));
        }
        let root = device.root_path();
        let prefix = format!("{root}/");
        self.nodes.retain(|key, _| !key.starts_with(&prefix));
        self.formats.push((device, label.to_string()));
        Ok(())
    }

    fn bank_count(&self, device: DeviceId) -> usize {
        self.banks.get(&device).map_or(0, Vec::len)
    }

    fn read_bank(&mut self, device: DeviceId, bank: usize, buf: &mut [u8]) -> HostResult<()> {
        self.check("read_bank")?;
        let slot = self.banks.get(&device).and_then(|banks| banks.get(bank)).ok_or(HostError::NoSuchBank(bank))?;
        let len = buf.len().min(slot.len());
        buf[..len].copy_from_slice(&slot[..len]);
        Ok(())
    }

    fn write_bank(&mut self, device: DeviceId, bank: usize, data: &[u8]) -> HostResult<()> {
        self.check("write_bank")?;
        if bank >= self.bank_count(device) {
            return Err(HostError::NoSuchBank(bank));
        }
        if !self.bank_writable(device, bank) {
            return Err(HostError::ReadOnly(bank));
        }
        self.set_bank(device, bank, data);
        Ok(())
    }

    fn bank_writable(&self, device: DeviceId, bank: usize) -> bool {
        device == DeviceId::RAM && (RESERVED_RAM_BANKS..self.bank_count(device)).contains(&bank)
    }

    fn load_font(&mut self, data: &[u8]) -> HostResult<()> {
        self.check("load_font")?;
        self.fonts.push(data.to_vec());
        Ok(())
    }

    fn launch(&mut self, path: &str, kind: LaunchKind) -> HostResult<()> {
        self.check("launch")?;
        self.launched.push((path.to_string(), kind));
        Ok(())
    }

    fn run_basic(&mut self, first_bank: usize, len: usize) -> HostResult<()> {
        self.check("run_basic")?;
        self.basic_runs.push((first_bank, len));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDialogs {
    confirms: VecDeque<bool>,
    prompts: VecDeque<Option<String>>,
    asked: Vec<String>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }

    pub fn answer_with(mut self, answer: Option<&str>) -> Self {
        self.prompts.push_back(answer.map(str::to_string));
        self
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Dialogs for ScriptedDialogs {
    fn confirm(&mut self, _console: &mut dyn Console, title: &str, _body: &str) -> bool {
        self.asked.push(title.to_string());
        self.confirms.pop_front().unwrap_or(false)
    }

    fn prompt_text(
        &mut self,
        _console: &mut dyn Console,
        title: &str,
        _body: &str,
        _prefill: &str,
        max_len: usize,
    ) -> Option<String> {
        self.asked.push(title.to_string());
        let answer = self.prompts.pop_front().flatten()?;
        Some(answer.chars().take(max_len).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_host_lists_direct_children_only() {
        let mut host = MockHost::new();
        host.add_dir("0:/games");
        host.add_file("0:/games/a.pgz", b"abc");
        host.add_file("0:/readme.txt", b"hi");
        let names: Vec<_> = host.list_dir("0:").expect("list").into_iter().map(|item| item.name).collect();
        assert_eq!(names, vec!["games", "readme.txt"]);
        let inner = host.list_dir("0:/games").expect("list");
        assert_eq!(inner[0].size, 3);
    }

    #[test]
    fn written_files_are_visible_to_readers() {
        let mut host = MockHost::new();
        let mut out = host.create("1:/x.bin").expect("create");
        out.write_all(b"payload").expect("write");
        drop(out);
        assert_eq!(host.file_data("1:/x.bin").as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn ejected_devices_are_unavailable() {
        let mut host = MockHost::new();
        host.eject(DeviceId::FLOPPY_2);
        assert!(matches!(host.list_dir("2:"), Err(HostError::DeviceUnavailable(DeviceId::FLOPPY_2))));
    }

    #[test]
    fn scripted_keys_fall_back_to_escape() {
        let mut console = MockConsole::with_keys(b"y");
        assert_eq!(console.read_key(), b'y');
        assert_eq!(console.read_key(), keys::ESC);
        assert_eq!(console.keys_read(), 2);
    }
}
