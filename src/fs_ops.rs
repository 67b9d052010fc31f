#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::config::Config;
use crate::error::{HostError, HostResult};
use crate::host::{DirItem, Host, LaunchKind};
use crate::model::{BANK_SIZE, BANKS_PER_DEVICE, DeviceId, RESERVED_RAM_BANKS};

pub const VOLUME_FILE: &str = ".volume";

#[derive(Debug, Clone)]
struct Drive {
    root: PathBuf,
    allow_format: bool,
}

pub struct FsHost {
    drives: BTreeMap<DeviceId, Drive>,
    ram: Vec<Vec<u8>>,
    flash: Vec<Vec<u8>>,
    launcher: Option<String>,
    font: Option<Vec<u8>>,
    children: Vec<Child>,
}

impl FsHost {
    pub fn new() -> Self {
        Self {
            drives: BTreeMap::new(),
            ram: vec![vec![0; BANK_SIZE]; BANKS_PER_DEVICE],
            flash: vec![vec![0xFF; BANK_SIZE]; BANKS_PER_DEVICE],
            launcher: None,
            font: None,
            children: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> HostResult<Self> {
        let mut host = Self::new();
        for drive in &config.drives {
            host.mount(DeviceId(drive.id), drive.root.clone(), drive.allow_format);
        }
        if let Some(image) = &config.flash_image {
            host.load_flash_image(image)?;
        }
        host.launcher = config.launcher.clone();
        Ok(host)
    }

    pub fn mount(&mut self, device: DeviceId, root: PathBuf, allow_format: bool) {
        log::debug!("device {device} -> {}", root.display());
        self.drives.insert(device, Drive { root, allow_format });
    }

    pub fn load_flash_image(&mut self, path: &Path) -> HostResult<()> {
        let data = fs::read(path)?;
        if data.len() > BANK_SIZE * BANKS_PER_DEVICE {
            log::warn!("{} is larger than flash, ignoring the tail", path.display());
        }
        for (bank, chunk) in self.flash.iter_mut().zip(data.chunks(BANK_SIZE)) {
            bank[..chunk.len()].copy_from_slice(chunk);
        }
        Ok(())
    }

    pub fn loaded_font(&self) -> Option<&[u8]> {
        self.font.as_deref()
    }

    fn drive(&self, device: DeviceId) -> HostResult<&Drive> {
        let drive = self.drives.get(&device).ok_or(HostError::DeviceUnavailable(device))?;
        if !drive.root.is_dir() {
            return Err(HostError::DeviceUnavailable(device));
        }
        Ok(drive)
    }

    pub fn host_path(&self, path: &str) -> HostResult<PathBuf> {
        let (device, rest) = path.split_once(':').ok_or_else(|| HostError::InvalidPath(path.to_string()))?;
        let device: u8 = device.parse().map_err(|_| HostError::InvalidPath(path.to_string()))?;
        let mut resolved = self.drive(DeviceId(device))?.root.clone();
        for part in rest.split('/').filter(|part| !part.is_empty()) {
            if part == "." || part == ".." || part.contains('\\') {
                return Err(HostError::InvalidPath(path.to_string()));
            }
            resolved.push(part);
        }
        Ok(resolved)
    }

    fn is_root(path: &str) -> bool {
        path.split_once(':').is_some_and(|(_, rest)| rest.trim_matches('/').is_empty())
    }

    fn banks(&self, device: DeviceId) -> Option<&Vec<Vec<u8>>> {
        match device {
            DeviceId::RAM => Some(&self.ram),
            DeviceId::FLASH => Some(&self.flash),
            _ => None,
        }
    }
}

impl Default for FsHost {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io(err: io::Error, path: &str) -> HostError {
    match err.kind() {
        io::ErrorKind::NotFound => HostError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => HostError::AlreadyExists(path.to_string()),
        _ => HostError::Io(err),
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) }
}

fn volume_stamp(label: &str) -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let when = time::format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_default();
    format!("label={label}\nformatted={when}\n")
}

impl Host for FsHost {
    fn list_dir(&mut self, path: &str) -> HostResult<Vec<DirItem>> {
        let dir = self.host_path(path)?;
        let mut items = Vec::new();
        for item in fs::read_dir(&dir).map_err(|err| map_io(err, path))? {
            let item = item?;
            let name = item.file_name().to_string_lossy().to_string();
            if name == VOLUME_FILE {
                continue;
            }
            let metadata = item.metadata()?;
            items.push(DirItem { name, size: if metadata.is_dir() { 0 } else { metadata.len() }, is_dir: metadata.is_dir() });
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    fn open_read(&mut self, path: &str) -> HostResult<Box<dyn Read>> {
        let file = self.host_path(path)?;
        if file.is_dir() {
            return Err(HostError::InvalidPath(path.to_string()));
        }
        let file = File::open(&file).map_err(|err| map_io(err, path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create(&mut self, path: &str) -> HostResult<Box<dyn Write>> {
        let target = self.host_path(path)?;
        if target.is_dir() {
            return Err(HostError::AlreadyExists(path.to_string()));
        }
        let file = File::create(&target).map_err(|err| map_io(err, path))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn exists(&mut self, path: &str) -> bool {
        self.host_path(path).is_ok_and(|target| target.exists())
    }

    fn rename(&mut self, from: &str, to: &str) -> HostResult<()> {
        let (source, target) = (self.host_path(from)?, self.host_path(to)?);
        if !source.exists() {
            return Err(HostError::NotFound(from.to_string()));
        }
        if target.exists() {
            return Err(HostError::AlreadyExists(to.to_string()));
        }
        fs::rename(&source, &target).map_err(|err| map_io(err, to))
    }

    fn remove(&mut self, path: &str) -> HostResult<()> {
        if Self::is_root(path) {
            return Err(HostError::InvalidPath(path.to_string()));
        }
        let target = self.host_path(path)?;
        let result = if target.is_dir() { fs::remove_dir(&target) } else { fs::remove_file(&target) };
        result.map_err(|err| map_io(err, path))
    }

    fn mkdir(&mut self, path: &str) -> HostResult<()> {
        let target = self.host_path(path)?;
        fs::create_dir(&target).map_err(|err| map_io(err, path))
    }

    fn format(&mut self, device: DeviceId, label: &str) -> HostResult<()> {
        let drive = self.drive(device)?;
        if !drive.allow_format {
            return Err(HostError::Unsupported("format is disabled for this drive"));
        }
        let root = drive.root.clone();
        for item in fs::read_dir(&root)? {
            remove_path(&item?.path())?;
        }
        fs::write(root.join(VOLUME_FILE), volume_stamp(label))?;
        log::info!("formatted {} ({}) as {label:?}", device.label(), root.display());
        Ok(())
    }

    fn bank_count(&self, device: DeviceId) -> usize {
        self.banks(device).map_or(0, Vec::len)
    }

    fn read_bank(&mut self, device: DeviceId, bank: usize, buf: &mut [u8]) -> HostResult<()> {
        let slot = self.banks(device).and_then(|banks| banks.get(bank)).ok_or(HostError::NoSuchBank(bank))?;
        let len = buf.len().min(slot.len());
        buf[..len].copy_from_slice(&slot[..len]);
        Ok(())
    }

    fn write_bank(&mut self, device: DeviceId, bank: usize, data: &[u8]) -> HostResult<()> {
        if bank >= self.bank_count(device) {
            return Err(HostError::NoSuchBank(bank));
        }
        if !self.bank_writable(device, bank) {
            return Err(HostError::ReadOnly(bank));
        }
        let slot = &mut self.ram[bank];
        let len = data.len().min(BANK_SIZE);
        slot[..len].copy_from_slice(&data[..len]);
        slot[len..].fill(0);
        Ok(())
    }

    fn bank_writable(&self, device: DeviceId, bank: usize) -> bool {
        device == DeviceId::RAM && (RESERVED_RAM_BANKS..self.ram.len()).contains(&bank)
    }

    fn load_font(&mut self, data: &[u8]) -> HostResult<()> {
        log::info!("font of {} bytes loaded", data.len());
        self.font = Some(data.to_vec());
        Ok(())
    }

    fn launch(&mut self, path: &str, kind: LaunchKind) -> HostResult<()> {
        let Some(launcher) = self.launcher.clone() else {
            return Err(HostError::Unsupported("no launcher configured"));
        };
        let target = self.host_path(path)?;
        log::info!("launching {kind:?} {} with {launcher}", target.display());
        self.children.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        let child = Command::new(&launcher)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.children.push(child);
        Ok(())
    }

    fn run_basic(&mut self, first_bank: usize, len: usize) -> HostResult<()> {
        let end = first_bank + len.div_ceil(BANK_SIZE).max(1);
        if end > self.ram.len() {
            return Err(HostError::NoSuchBank(end - 1));
        }
        log::info!("BASIC hand-off: {len} bytes staged from bank {first_bank:#04x}");
        Ok(())
    }
}
