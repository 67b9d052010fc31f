#![forbid(unsafe_code)]

use std::io::{Read, Write};

use crate::error::HostResult;
use crate::model::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirItem {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    Executable,
    Image,
    Music,
}

pub trait Host {
    fn list_dir(&mut self, path: &str) -> HostResult<Vec<DirItem>>;
    fn open_read(&mut self, path: &str) -> HostResult<Box<dyn Read>>;
    fn create(&mut self, path: &str) -> HostResult<Box<dyn Write>>;
    fn exists(&mut self, path: &str) -> bool;
    fn rename(&mut self, from: &str, to: &str) -> HostResult<()>;
    fn remove(&mut self, path: &str) -> HostResult<()>;
    fn mkdir(&mut self, path: &str) -> HostResult<()>;
    fn format(&mut self, device: DeviceId, label: &str) -> HostResult<()>;

    /// Number of banks on a memory device; fixed for the device's lifetime.
    fn bank_count(&self, device: DeviceId) -> usize;
    fn read_bank(&mut self, device: DeviceId, bank: usize, buf: &mut [u8]) -> HostResult<()>;
    fn write_bank(&mut self, device: DeviceId, bank: usize, data: &[u8]) -> HostResult<()>;
    fn bank_writable(&self, device: DeviceId, bank: usize) -> bool;

    fn load_font(&mut self, data: &[u8]) -> HostResult<()>;
    fn launch(&mut self, path: &str, kind: LaunchKind) -> HostResult<()>;
    /// Hands control to BASIC with a program staged in RAM banks starting at
    /// `first_bank`. On the real machine this does not come back on success.
    fn run_basic(&mut self, first_bank: usize, len: usize) -> HostResult<()>;
}

pub fn read_all(host: &mut dyn Host, path: &str) -> HostResult<Vec<u8>> {
    let mut reader = host.open_read(path)?;
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}
