#![forbid(unsafe_code)]

use std::io::Cursor;

use crate::console::{Console, fit};
use crate::error::{HostError, HostResult};
use crate::host::Host;
use crate::model::{BANK_SIZE, DeviceId, FileType, ListItem, Listing, RowPosition};
use crate::strings::StringTable;
use crate::theme::ThemeColors;
use crate::viewer::{PagedViewer, ViewEnd, ViewMode};

pub const BANK_ROW_WIDTH: usize = 33;
const BANK_NAME_WIDTH: usize = 21;
const PROGRAM_SIGNATURE: [u8; 2] = [0xF2, 0x56];
const PROGRAM_NAME_OFFSET: usize = 10;
const PROGRAM_NAME_MAX: usize = 32;

pub fn program_name(data: &[u8]) -> Option<String> {
    if data.len() < PROGRAM_NAME_OFFSET + 1 || data[..2] != PROGRAM_SIGNATURE {
        return None;
    }
    let name: String = data[PROGRAM_NAME_OFFSET..]
        .iter()
        .take(PROGRAM_NAME_MAX)
        .take_while(|&&b| b != 0)
        .map(|&b| crate::console::glyph(b))
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    index: usize,
    address: u32,
    name: String,
    file_type: FileType,
    writable: bool,
    empty: bool,
    selected: bool,
    position: RowPosition,
}

impl Bank {
    fn blank(device: DeviceId, index: usize) -> Bank {
        Bank {
            index,
            address: device.base_address() + (index * BANK_SIZE) as u32,
            name: String::new(),
            file_type: FileType::Other,
            writable: false,
            empty: true,
            selected: false,
            position: RowPosition::at_row(index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn rescan(&mut self, host: &mut dyn Host, device: DeviceId) {
        self.writable = host.bank_writable(device, self.index);
        let mut data = vec![0u8; BANK_SIZE];
        if let Err(err) = host.read_bank(device, self.index, &mut data) {
            log::warn!("reading bank {} of {} failed: {err}", self.index, device.label());
            self.name = "<unreadable>".to_string();
            self.file_type = FileType::Other;
            self.empty = false;
            return;
        }
        if let Some(name) = program_name(&data) {
            self.name = name;
            self.file_type = FileType::Executable;
            self.empty = false;
        } else if data.iter().all(|&b| b == 0x00) || data.iter().all(|&b| b == 0xFF) {
            self.name = "<empty>".to_string();
            self.file_type = FileType::Other;
            self.empty = true;
        } else {
            self.name = "<data>".to_string();
            self.file_type = FileType::Other;
            self.empty = false;
        }
    }

    pub fn read(&self, host: &mut dyn Host, device: DeviceId) -> HostResult<Vec<u8>> {
        let mut data = vec![0u8; BANK_SIZE];
        host.read_bank(device, self.index, &mut data)?;
        Ok(data)
    }

    pub fn write(&mut self, host: &mut dyn Host, device: DeviceId, data: &[u8]) -> HostResult<()> {
        if !self.writable {
            return Err(HostError::ReadOnly(self.index));
        }
        host.write_bank(device, self.index, &data[..data.len().min(BANK_SIZE)])?;
        self.rescan(host, device);
        Ok(())
    }

    pub fn fill(&mut self, host: &mut dyn Host, device: DeviceId, value: u8) -> HostResult<()> {
        self.write(host, device, &[value; BANK_SIZE])
    }

    pub fn clear(&mut self, host: &mut dyn Host, device: DeviceId) -> HostResult<()> {
        self.fill(host, device, 0)
    }

    pub fn view(
        &self,
        host: &mut dyn Host,
        device: DeviceId,
        console: &mut dyn Console,
        theme: &ThemeColors,
        strings: &StringTable,
        mode: ViewMode,
    ) -> HostResult<ViewEnd> {
        let data = self.read(host, device)?;
        let title = format!("{} bank ${:02X} @ ${:05X}", device.label(), self.index, self.address);
        let mut viewer = PagedViewer::new(mode, self.address);
        Ok(viewer.run(&mut Cursor::new(data), console, theme, strings, &title)?)
    }

    pub fn row_text(&self) -> String {
        let row = format!("{:02X}   {:05X}  {}", self.index, self.address, fit(&self.name, BANK_NAME_WIDTH));
        fit(&row, BANK_ROW_WIDTH)
    }
}

impl ListItem for Bank {
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
        let fg = if self.writable { theme.file_fg(as_active) } else { theme.panel_border_inactive };
        console.draw_text(x, y, &self.row_text(), fg, theme.panel_bg);
        if as_selected {
            console.invert_rect(x, y, x + BANK_ROW_WIDTH as u16 - 1, y);
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemorySystem {
    device: DeviceId,
    banks: Vec<Bank>,
    current_row: Option<usize>,
}

impl MemorySystem {
    pub fn new(host: &dyn Host, device: DeviceId) -> Self {
        let banks = (0..host.bank_count(device)).map(|idx| Bank::blank(device, idx)).collect();
        Self { device, banks, current_row: None }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn populate(&mut self, host: &mut dyn Host) {
        let device = self.device;
        for bank in self.banks.iter_mut() {
            let index = bank.index;
            *bank = Bank::blank(device, index);
            bank.rescan(host, device);
        }
        self.current_row = None;
    }

    pub fn current_bank(&self) -> Option<&Bank> {
        self.current_item()
    }

    pub fn bank_mut(&mut self, row: usize) -> Option<&mut Bank> {
        self.banks.get_mut(row)
    }

    pub fn stage(&mut self, host: &mut dyn Host, first: usize, data: &[u8]) -> HostResult<usize> {
        let device = self.device;
        stage_into_banks(host, device, first, data)?;
        let count = data.len().div_ceil(BANK_SIZE).max(1);
        for bank in self.banks.iter_mut().skip(first).take(count) {
            bank.rescan(host, device);
        }
        Ok(count)
    }
}

/// Writes `data` into consecutive banks of `device` starting at `first`,
/// checking every target bank before the first write.
pub fn stage_into_banks(host: &mut dyn Host, device: DeviceId, first: usize, data: &[u8]) -> HostResult<usize> {
    let count = data.len().div_ceil(BANK_SIZE).max(1);
    let total = host.bank_count(device);
    for bank in first..first + count {
        if bank >= total {
            return Err(HostError::NoSuchBank(bank));
        }
        if !host.bank_writable(device, bank) {
            return Err(HostError::ReadOnly(bank));
        }
    }
    for (offset, chunk) in data.chunks(BANK_SIZE).enumerate() {
        let mut block = vec![0u8; BANK_SIZE];
        block[..chunk.len()].copy_from_slice(chunk);
        host.write_bank(device, first + offset, &block)?;
    }
    if data.is_empty() {
        host.write_bank(device, first, &[0u8; BANK_SIZE])?;
    }
    Ok(count)
}

impl Listing for MemorySystem {
    type Item = Bank;

    fn items(&self) -> &[Bank] {
        &self.banks
    }

    fn items_mut(&mut self) -> &mut [Bank] {
        &mut self.banks
    }

    fn current_row(&self) -> Option<usize> {
        self.current_row
    }

    fn set_current_row(&mut self, row: Option<usize>) {
        self.current_row = row.filter(|&r| r < self.banks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockHost;
    use crate::model::{BANKS_PER_DEVICE, RESERVED_RAM_BANKS};

    fn program_image(name: &str) -> Vec<u8> {
        let mut data = vec![0u8; BANK_SIZE];
        data[..2].copy_from_slice(&PROGRAM_SIGNATURE);
        data[2] = 1;
        data[3] = 5;
        data[4..6].copy_from_slice(&0xA000u16.to_le_bytes());
        data[PROGRAM_NAME_OFFSET..PROGRAM_NAME_OFFSET + name.len()].copy_from_slice(name.as_bytes());
        data
    }

    #[test]
    fn program_header_names_the_bank() {
        assert_eq!(program_name(&program_image("dcopy")).as_deref(), Some("dcopy"));
        assert_eq!(program_name(&[0u8; 32]), None);
    }

    #[test]
    fn populate_keeps_the_fixed_slot_count() {
        let mut host = MockHost::new();
        host.write_bank(DeviceId::RAM, 9, &program_image("hello")).expect("write");
        let mut system = MemorySystem::new(&host, DeviceId::RAM);
        assert_eq!(system.len(), BANKS_PER_DEVICE);
        system.populate(&mut host);
        system.populate(&mut host);
        assert_eq!(system.len(), BANKS_PER_DEVICE);
        let bank = &system.items()[9];
        assert_eq!(bank.name(), "hello");
        assert_eq!(bank.file_type(), FileType::Executable);
        assert_eq!(bank.address(), 9 * BANK_SIZE as u32);
        assert!(system.items()[10].is_empty());
        assert!(!system.items()[0].is_writable());
        assert!(system.items()[RESERVED_RAM_BANKS].is_writable());
    }

    #[test]
    fn protected_banks_refuse_writes() {
        let mut host = MockHost::new();
        let mut system = MemorySystem::new(&host, DeviceId::FLASH);
        system.populate(&mut host);
        let bank = system.bank_mut(12).expect("bank");
        assert!(matches!(bank.fill(&mut host, DeviceId::FLASH, 0xEA), Err(HostError::ReadOnly(12))));
    }

    #[test]
    fn fill_and_clear_update_contents() {
        let mut host = MockHost::new();
        let mut system = MemorySystem::new(&host, DeviceId::RAM);
        system.populate(&mut host);
        let bank = system.bank_mut(20).expect("bank");
        bank.fill(&mut host, DeviceId::RAM, 0x42).expect("fill");
        assert_eq!(bank.name(), "<data>");
        assert_eq!(host.bank(DeviceId::RAM, 20)[100], 0x42);
        bank.clear(&mut host, DeviceId::RAM).expect("clear");
        assert!(bank.is_empty());
    }

    #[test]
    fn staging_spans_banks_and_checks_all_targets_first() {
        let mut host = MockHost::new();
        let data = vec![7u8; BANK_SIZE + 10];
        assert_eq!(stage_into_banks(&mut host, DeviceId::RAM, 0x10, &data).expect("stage"), 2);
        assert_eq!(host.bank(DeviceId::RAM, 0x11)[9], 7);
        assert_eq!(host.bank(DeviceId::RAM, 0x11)[10], 0);
        let last = BANKS_PER_DEVICE - 1;
        assert!(matches!(
            stage_into_banks(&mut host, DeviceId::RAM, last, &data),
            Err(HostError::NoSuchBank(_))
        ));
        assert_eq!(host.bank(DeviceId::RAM, last)[0], 0);
    }

    #[test]
    fn bank_rows_fit_the_panel() {
        let mut host = MockHost::new();
        let mut system = MemorySystem::new(&host, DeviceId::FLASH);
        system.populate(&mut host);
        let row = system.items()[1].row_text();
        assert_eq!(row.chars().count(), BANK_ROW_WIDTH);
        assert!(row.starts_with("01   82000  <empty>"));
    }
}
