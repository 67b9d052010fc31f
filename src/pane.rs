#![forbid(unsafe_code)]

use std::io::{self, Write};

use crate::bank::{Bank, MemorySystem, stage_into_banks};
use crate::console::{fit, fit_right};
use crate::context::Ctx;
use crate::entry::{NAME_COL_WIDTH, SIZE_COL_WIDTH, TYPE_COL_WIDTH};
use crate::error::{HostError, HostResult, PanelError, PanelResult};
use crate::folder::Folder;
use crate::host::{Host, LaunchKind, read_all};
use crate::model::{
    BANK_SIZE, BASIC_STAGING_BANK, DeviceId, FileType, ListItem, Listing, MAX_NAME_LEN, SortBy, file_name,
};
use crate::strings::StringId;
use crate::ui::{LEFT_PANEL_X, PANEL_CONTENT_HEIGHT, PANEL_CONTENT_Y, PANEL_INNER_WIDTH, RIGHT_PANEL_X, draw_sort_indicator};
use crate::viewer::ViewMode;

const VOLUME_LABEL_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PanelContent {
    Disk(Folder),
    Memory(MemorySystem),
}

macro_rules! with_listing {
    ($content:expr, $listing:ident => $body:expr) => {
        match $content {
            PanelContent::Disk($listing) => $body,
            PanelContent::Memory($listing) => $body,
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Done,
    Failed,
    HandedOff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Focus {
    Name(String),
    Row(usize),
    Top,
}

#[derive(Debug, Clone)]
pub struct Panel {
    side: Side,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    content_top: usize,
    active: bool,
    device: DeviceId,
    sort_by: SortBy,
    content: PanelContent,
}

const MIN_VIEWPORT_X: u16 = 1;
const MIN_VIEWPORT_Y: u16 = 3;

fn empty_content(host: &dyn Host, device: DeviceId) -> PanelContent {
    if device.is_memory() {
        PanelContent::Memory(MemorySystem::new(host, device))
    } else {
        PanelContent::Disk(Folder::new(device))
    }
}

fn reflow_items<T: ListItem>(items: &mut [T], col: u16, top: usize, height: usize) {
    for (row, item) in items.iter_mut().enumerate() {
        let position = item.position_mut();
        position.col = col;
        position.absolute_row = row;
        position.display_row = (row >= top && row < top + height).then(|| (row - top) as u16);
    }
}

fn select_only<L: Listing>(listing: &mut L, row: Option<usize>) {
    for item in listing.items_mut() {
        item.set_selected(false);
    }
    listing.set_current_row(row);
    if let Some(row) = row {
        if let Some(item) = listing.items_mut().get_mut(row) {
            item.set_selected(true);
        }
    }
}

fn copy_file(host: &mut dyn Host, from: &str, to: &str) -> HostResult<u64> {
    let mut reader = host.open_read(from)?;
    let mut writer = host.create(to)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}

fn write_file(host: &mut dyn Host, path: &str, data: &[u8]) -> HostResult<()> {
    let mut writer = host.create(path)?;
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

fn parse_hex_byte(text: &str) -> Option<u8> {
    let digits = text.trim().trim_start_matches('$').trim_start_matches("0x");
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

impl Panel {
    pub fn new(side: Side, device: DeviceId, host: &dyn Host) -> Self {
        let x = match side {
            Side::Left => LEFT_PANEL_X,
            Side::Right => RIGHT_PANEL_X,
        };
        Self::with_viewport(side, device, host, x, PANEL_CONTENT_Y, PANEL_CONTENT_HEIGHT)
    }

    /// A panel whose list area starts at `(x, y)` and shows `height` rows.
    /// The frame, title tab and column header are drawn above and left of
    /// it, so the origin is clamped to at least `(1, 3)`.
    pub fn with_viewport(side: Side, device: DeviceId, host: &dyn Host, x: u16, y: u16, height: u16) -> Self {
        Self {
            side,
            x: x.max(MIN_VIEWPORT_X),
            y: y.max(MIN_VIEWPORT_Y),
            width: PANEL_INNER_WIDTH,
            height: height.max(1),
            content_top: 0,
            active: false,
            device,
            sort_by: SortBy::Name,
            content: empty_content(host, device),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    pub fn folder(&self) -> Option<&Folder> {
        match &self.content {
            PanelContent::Disk(folder) => Some(folder),
            PanelContent::Memory(_) => None,
        }
    }

    pub fn memory(&self) -> Option<&MemorySystem> {
        match &self.content {
            PanelContent::Memory(memory) => Some(memory),
            PanelContent::Disk(_) => None,
        }
    }

    pub fn content_top(&self) -> usize {
        self.content_top
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn total_rows(&self) -> usize {
        with_listing!(&self.content, listing => listing.len())
    }

    pub fn current_row(&self) -> Option<usize> {
        with_listing!(&self.content, listing => listing.current_row())
    }

    pub fn display_row_of(&self, row: usize) -> Option<u16> {
        with_listing!(&self.content, listing => listing.find_by_row(row).and_then(|item| item.position().display_row))
    }

    fn current_name(&self) -> Option<String> {
        with_listing!(&self.content, listing => listing.current_item().map(|item| item.display_name().to_string()))
    }

    fn sort_label(&self) -> StringId {
        match (&self.content, self.sort_by) {
            (PanelContent::Memory(_), _) => StringId::SortFixed,
            (PanelContent::Disk(_), SortBy::Name) => StringId::SortName,
            (PanelContent::Disk(_), SortBy::Size) => StringId::SortSize,
            (PanelContent::Disk(_), SortBy::Type) => StringId::SortType,
        }
    }

    pub fn switch_device(&mut self, ctx: &mut Ctx<'_>, device: DeviceId) -> bool {
        if !device.is_valid() {
            log::warn!("ignoring switch to unknown device {device}");
            return false;
        }
        log::debug!("{:?} panel: {} -> {}", self.side, self.device.label(), device.label());
        self.content = empty_content(ctx.host, device);
        self.device = device;
        self.content_top = 0;
        let ok = self.reload(ctx, Focus::Top);
        if ok {
            ctx.post(StringId::DeviceShown, &[&device.label()]);
        }
        ok
    }

    pub fn refresh(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let focus = match (self.current_name(), self.current_row()) {
            (Some(name), _) if self.folder().is_some() => Focus::Name(name),
            (_, Some(row)) => Focus::Row(row),
            _ => Focus::Top,
        };
        self.content_top = 0;
        self.reload(ctx, focus)
    }

    fn reload(&mut self, ctx: &mut Ctx<'_>, focus: Focus) -> bool {
        let ok = match &mut self.content {
            PanelContent::Disk(folder) => match folder.populate(ctx.host) {
                Ok(()) => true,
                Err(err) => {
                    folder.clear();
                    let path = folder.path().to_string();
                    ctx.post(StringId::RefreshFailed, &[&path, &err]);
                    false
                }
            },
            PanelContent::Memory(memory) => {
                memory.populate(ctx.host);
                true
            }
        };
        self.sort_with_focus(ctx, self.sort_by, focus);
        ok
    }

    pub fn reflow(&mut self) {
        let height = self.height as usize;
        self.content_top = self.content_top.min(self.total_rows().saturating_sub(height));
        let (col, top) = (self.x, self.content_top);
        with_listing!(&mut self.content, listing => reflow_items(listing.items_mut(), col, top, height));
    }

    pub fn render_contents(&self, ctx: &mut Ctx<'_>) {
        let theme = ctx.theme;
        let (x, y, width, height) = (self.x, self.y, self.width, self.height);
        let right = x + width - 1;
        let bottom = y + height;
        ctx.console.draw_box(x - 1, y - 2, right + 1, bottom, theme.border(self.active), theme.panel_bg);
        ctx.console.fill_rect(x, y - 1, right, bottom - 1, ' ', theme.file_fg(self.active), theme.panel_bg);

        let header = match &self.content {
            PanelContent::Disk(_) => format!(
                "{} {} {}",
                fit(ctx.strings.lookup(StringId::HeaderName), NAME_COL_WIDTH),
                fit(ctx.strings.lookup(StringId::HeaderType), TYPE_COL_WIDTH),
                fit_right(ctx.strings.lookup(StringId::HeaderSize), SIZE_COL_WIDTH)
            ),
            PanelContent::Memory(_) => format!(
                "{} {} {}",
                fit(ctx.strings.lookup(StringId::HeaderBank), 4),
                fit(ctx.strings.lookup(StringId::HeaderAddr), 6),
                ctx.strings.lookup(StringId::HeaderName)
            ),
        };
        ctx.console.draw_text(x, y - 1, &fit(&header, width as usize), theme.header_fg, theme.panel_bg);

        with_listing!(&self.content, listing => {
            for item in listing.items() {
                item.render(ctx.console, theme, item.is_selected(), y, self.active);
            }
        });

        let title = match &self.content {
            PanelContent::Disk(folder) => folder.path().to_string(),
            PanelContent::Memory(memory) => memory.device().label().to_string(),
        };
        let tab = format!(" {} ", fit(&title, width as usize - 2).trim_end());
        let tab_y = y - 3;
        ctx.console.fill_rect(x - 1, tab_y, right + 1, tab_y, ' ', theme.screen_fg, theme.screen_bg);
        ctx.console.draw_text(x, tab_y, &tab, theme.title_fg, theme.title_bg);
        if self.active {
            let tab_end = x + tab.chars().count() as u16 - 1;
            ctx.console.invert_rect(x, tab_y, tab_end, tab_y);
        }

        let label = ctx.strings.lookup(self.sort_label());
        draw_sort_indicator(ctx.console, theme, x + 1, bottom, label, self.active);
    }

    pub fn sort_and_display(&mut self, ctx: &mut Ctx<'_>, sort_by: SortBy) {
        let focus = match (self.current_name(), self.current_row()) {
            (Some(name), _) if self.folder().is_some() => Focus::Name(name),
            (_, Some(row)) => Focus::Row(row),
            _ => Focus::Top,
        };
        self.sort_with_focus(ctx, sort_by, focus);
    }

    fn sort_with_focus(&mut self, ctx: &mut Ctx<'_>, sort_by: SortBy, focus: Focus) {
        if let PanelContent::Disk(folder) = &mut self.content {
            self.sort_by = sort_by;
            folder.sort(sort_by);
        }
        let total = self.total_rows();
        let row = match focus {
            Focus::Name(name) => self
                .folder()
                .and_then(|folder| folder.find_row_by_name(&name))
                .or_else(|| (total > 0).then_some(0)),
            Focus::Row(row) if total > 0 => Some(row.min(total - 1)),
            _ => (total > 0).then_some(0),
        };
        with_listing!(&mut self.content, listing => select_only(listing, row));
        if let Some(row) = row {
            self.ensure_visible(row);
        }
        self.reflow();
        self.render_contents(ctx);
    }

    fn ensure_visible(&mut self, row: usize) {
        let height = self.height as usize;
        if row < self.content_top {
            self.content_top = row;
        } else if row >= self.content_top + height {
            self.content_top = row + 1 - height;
        }
    }

    /// Selects (or deselects) `row`. Selecting moves the current row; a row
    /// outside the window scrolls it by one step toward the row.
    pub fn set_selection_by_row(&mut self, ctx: &mut Ctx<'_>, row: usize, select: bool) -> bool {
        if row >= self.total_rows() {
            return false;
        }
        let (y, active) = (self.y, self.active);
        if !select {
            return with_listing!(&mut self.content, listing => {
                listing.items_mut()[row].mark_unselected(ctx.console, ctx.theme, y, active)
            });
        }
        let previous = self.current_row();
        with_listing!(&mut self.content, listing => {
            if let Some(prev) = previous.filter(|&prev| prev != row) {
                listing.items_mut()[prev].mark_unselected(ctx.console, ctx.theme, y, active);
            }
            listing.set_current_row(Some(row));
        });
        let height = self.height as usize;
        let scrolled = if row < self.content_top {
            self.content_top -= 1;
            true
        } else if row >= self.content_top + height {
            self.content_top += 1;
            true
        } else {
            false
        };
        if scrolled {
            with_listing!(&mut self.content, listing => listing.items_mut()[row].set_selected(true));
            self.reflow();
            self.render_contents(ctx);
        } else {
            with_listing!(&mut self.content, listing => {
                listing.items_mut()[row].mark_selected(ctx.console, ctx.theme, y, active);
            });
        }
        true
    }

    pub fn select_next_file(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let next = self.current_row().map_or(0, |row| row + 1);
        if next >= self.total_rows() {
            return false;
        }
        self.set_selection_by_row(ctx, next, true)
    }

    pub fn select_prev_file(&mut self, ctx: &mut Ctx<'_>) -> bool {
        match self.current_row() {
            Some(row) if row > 0 => self.set_selection_by_row(ctx, row - 1, true),
            _ => false,
        }
    }

    fn require_disk(&self, ctx: &mut Ctx<'_>) -> Option<Folder> {
        match &self.content {
            PanelContent::Disk(folder) => Some(Folder::at(folder.device(), folder.path())),
            PanelContent::Memory(_) => {
                ctx.post(StringId::DiskOnly, &[]);
                None
            }
        }
    }

    pub fn make_dir(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let Some(folder) = self.require_disk(ctx) else { return false };
        let body = ctx.text(StringId::MkdirPrompt, &[]);
        let Some(name) = ctx.prompt(StringId::MkdirTitle, &body, "", MAX_NAME_LEN) else { return false };
        let path = folder.child_path(&name);
        match ctx.host.mkdir(&path) {
            Ok(()) => {
                self.reload(ctx, Focus::Name(name.clone()));
                ctx.post(StringId::MkdirDone, &[&name]);
                true
            }
            Err(err) => {
                ctx.post(StringId::MkdirFailed, &[&name, &err]);
                false
            }
        }
    }

    pub fn format_drive(&mut self, ctx: &mut Ctx<'_>) -> bool {
        if self.require_disk(ctx).is_none() {
            return false;
        }
        let device = self.device;
        let body = ctx.text(StringId::FormatConfirm, &[&device.label()]);
        if !ctx.confirm(StringId::FormatTitle, &body) {
            return false;
        }
        let body = ctx.text(StringId::FormatPrompt, &[]);
        let Some(label) = ctx.prompt(StringId::FormatTitle, &body, "F256", VOLUME_LABEL_LEN) else { return false };
        match ctx.host.format(device, &label) {
            Ok(()) => {
                self.content = PanelContent::Disk(Folder::new(device));
                self.content_top = 0;
                self.reload(ctx, Focus::Top);
                ctx.post(StringId::FormatDone, &[&device.label(), &label]);
                true
            }
            Err(err) => {
                ctx.post(StringId::FormatFailed, &[&device.label(), &err]);
                false
            }
        }
    }

    fn current_disk_entry(&self) -> PanelResult<(String, String, bool)> {
        let folder = self.folder().ok_or(PanelError::WrongMode("disk devices"))?;
        let entry = folder.current_file().filter(|entry| !entry.is_parent_link()).ok_or(PanelError::NoSelection)?;
        Ok((entry.name().to_string(), entry.path().to_string(), entry.is_directory()))
    }

    fn report_selection_error(ctx: &mut Ctx<'_>, err: &PanelError) {
        match err {
            PanelError::WrongMode(_) => ctx.post(StringId::DiskOnly, &[]),
            _ => ctx.post(StringId::NoSelection, &[]),
        }
    }

    pub fn rename_current_file(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let (old_name, _, _) = match self.current_disk_entry() {
            Ok(found) => found,
            Err(err) => {
                Self::report_selection_error(ctx, &err);
                return false;
            }
        };
        let body = ctx.text(StringId::RenamePrompt, &[&old_name]);
        let Some(new_name) = ctx.prompt(StringId::RenameTitle, &body, &old_name, MAX_NAME_LEN) else {
            return false;
        };
        if new_name == old_name {
            return false;
        }
        let PanelContent::Disk(folder) = &mut self.content else { return false };
        let new_path = folder.child_path(&new_name);
        let Some(entry) = folder.current_file_mut() else { return false };
        match entry.rename(ctx.host, &new_name, &new_path) {
            Ok(()) => {
                self.reload(ctx, Focus::Name(new_name.clone()));
                ctx.post(StringId::RenameDone, &[&old_name, &new_name]);
                true
            }
            Err(err) => {
                ctx.post(StringId::RenameFailed, &[&old_name, &err]);
                false
            }
        }
    }

    pub fn delete_current_file(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let (name, _, _) = match self.current_disk_entry() {
            Ok(found) => found,
            Err(err) => {
                Self::report_selection_error(ctx, &err);
                return false;
            }
        };
        let body = ctx.text(StringId::DeleteConfirm, &[&name]);
        if !ctx.confirm(StringId::DeleteTitle, &body) {
            return false;
        }
        let row = self.current_row().unwrap_or(0);
        let Some(entry) = self.folder().and_then(Folder::current_file) else { return false };
        match entry.delete(ctx.host) {
            Ok(()) => {
                self.reload(ctx, Focus::Row(row));
                ctx.post(StringId::DeleteDone, &[&name]);
                true
            }
            Err(err) => {
                ctx.post(StringId::DeleteFailed, &[&name, &err]);
                false
            }
        }
    }

    pub fn copy_current_file(&mut self, ctx: &mut Ctx<'_>, target: &mut Panel) -> bool {
        let source = match &self.content {
            PanelContent::Disk(_) => match self.current_disk_entry() {
                Ok((name, _, true)) => {
                    ctx.post(StringId::CopyFolder, &[&name]);
                    return false;
                }
                Ok((name, path, false)) => CopySource::File { name, path },
                Err(err) => {
                    Self::report_selection_error(ctx, &err);
                    return false;
                }
            },
            PanelContent::Memory(memory) => match memory.current_bank() {
                Some(bank) => CopySource::Bank { device: memory.device(), index: bank.index() },
                None => {
                    ctx.post(StringId::NoSelection, &[]);
                    return false;
                }
            },
        };
        let what = source.describe();
        match target.receive(ctx, source) {
            Ok(Some(dest)) => {
                ctx.post(StringId::CopyDone, &[&what, &dest]);
                true
            }
            Ok(None) => false,
            Err(err) => {
                ctx.post(StringId::CopyFailed, &[&what, &err]);
                false
            }
        }
    }

    fn receive(&mut self, ctx: &mut Ctx<'_>, source: CopySource) -> PanelResult<Option<String>> {
        match (&source, &self.content) {
            (CopySource::File { name, path }, PanelContent::Disk(folder)) => {
                let dest = folder.child_path(name);
                if dest == *path {
                    return Err(HostError::AlreadyExists(dest).into());
                }
                if !self.confirm_overwrite(ctx, &dest) {
                    return Ok(None);
                }
                copy_file(ctx.host, path, &dest)?;
                let focus = Focus::Name(name.clone());
                self.reload(ctx, focus);
                Ok(Some(dest))
            }
            (CopySource::File { path, .. }, PanelContent::Memory(memory)) => {
                let first = memory.current_row().unwrap_or(0);
                let data = read_all(ctx.host, path)?;
                self.stage_here(ctx, first, &data)
            }
            (CopySource::Bank { device, index }, PanelContent::Disk(folder)) => {
                let body = ctx.text(StringId::CopyPrompt, &[&format!("{index:02X}")]);
                let suggested = format!("bank{index:02x}.bin");
                let Some(name) = ctx.prompt(StringId::CopyTitle, &body, &suggested, MAX_NAME_LEN) else {
                    return Ok(None);
                };
                let dest = folder.child_path(&name);
                if !self.confirm_overwrite(ctx, &dest) {
                    return Ok(None);
                }
                let mut data = vec![0u8; BANK_SIZE];
                ctx.host.read_bank(*device, *index, &mut data)?;
                write_file(ctx.host, &dest, &data)?;
                self.reload(ctx, Focus::Name(name));
                Ok(Some(dest))
            }
            (CopySource::Bank { device, index }, PanelContent::Memory(memory)) => {
                let first = memory.current_row().unwrap_or(0);
                if *device == memory.device() && *index == first {
                    return Err(HostError::AlreadyExists(source.describe()).into());
                }
                let mut data = vec![0u8; BANK_SIZE];
                ctx.host.read_bank(*device, *index, &mut data)?;
                self.stage_here(ctx, first, &data)
            }
        }
    }

    fn confirm_overwrite(&self, ctx: &mut Ctx<'_>, dest: &str) -> bool {
        if !ctx.host.exists(dest) {
            return true;
        }
        let body = ctx.text(StringId::CopyOverwrite, &[&file_name(dest)]);
        ctx.confirm(StringId::CopyTitle, &body)
    }

    fn stage_here(&mut self, ctx: &mut Ctx<'_>, first: usize, data: &[u8]) -> PanelResult<Option<String>> {
        let PanelContent::Memory(memory) = &mut self.content else {
            return Err(PanelError::WrongMode("memory banks"));
        };
        let count = memory.stage(ctx.host, first, data)?;
        let dest = format!("{} ${first:02X}+{count}", memory.device().label());
        self.render_contents(ctx);
        Ok(Some(dest))
    }

    pub fn view_current_file(&mut self, ctx: &mut Ctx<'_>, mode: ViewMode) -> bool {
        match &self.content {
            PanelContent::Disk(folder) => {
                let Some(entry) = folder.current_file().filter(|entry| !entry.is_directory()) else {
                    ctx.post(StringId::NoSelection, &[]);
                    return false;
                };
                let shown = match mode {
                    ViewMode::Text => entry.get_text_contents(ctx.host, ctx.console, ctx.theme, ctx.strings),
                    ViewMode::Hex => entry.get_hex_contents(ctx.host, ctx.console, ctx.theme, ctx.strings),
                };
                if let Err(err) = shown {
                    let name = entry.name().to_string();
                    ctx.post(StringId::ViewFailed, &[&name, &err]);
                    return false;
                }
                true
            }
            PanelContent::Memory(memory) => {
                let Some(bank) = memory.current_bank() else {
                    ctx.post(StringId::NoSelection, &[]);
                    return false;
                };
                if let Err(err) = bank.view(ctx.host, memory.device(), ctx.console, ctx.theme, ctx.strings, mode) {
                    ctx.post(StringId::ViewFailed, &[&format!("${:02X}", bank.index()), &err]);
                    return false;
                }
                true
            }
        }
    }

    pub fn open_current_file_or_folder(&mut self, ctx: &mut Ctx<'_>) -> OpenOutcome {
        let PanelContent::Disk(folder) = &self.content else {
            return if self.view_current_file(ctx, ViewMode::Hex) { OpenOutcome::Done } else { OpenOutcome::Failed };
        };
        let Some(entry) = folder.current_file() else {
            ctx.post(StringId::NoSelection, &[]);
            return OpenOutcome::Failed;
        };
        let (name, path, file_type) = (entry.name().to_string(), entry.path().to_string(), entry.file_type());
        let focus = if entry.is_parent_link() { Some(file_name(folder.path()).to_string()) } else { None };
        let result = match file_type {
            FileType::Directory => return self.change_dir(ctx, &path, focus),
            FileType::Font => read_all(ctx.host, &path).and_then(|data| ctx.host.load_font(&data)).map(|()| {
                ctx.post(StringId::FontLoaded, &[&name]);
            }),
            FileType::Executable | FileType::Image | FileType::Music => {
                let kind = match file_type {
                    FileType::Image => LaunchKind::Image,
                    FileType::Music => LaunchKind::Music,
                    _ => LaunchKind::Executable,
                };
                ctx.post(StringId::Launching, &[&name]);
                ctx.host.launch(&path, kind)
            }
            FileType::Basic => return self.run_basic(ctx, &name, &path),
            FileType::Other => {
                return if self.view_current_file(ctx, ViewMode::Text) { OpenOutcome::Done } else { OpenOutcome::Failed };
            }
        };
        match result {
            Ok(()) => OpenOutcome::Done,
            Err(err) => {
                ctx.post(StringId::OpenFailed, &[&name, &err]);
                OpenOutcome::Failed
            }
        }
    }

    pub fn open_parent(&mut self, ctx: &mut Ctx<'_>) -> OpenOutcome {
        let Some(folder) = self.folder() else { return OpenOutcome::Failed };
        let Some(parent) = folder.parent_path() else { return OpenOutcome::Failed };
        let focus = Some(file_name(folder.path()).to_string());
        self.change_dir(ctx, &parent, focus)
    }

    /// Lists `path` and swaps it in only once the listing succeeded.
    fn change_dir(&mut self, ctx: &mut Ctx<'_>, path: &str, focus: Option<String>) -> OpenOutcome {
        let mut next = Folder::at(self.device, path);
        if let Err(err) = next.populate(ctx.host) {
            ctx.post(StringId::OpenFailed, &[&path, &err]);
            return OpenOutcome::Failed;
        }
        log::debug!("{:?} panel now at {path}", self.side);
        self.content = PanelContent::Disk(next);
        self.content_top = 0;
        self.sort_with_focus(ctx, self.sort_by, focus.map_or(Focus::Top, Focus::Name));
        OpenOutcome::Done
    }

    fn run_basic(&mut self, ctx: &mut Ctx<'_>, name: &str, path: &str) -> OpenOutcome {
        let staged = read_all(ctx.host, path).and_then(|data| {
            stage_into_banks(ctx.host, DeviceId::RAM, BASIC_STAGING_BANK, &data)?;
            Ok(data.len())
        });
        let len = match staged {
            Ok(len) => len,
            Err(err) => {
                ctx.post(StringId::OpenFailed, &[&name, &err]);
                return OpenOutcome::Failed;
            }
        };
        ctx.post(StringId::BasicStaged, &[&name, &len]);
        match ctx.host.run_basic(BASIC_STAGING_BANK, len) {
            Ok(()) => OpenOutcome::HandedOff,
            Err(err) => {
                ctx.post(StringId::OpenFailed, &[&name, &err]);
                OpenOutcome::Failed
            }
        }
    }

    fn writable_current_bank(&self, ctx: &mut Ctx<'_>) -> Option<usize> {
        let Some(memory) = self.memory() else {
            ctx.post(StringId::MemoryOnly, &[]);
            return None;
        };
        let Some(bank) = memory.current_bank() else {
            ctx.post(StringId::NoSelection, &[]);
            return None;
        };
        if !bank.is_writable() {
            ctx.post(StringId::BankProtected, &[&format!("${:02X}", bank.index())]);
            return None;
        }
        Some(bank.index())
    }

    pub fn fill_current_bank(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let Some(index) = self.writable_current_bank(ctx) else { return false };
        let label = format!("${index:02X}");
        let body = ctx.text(StringId::FillPrompt, &[&label]);
        let Some(answer) = ctx.prompt(StringId::FillTitle, &body, "00", 3) else { return false };
        let Some(value) = parse_hex_byte(&answer) else {
            ctx.post(StringId::FillInvalid, &[&answer]);
            return false;
        };
        if !self.write_bank(ctx, index, |bank, host, device| bank.fill(host, device, value)) {
            return false;
        }
        ctx.post(StringId::FillDone, &[&label, &format!("{value:02X}")]);
        true
    }

    pub fn clear_current_bank(&mut self, ctx: &mut Ctx<'_>) -> bool {
        let Some(index) = self.writable_current_bank(ctx) else { return false };
        let label = format!("${index:02X}");
        let body = ctx.text(StringId::ClearConfirm, &[&label]);
        if !ctx.confirm(StringId::ClearTitle, &body) {
            return false;
        }
        if !self.write_bank(ctx, index, |bank, host, device| bank.clear(host, device)) {
            return false;
        }
        ctx.post(StringId::ClearDone, &[&label]);
        true
    }

    fn write_bank(
        &mut self,
        ctx: &mut Ctx<'_>,
        index: usize,
        op: impl FnOnce(&mut Bank, &mut dyn Host, DeviceId) -> HostResult<()>,
    ) -> bool {
        let PanelContent::Memory(memory) = &mut self.content else { return false };
        let device = memory.device();
        let Some(bank) = memory.bank_mut(index) else { return false };
        if let Err(err) = op(bank, ctx.host, device) {
            ctx.post(StringId::FillFailed, &[&format!("${index:02X}"), &err]);
            return false;
        }
        self.render_contents(ctx);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CopySource {
    File { name: String, path: String },
    Bank { device: DeviceId, index: usize },
}

impl CopySource {
    fn describe(&self) -> String {
        match self {
            CopySource::File { name, .. } => name.clone(),
            CopySource::Bank { device, index } => format!("{} ${index:02X}", device.label()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelPair {
    left: Panel,
    right: Panel,
    active: Side,
}

impl PanelPair {
    pub fn new(mut left: Panel, mut right: Panel) -> Self {
        left.set_active(true);
        right.set_active(false);
        Self { left, right, active: Side::Left }
    }

    pub fn active_side(&self) -> Side {
        self.active
    }

    pub fn get(&self, side: Side) -> &Panel {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Panel {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn active(&self) -> &Panel {
        self.get(self.active)
    }

    pub fn active_mut(&mut self) -> &mut Panel {
        self.get_mut(self.active)
    }

    pub fn inactive(&self) -> &Panel {
        self.get(self.active.other())
    }

    pub fn split_mut(&mut self) -> (&mut Panel, &mut Panel) {
        match self.active {
            Side::Left => (&mut self.left, &mut self.right),
            Side::Right => (&mut self.right, &mut self.left),
        }
    }

    pub fn toggle_active(&mut self, ctx: &mut Ctx<'_>) {
        self.active = self.active.other();
        self.left.set_active(self.active == Side::Left);
        self.right.set_active(self.active == Side::Right);
        self.render_all(ctx);
    }

    pub fn refresh_all(&mut self, ctx: &mut Ctx<'_>) {
        self.left.refresh(ctx);
        self.right.refresh(ctx);
    }

    pub fn render_all(&self, ctx: &mut Ctx<'_>) {
        self.left.render_contents(ctx);
        self.right.render_contents(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConsole, MockHost, ScriptedDialogs};
    use crate::msglog::MessageLog;
    use crate::strings::StringTable;
    use crate::theme::ThemeColors;

    struct Rig {
        console: MockConsole,
        host: MockHost,
        dialogs: ScriptedDialogs,
        log: MessageLog,
        strings: StringTable,
        theme: ThemeColors,
    }

    impl Rig {
        fn new(host: MockHost) -> Self {
            Self {
                console: MockConsole::new(),
                host,
                dialogs: ScriptedDialogs::new(),
                log: MessageLog::default(),
                strings: StringTable::english(),
                theme: ThemeColors::classic(),
            }
        }

        fn ctx(&mut self) -> Ctx<'_> {
            Ctx {
                console: &mut self.console,
                host: &mut self.host,
                dialogs: &mut self.dialogs,
                log: &mut self.log,
                strings: &self.strings,
                theme: &self.theme,
            }
        }

        fn last_log(&self) -> String {
            self.log.rows().last().map(|row| row.trim().to_string()).unwrap_or_default()
        }
    }

    fn disk_panel(rig: &mut Rig, height: u16) -> Panel {
        let mut panel = Panel::with_viewport(Side::Left, DeviceId::SD_CARD, &rig.host, 1, 5, height);
        panel.set_active(true);
        panel.refresh(&mut rig.ctx());
        panel
    }

    fn names(panel: &Panel) -> Vec<String> {
        panel.folder().map(|f| f.items().iter().map(|e| e.name().to_string()).collect()).unwrap_or_default()
    }

    #[test]
    fn refresh_selects_the_first_row() {
        let mut host = MockHost::new();
        host.add_file("0:/b.txt", b"b");
        host.add_file("0:/a.txt", b"a");
        let mut rig = Rig::new(host);
        let panel = disk_panel(&mut rig, 10);
        assert_eq!(names(&panel), vec!["a.txt", "b.txt"]);
        assert_eq!(panel.current_row(), Some(0));
        assert_eq!(rig.console.grid().text_at(1, 5, 5), "a.txt");
        assert_eq!(rig.console.grid().text_at(1, 4, 4), "Name");
    }

    #[test]
    fn scrolling_moves_one_step_past_the_edge() {
        let mut host = MockHost::new();
        for idx in 0..12 {
            host.add_file(&format!("0:/f{idx:02}"), b"x");
        }
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 5);
        for _ in 0..6 {
            assert!(panel.select_next_file(&mut rig.ctx()));
        }
        assert_eq!(panel.current_row(), Some(6));
        assert_eq!(panel.content_top(), 2);
        assert_eq!(panel.display_row_of(6), Some(4));
        assert_eq!(panel.display_row_of(1), None);
        for _ in 0..5 {
            panel.select_next_file(&mut rig.ctx());
        }
        assert!(!panel.select_next_file(&mut rig.ctx()));
        assert_eq!(panel.current_row(), Some(11));
        assert_eq!(panel.content_top(), 7);
    }

    #[test]
    fn select_prev_stops_at_the_top() {
        let mut host = MockHost::new();
        host.add_file("0:/a", b"");
        host.add_file("0:/b", b"");
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 5);
        assert!(!panel.select_prev_file(&mut rig.ctx()));
        assert!(panel.select_next_file(&mut rig.ctx()));
        assert!(panel.select_prev_file(&mut rig.ctx()));
        assert_eq!(panel.current_row(), Some(0));
    }

    #[test]
    fn switching_to_ram_lists_every_bank() {
        let mut rig = Rig::new(MockHost::new());
        let mut panel = disk_panel(&mut rig, 10);
        assert!(panel.switch_device(&mut rig.ctx(), DeviceId::RAM));
        assert_eq!(panel.total_rows(), crate::model::BANKS_PER_DEVICE);
        assert!(panel.memory().is_some());
        assert_eq!(rig.last_log(), "Now showing RAM");
        assert!(!panel.switch_device(&mut rig.ctx(), DeviceId(9)));
        assert!(panel.switch_device(&mut rig.ctx(), DeviceId::FLOPPY_1));
        assert!(panel.folder().is_some());
    }

    #[test]
    fn failed_switch_reports_only_the_error() {
        let mut rig = Rig::new(MockHost::new());
        rig.host.eject(DeviceId::FLOPPY_1);
        let mut panel = disk_panel(&mut rig, 10);
        assert!(!panel.switch_device(&mut rig.ctx(), DeviceId::FLOPPY_1));
        assert!(rig.last_log().starts_with("Could not read 1:"));
        assert!(!rig.log.rows().any(|row| row.starts_with("Now showing")));
    }

    #[test]
    fn viewport_at_the_screen_corner_still_renders() {
        let mut host = MockHost::new();
        host.add_file("0:/a.txt", b"a");
        let mut rig = Rig::new(host);
        let mut panel = Panel::with_viewport(Side::Left, DeviceId::SD_CARD, &rig.host, 0, 0, 4);
        panel.refresh(&mut rig.ctx());
        panel.render_contents(&mut rig.ctx());
        assert_eq!(rig.console.grid().text_at(1, 3, 5), "a.txt");
    }

    #[test]
    fn sorting_keeps_the_current_file() {
        let mut host = MockHost::new();
        host.add_file("0:/alpha.txt", &[0; 100]);
        host.add_file("0:/Beta.PGZ", &[0; 50]);
        host.add_dir("0:/cat");
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 10);
        panel.select_next_file(&mut rig.ctx());
        panel.sort_and_display(&mut rig.ctx(), SortBy::Type);
        assert_eq!(names(&panel), vec!["cat", "Beta.PGZ", "alpha.txt"]);
        assert_eq!(panel.current_row(), Some(1));
        assert_eq!(panel.sort_by(), SortBy::Type);
    }

    #[test]
    fn entering_and_leaving_folders() {
        let mut host = MockHost::new();
        host.add_dir("0:/games");
        host.add_file("0:/games/x.pgz", b"x");
        host.add_file("0:/zz.txt", b"z");
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 10);
        assert_eq!(panel.open_current_file_or_folder(&mut rig.ctx()), OpenOutcome::Done);
        assert_eq!(panel.folder().map(Folder::path), Some("0:/games"));
        assert_eq!(names(&panel), vec!["..", "x.pgz"]);
        assert_eq!(panel.open_parent(&mut rig.ctx()), OpenOutcome::Done);
        assert_eq!(panel.folder().map(Folder::path), Some("0:"));
        assert_eq!(panel.current_row(), Some(0));
    }

    #[test]
    fn failed_folder_change_keeps_the_old_listing() {
        let mut host = MockHost::new();
        host.add_dir("0:/games");
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 10);
        rig.host.fail_on("list_dir");
        assert_eq!(panel.open_current_file_or_folder(&mut rig.ctx()), OpenOutcome::Failed);
        assert_eq!(names(&panel), vec!["games"]);
        assert!(rig.last_log().starts_with("Could not open 0:/games"));
    }

    #[test]
    fn rename_prompts_and_reselects() {
        let mut host = MockHost::new();
        host.add_file("0:/a.txt", b"a");
        host.add_file("0:/m.txt", b"m");
        let mut rig = Rig::new(host);
        rig.dialogs = ScriptedDialogs::new().answer_with(Some("z.txt"));
        let mut panel = disk_panel(&mut rig, 10);
        assert!(panel.rename_current_file(&mut rig.ctx()));
        assert!(rig.host.exists_file("0:/z.txt"));
        assert_eq!(names(&panel), vec!["m.txt", "z.txt"]);
        assert_eq!(panel.current_row(), Some(1));
        assert_eq!(rig.last_log(), "Renamed a.txt to z.txt");
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut host = MockHost::new();
        host.add_file("0:/a.txt", b"a");
        let mut rig = Rig::new(host);
        let mut panel = disk_panel(&mut rig, 10);
        assert!(!panel.delete_current_file(&mut rig.ctx()));
        assert!(rig.host.exists_file("0:/a.txt"));
        rig.dialogs = ScriptedDialogs::new().confirm_with(true);
        assert!(panel.delete_current_file(&mut rig.ctx()));
        assert!(!rig.host.exists_file("0:/a.txt"));
        assert_eq!(panel.total_rows(), 0);
        assert_eq!(panel.current_row(), None);
    }

    #[test]
    fn disk_only_actions_refuse_banks() {
        let mut rig = Rig::new(MockHost::new());
        let mut panel = Panel::with_viewport(Side::Left, DeviceId::RAM, &rig.host, 1, 5, 10);
        panel.refresh(&mut rig.ctx());
        assert!(!panel.make_dir(&mut rig.ctx()));
        assert_eq!(rig.last_log(), "Only available on disk devices");
        assert!(rig.dialogs.asked().is_empty());
    }

    #[test]
    fn fill_rejects_protected_banks_and_bad_input() {
        let mut rig = Rig::new(MockHost::new());
        let mut panel = Panel::with_viewport(Side::Left, DeviceId::RAM, &rig.host, 1, 5, 10);
        panel.refresh(&mut rig.ctx());
        assert!(!panel.fill_current_bank(&mut rig.ctx()));
        assert_eq!(rig.last_log(), "Bank $00 is write-protected");
        panel.set_selection_by_row(&mut rig.ctx(), 8, true);
        rig.dialogs = ScriptedDialogs::new().answer_with(Some("zz")).answer_with(Some("$ea"));
        assert!(!panel.fill_current_bank(&mut rig.ctx()));
        assert_eq!(rig.last_log(), "Not a hex byte: zz");
        assert!(panel.fill_current_bank(&mut rig.ctx()));
        assert_eq!(rig.host.bank(DeviceId::RAM, 8)[0], 0xEA);
        assert_eq!(rig.last_log(), "Filled bank $08 with $EA");
    }

    #[test]
    fn hex_bytes_parse_with_or_without_prefix() {
        assert_eq!(parse_hex_byte("ff"), Some(0xFF));
        assert_eq!(parse_hex_byte(" $0a "), Some(0x0A));
        assert_eq!(parse_hex_byte("0x7"), Some(0x07));
        assert_eq!(parse_hex_byte("100"), None);
        assert_eq!(parse_hex_byte(""), None);
    }

    #[test]
    fn toggle_keeps_exactly_one_active_panel() {
        let mut rig = Rig::new(MockHost::new());
        let left = Panel::new(Side::Left, DeviceId::SD_CARD, &rig.host);
        let right = Panel::new(Side::Right, DeviceId::RAM, &rig.host);
        let mut pair = PanelPair::new(left, right);
        assert!(pair.get(Side::Left).is_active() && !pair.get(Side::Right).is_active());
        pair.toggle_active(&mut rig.ctx());
        assert_eq!(pair.active_side(), Side::Right);
        assert!(!pair.get(Side::Left).is_active() && pair.get(Side::Right).is_active());
        pair.toggle_active(&mut rig.ctx());
        assert!(pair.active().is_active() && !pair.inactive().is_active());
    }
}
