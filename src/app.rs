#![forbid(unsafe_code)]

use crate::console::Console;
use crate::context::Ctx;
use crate::dialog::Dialogs;
use crate::host::Host;
use crate::menu::{Command, command_for_key};
use crate::model::{DeviceId, SortBy};
use crate::msglog::MessageLog;
use crate::pane::{OpenOutcome, Panel, PanelPair, Side};
use crate::strings::{StringId, StringTable};
use crate::theme::ThemeColors;
use crate::ui::draw_chrome;
use crate::viewer::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C: Console, H: Host, D: Dialogs> {
    panels: PanelPair,
    log: MessageLog,
    console: C,
    host: H,
    dialogs: D,
    strings: StringTable,
    theme: ThemeColors,
}

impl<C: Console, H: Host, D: Dialogs> App<C, H, D> {
    pub fn new(
        console: C,
        host: H,
        dialogs: D,
        strings: StringTable,
        theme: ThemeColors,
        left: DeviceId,
        right: DeviceId,
    ) -> Self {
        let panels = PanelPair::new(Panel::new(Side::Left, left, &host), Panel::new(Side::Right, right, &host));
        Self { panels, log: MessageLog::new(&theme), console, host, dialogs, strings, theme }
    }

    pub fn panels(&self) -> &PanelPair {
        &self.panels
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn dialogs(&self) -> &D {
        &self.dialogs
    }

    fn split(&mut self) -> (&mut PanelPair, Ctx<'_>) {
        let ctx = Ctx {
            console: &mut self.console,
            host: &mut self.host,
            dialogs: &mut self.dialogs,
            log: &mut self.log,
            strings: &self.strings,
            theme: &self.theme,
        };
        (&mut self.panels, ctx)
    }

    pub fn start(&mut self) {
        draw_chrome(&mut self.console, &self.theme, &self.strings);
        let (panels, mut ctx) = self.split();
        panels.refresh_all(&mut ctx);
        panels.render_all(&mut ctx);
        ctx.post(StringId::Welcome, &[]);
    }

    pub fn redraw_all(&mut self) {
        draw_chrome(&mut self.console, &self.theme, &self.strings);
        self.log.refresh_display(&mut self.console);
        let (panels, mut ctx) = self.split();
        panels.render_all(&mut ctx);
    }

    pub fn handle_key(&mut self, key: u8) -> Flow {
        self.log.acknowledge();
        let Some(command) = command_for_key(key) else {
            log::trace!("unbound key {key:#04x}");
            return Flow::Continue;
        };
        log::debug!("key {key:#04x} -> {command:?}");
        self.dispatch(command)
    }

    fn dispatch(&mut self, command: Command) -> Flow {
        let (panels, mut ctx) = self.split();
        let ctx = &mut ctx;
        let mut covered = false;
        match command {
            Command::Quit => return Flow::Quit,
            Command::SwitchPanel => panels.toggle_active(ctx),
            Command::Up => {
                panels.active_mut().select_prev_file(ctx);
            }
            Command::Down => {
                panels.active_mut().select_next_file(ctx);
            }
            Command::Open => {
                if panels.active_mut().open_current_file_or_folder(ctx) == OpenOutcome::HandedOff {
                    return Flow::Quit;
                }
                covered = true;
            }
            Command::Parent => {
                panels.active_mut().open_parent(ctx);
            }
            Command::Copy => {
                let (active, other) = panels.split_mut();
                active.copy_current_file(ctx, other);
                covered = true;
            }
            Command::Rename => {
                panels.active_mut().rename_current_file(ctx);
                covered = true;
            }
            Command::Delete => {
                panels.active_mut().delete_current_file(ctx);
                covered = true;
            }
            Command::MakeDir => {
                panels.active_mut().make_dir(ctx);
                covered = true;
            }
            Command::Format => {
                panels.active_mut().format_drive(ctx);
                covered = true;
            }
            Command::ViewText | Command::ViewHex => {
                let mode = if command == Command::ViewText { ViewMode::Text } else { ViewMode::Hex };
                panels.active_mut().view_current_file(ctx, mode);
                covered = true;
            }
            Command::SortName => panels.active_mut().sort_and_display(ctx, SortBy::Name),
            Command::SortSize => panels.active_mut().sort_and_display(ctx, SortBy::Size),
            Command::SortType => panels.active_mut().sort_and_display(ctx, SortBy::Type),
            Command::NextDevice => {
                let panel = panels.active_mut();
                let next = panel.device().next();
                panel.switch_device(ctx, next);
            }
            Command::FillBank => {
                panels.active_mut().fill_current_bank(ctx);
                covered = true;
            }
            Command::ClearBank => {
                panels.active_mut().clear_current_bank(ctx);
                covered = true;
            }
            Command::Refresh => {
                panels.active_mut().refresh(ctx);
            }
        }
        if covered {
            self.redraw_all();
        }
        Flow::Continue
    }

    pub fn run(&mut self) {
        self.start();
        loop {
            let key = self.console.read_key();
            if self.handle_key(key) == Flow::Quit {
                log::info!("session over");
                break;
            }
        }
    }
}
