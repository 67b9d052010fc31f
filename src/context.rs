#![forbid(unsafe_code)]

use std::fmt::Display;

use crate::console::Console;
use crate::dialog::Dialogs;
use crate::host::Host;
use crate::msglog::MessageLog;
use crate::strings::{StringId, StringTable};
use crate::theme::ThemeColors;

pub struct Ctx<'a> {
    pub console: &'a mut dyn Console,
    pub host: &'a mut dyn Host,
    pub dialogs: &'a mut dyn Dialogs,
    pub log: &'a mut MessageLog,
    pub strings: &'a StringTable,
    pub theme: &'a ThemeColors,
}

impl Ctx<'_> {
    pub fn text(&self, id: StringId, args: &[&dyn Display]) -> String {
        self.strings.format(id, args)
    }

    pub fn post(&mut self, id: StringId, args: &[&dyn Display]) {
        let text = self.strings.format(id, args);
        log::info!("{text}");
        self.log.post_message(self.console, &text);
    }

    pub fn confirm(&mut self, title: StringId, body: &str) -> bool {
        let title = self.strings.lookup(title);
        self.dialogs.confirm(self.console, title, body)
    }

    pub fn prompt(&mut self, title: StringId, body: &str, prefill: &str, max_len: usize) -> Option<String> {
        let title = self.strings.lookup(title);
        self.dialogs.prompt_text(self.console, title, body, prefill, max_len)
    }
}
