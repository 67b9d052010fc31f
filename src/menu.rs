#![forbid(unsafe_code)]

use crate::console::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SwitchPanel,
    Up,
    Down,
    Open,
    Parent,
    Copy,
    Rename,
    Delete,
    MakeDir,
    Format,
    ViewText,
    ViewHex,
    SortName,
    SortSize,
    SortType,
    NextDevice,
    FillBank,
    ClearBank,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandButton {
    pub key: &'static str,
    pub label: &'static str,
    pub command: Command,
}

pub const BUTTONS: &[CommandButton] = &[
    CommandButton { key: "C", label: "Copy", command: Command::Copy },
    CommandButton { key: "R", label: "Rename", command: Command::Rename },
    CommandButton { key: "X", label: "Delete", command: Command::Delete },
    CommandButton { key: "M", label: "MkDir", command: Command::MakeDir },
    CommandButton { key: "F", label: "Format", command: Command::Format },
    CommandButton { key: "V", label: "View", command: Command::ViewText },
    CommandButton { key: "H", label: "Hex", command: Command::ViewHex },
    CommandButton { key: "N", label: "Name", command: Command::SortName },
    CommandButton { key: "S", label: "Size", command: Command::SortSize },
    CommandButton { key: "T", label: "Type", command: Command::SortType },
    CommandButton { key: "D", label: "Device", command: Command::NextDevice },
    CommandButton { key: "L", label: "Fill", command: Command::FillBank },
    CommandButton { key: "Z", label: "Clear", command: Command::ClearBank },
    CommandButton { key: ".", label: "Reload", command: Command::Refresh },
    CommandButton { key: "Q", label: "Quit", command: Command::Quit },
];

pub fn command_for_key(key: u8) -> Option<Command> {
    let command = match key {
        keys::TAB => Command::SwitchPanel,
        keys::UP => Command::Up,
        keys::DOWN => Command::Down,
        keys::ENTER => Command::Open,
        keys::BACKSPACE => Command::Parent,
        keys::DELETE => Command::Delete,
        keys::F1 => Command::NextDevice,
        keys::F3 => Command::ViewText,
        keys::F5 => Command::Copy,
        keys::F7 => Command::MakeDir,
        other => {
            let ch = other.to_ascii_uppercase();
            return BUTTONS.iter().find(|button| button.key.as_bytes() == [ch]).map(|button| button.command);
        }
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_match_either_case() {
        assert_eq!(command_for_key(b'c'), Some(Command::Copy));
        assert_eq!(command_for_key(b'C'), Some(Command::Copy));
        assert_eq!(command_for_key(b'.'), Some(Command::Refresh));
        assert_eq!(command_for_key(b'?'), None);
    }

    #[test]
    fn navigation_and_function_keys() {
        assert_eq!(command_for_key(keys::TAB), Some(Command::SwitchPanel));
        assert_eq!(command_for_key(keys::DOWN), Some(Command::Down));
        assert_eq!(command_for_key(keys::F5), Some(Command::Copy));
        assert_eq!(command_for_key(keys::DELETE), Some(Command::Delete));
    }

    #[test]
    fn button_keys_are_unique() {
        for (idx, button) in BUTTONS.iter().enumerate() {
            assert!(BUTTONS[idx + 1..].iter().all(|other| other.key != button.key));
        }
    }
}
