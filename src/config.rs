#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::DeviceId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveConfig {
    pub id: u8,
    pub root: PathBuf,
    #[serde(default)]
    pub allow_format: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "drive")]
    pub drives: Vec<DriveConfig>,
    pub flash_image: Option<PathBuf>,
    pub launcher: Option<String>,
    pub left_device: u8,
    pub right_device: u8,
    pub debug_log: Option<PathBuf>,
    pub strings: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drives: vec![DriveConfig { id: 0, root: PathBuf::from("."), allow_format: false }],
            flash_image: None,
            launcher: None,
            left_device: DeviceId::SD_CARD.0,
            right_device: DeviceId::RAM.0,
            debug_log: None,
            strings: BTreeMap::new(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".f256commander").join("config.toml"))
}

impl Config {
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(text).map_err(|source| ConfigError::Parse { path: origin.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text, path)
    }

    /// An explicitly named file must exist; the default location is
    /// optional.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = Vec::new();
        for drive in &self.drives {
            let id = DeviceId(drive.id);
            if !id.is_valid() || id.is_memory() {
                return Err(ConfigError::Invalid(format!("drive id {} is not a disk device", drive.id)));
            }
            if seen.contains(&drive.id) {
                return Err(ConfigError::Invalid(format!("drive {} is configured twice", drive.id)));
            }
            seen.push(drive.id);
        }
        for (name, id) in [("left_device", self.left_device), ("right_device", self.right_device)] {
            if !DeviceId(id).is_valid() {
                return Err(ConfigError::Invalid(format!("{name} = {id} is not a device")));
            }
        }
        Ok(())
    }

    pub fn set_drive(&mut self, id: u8, root: PathBuf) {
        match self.drives.iter_mut().find(|drive| drive.id == id) {
            Some(drive) => drive.root = root,
            None => self.drives.push(DriveConfig { id, root, allow_format: false }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = Config::parse("", Path::new("config.toml")).expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.right_device, 3);
    }

    #[test]
    fn parses_drives_and_overrides() {
        let text = r#"
launcher = "xdg-open"
left_device = 1
debug_log = "/tmp/f256c.log"

[[drive]]
id = 0
root = "/srv/sd"

[[drive]]
id = 1
root = "/srv/floppy"
allow_format = true

[strings]
welcome = "Hi"
"#;
        let config = Config::parse(text, Path::new("config.toml")).expect("parse");
        assert_eq!(config.drives.len(), 2);
        assert!(config.drives[1].allow_format);
        assert!(!config.drives[0].allow_format);
        assert_eq!(config.left_device, 1);
        assert_eq!(config.right_device, 3);
        assert_eq!(config.launcher.as_deref(), Some("xdg-open"));
        assert_eq!(config.strings.get("welcome").map(String::as_str), Some("Hi"));
    }

    #[test]
    fn rejects_memory_drives_and_duplicates() {
        let memory = "[[drive]]\nid = 3\nroot = \"/x\"\n";
        assert!(matches!(Config::parse(memory, Path::new("c")), Err(ConfigError::Invalid(_))));
        let twice = "[[drive]]\nid = 0\nroot = \"/a\"\n[[drive]]\nid = 0\nroot = \"/b\"\n";
        assert!(matches!(Config::parse(twice, Path::new("c")), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::parse("right_device = 7", Path::new("c")), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let err = Config::parse("left_device = [", Path::new("my.toml")).expect_err("bad toml");
        assert!(err.to_string().starts_with("my.toml"));
    }

    #[test]
    fn set_drive_replaces_or_adds() {
        let mut config = Config::default();
        config.set_drive(0, PathBuf::from("/a"));
        config.set_drive(2, PathBuf::from("/b"));
        assert_eq!(config.drives.len(), 2);
        assert_eq!(config.drives[0].root, PathBuf::from("/a"));
    }
}
