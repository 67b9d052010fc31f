#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-panel file and memory bank commander for the F256")]
pub struct Args {
    #[arg(long, value_hint = clap::ValueHint::FilePath, help = "Settings file (default ~/.f256commander/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Device shown in the left panel (0-4)")]
    pub left: Option<u8>,

    #[arg(long, help = "Device shown in the right panel (0-4)")]
    pub right: Option<u8>,

    #[arg(
        long = "drive",
        value_name = "ID=PATH",
        value_parser = parse_drive,
        help = "Back disk device ID with a host folder; may be repeated"
    )]
    pub drives: Vec<DriveArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveArg {
    pub id: u8,
    pub root: PathBuf,
}

/// Parses `ID=PATH`.
///
/// ```rust
/// use f256commander::args::parse_drive;
///
/// let drive = parse_drive("0=./sd").unwrap();
/// assert_eq!(drive.id, 0);
/// assert!(parse_drive("sd").is_err());
/// ```
pub fn parse_drive(text: &str) -> Result<DriveArg, String> {
    let (id, root) = text.split_once('=').ok_or_else(|| format!("expected ID=PATH, got {text:?}"))?;
    let id = id.trim().parse::<u8>().map_err(|_| format!("{id:?} is not a device id"))?;
    if root.is_empty() {
        return Err("drive path is empty".to_string());
    }
    Ok(DriveArg { id, root: PathBuf::from(root) })
}

impl Args {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(left) = self.left {
            config.left_device = left;
        }
        if let Some(right) = self.right {
            config.right_device = right;
        }
        for drive in &self.drives {
            config.set_drive(drive.id, drive.root.clone());
        }
    }
}
