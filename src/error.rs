#![forbid(unsafe_code)]

use std::io;

use crate::model::DeviceId;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("device {0} is not available")]
    DeviceUnavailable(DeviceId),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("bank {0} is read-only")]
    ReadOnly(usize),

    #[error("bank {0} does not exist")]
    NoSuchBank(usize),

    #[error("not supported: {0}")]
    Unsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HostError {
    pub fn code(&self) -> Option<i32> {
        match self {
            HostError::Io(err) => err.raw_os_error(),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("path is longer than {max} characters")]
    PathTooLong { max: usize },

    #[error("no file name in path {0:?}")]
    EmptyName(String),

    #[error("{0} is a folder")]
    IsDirectory(String),

    #[error("read failed: {0}")]
    Read(#[from] io::Error),

    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("nothing is selected")]
    NoSelection,

    #[error("only available for {0}")]
    WrongMode(&'static str),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Host(#[from] HostError),
}

pub type HostResult<T> = std::result::Result<T, HostError>;
pub type EntryResult<T> = std::result::Result<T, EntryError>;
pub type PanelResult<T> = std::result::Result<T, PanelError>;
