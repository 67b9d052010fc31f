#![forbid(unsafe_code)]

pub mod app;
pub mod args;
pub mod bank;
pub mod config;
pub mod console;
pub mod context;
pub mod dialog;
pub mod entry;
pub mod error;
pub mod folder;
pub mod fs_ops;
pub mod host;
pub mod logging;
pub mod menu;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod model;
pub mod msglog;
pub mod pane;
pub mod strings;
pub mod term;
pub mod theme;
pub mod ui;
pub mod viewer;
