#![forbid(unsafe_code)]

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};

pub const DEBUG_LOG_ENV: &str = "F256C_DEBUG_LOG";
pub const LOG_FILTER_ENV: &str = "F256C_LOG";

pub fn log_path(configured: Option<&Path>) -> Option<PathBuf> {
    match std::env::var_os(DEBUG_LOG_ENV) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => configured.map(Path::to_path_buf),
    }
}

fn timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    time::format_description::parse("[hour]:[minute]:[second].[subsecond digits:3]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_default()
}

pub fn init(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else { return Ok(()) };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Builder::from_env(Env::default().filter_or(LOG_FILTER_ENV, "debug"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(buf, "{} {:<5} {}: {}", timestamp(), record.level(), record.target(), record.args())
        })
        .try_init()
        .map_err(io::Error::other)?;
    log::info!("logging to {}", path.display());
    Ok(())
}
