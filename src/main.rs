#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use f256commander::app::App;
use f256commander::args::Args;
use f256commander::config::Config;
use f256commander::dialog::TextDialogs;
use f256commander::fs_ops::FsHost;
use f256commander::logging;
use f256commander::model::DeviceId;
use f256commander::strings::StringTable;
use f256commander::term::TermConsole;
use f256commander::theme::ThemeColors;

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref()).context("loading settings")?;
    args.apply_to(&mut config);
    config.validate().context("checking command-line devices")?;

    let log_path = logging::log_path(config.debug_log.as_deref());
    logging::init(log_path.as_deref()).context("opening the diagnostics log")?;

    let (strings, unknown) = StringTable::with_overrides(&config.strings);
    for key in unknown {
        log::warn!("unknown string override {key:?}");
    }
    let theme = ThemeColors::classic();
    let host = FsHost::from_config(&config).context("preparing devices")?;
    let (left, right) = (DeviceId(config.left_device), DeviceId(config.right_device));
    log::info!("starting with {} | {}", left.label(), right.label());

    let dialogs = TextDialogs::new(&theme, &strings);
    let console = TermConsole::new().context("setting up the terminal")?;
    let mut app = App::new(console, host, dialogs, strings, theme, left, right);
    app.run();
    Ok(())
}
