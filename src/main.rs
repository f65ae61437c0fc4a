//! Entry point for the **madawm** window manager.
//!
//! Connects to the X server, takes over window management on the default
//! screen and processes events on the main thread until the quit binding
//! is pressed.

use log::{error, info};
use madawm::config::Config;
use madawm::launcher::ShellLauncher;
use madawm::manager::{Commands, Manager};
use madawm::x11::display::X11Display;
use std::path::PathBuf;

/// Resolve the config directory (`$XDG_CONFIG_HOME/madawm`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("madawm")
}

/// The value following `--config`, if given.
fn config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Load the config from `--config <path>` (fatal on failure) or from
/// `$XDG_CONFIG_HOME/madawm/config.json`, falling back to compiled-in
/// defaults.
fn load_config() -> Config {
    if let Some(path) = config_arg() {
        return match Config::load(&path) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };
    }

    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn main() {
    env_logger::init();

    let config = load_config();
    let commands = Commands {
        terminal: config.terminal_command(std::env::var("TERMINAL").ok()),
        browser: config.browser.clone(),
    };
    info!(
        "{} workspaces, terminal {:?}, browser {:?}",
        config.workspace_count(),
        commands.terminal,
        commands.browser
    );

    let display = match X11Display::connect() {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let existing = display.existing_windows().unwrap_or_else(|e| {
        error!("failed to list existing windows: {}", e);
        Vec::new()
    });

    let mut manager = Manager::new(display, ShellLauncher::new(), &config, commands);
    let result = manager
        .start()
        .and_then(|()| manager.adopt(&existing))
        .and_then(|()| manager.run());

    match result {
        Ok(()) => info!("madawm exiting"),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
