//! Where keystack keeps its files on disk
//!
//! ```text
//! <config dir>/keystack/
//!   config.yaml          EngineConfig
//!   bindings/<name>.yaml one saved binding set per handler
//!   logs/keystack.log.*  daily debug log
//! ```
//!
//! `<config dir>` is `$XDG_CONFIG_HOME` or `~/.config` on Unix and macOS,
//! `%APPDATA%` on Windows. The bindings directory can be moved with
//! `bindings_dir` in `config.yaml` or `--bindings-dir` on the command line.

use std::{env, fs, path::PathBuf};

const APP_DIR: &str = "keystack";

/// File name prefix handed to the daily log appender
pub const LOG_FILE_PREFIX: &str = "keystack.log";

/// Root of keystack's files, `None` when no home or config dir is known
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// The engine config read by `EngineConfig::load`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// Default home of `YamlBindingStore` when the config sets no override
pub fn bindings_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("bindings"))
}

/// Target of the file layer installed by `tracing::init`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Newest rotated log, shown by `keystack paths`
///
/// Falls back to the bare prefix path when nothing has been logged yet.
pub fn log_file() -> Option<PathBuf> {
    let logs_dir = logs_dir()?;

    let newest = fs::read_dir(&logs_dir)
        .ok()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        // date suffixes sort lexically
        .max();

    Some(newest.unwrap_or_else(|| logs_dir.join(LOG_FILE_PREFIX)))
}

/// Create the log directory before the appender opens its first file
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = logs_dir().ok_or_else(|| "No config directory available".to_string())?;
    fs::create_dir_all(&logs)
        .map_err(|e| format!("Failed to create log directory {}: {}", logs.display(), e))?;
    Ok(logs)
}
