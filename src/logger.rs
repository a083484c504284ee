//! Per-run log for PixelGrid.
//!
//! `init` opens `PixelGrid/pixelgrid.log` under the user's data directory,
//! wiping whatever the previous run left behind.  After that the
//! `log_info!` / `log_warn!` / `log_err!` macros append timestamped lines to
//! it from anywhere in the crate.
//!
//! Without `init` (unit tests, `--export-blank`) the macros do nothing.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

const APP_DIR: &str = "PixelGrid";
const LOG_NAME: &str = "pixelgrid.log";

struct Session {
    path: PathBuf,
    file: Mutex<File>,
}

static SESSION: OnceLock<Session> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        })
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::record($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Where this run is logging, once [`init`] succeeded.
pub fn log_path() -> Option<&'static Path> {
    SESSION.get().map(|s| s.path.as_path())
}

pub fn record(level: Level, msg: &str) {
    append(&format_line(&timestamp(), level, msg));
}

fn append(line: &str) {
    let Some(session) = SESSION.get() else { return };
    if let Ok(mut file) = session.file.lock() {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(ts: &str, level: Level, msg: &str) -> String {
    format!("[{}] [{}] {}", ts, level, msg)
}

/// Open the log for this run and hook panics into it.  A log that cannot be
/// opened is reported on stderr and the app carries on without one.
pub fn init() {
    let path = base_dir(|key| std::env::var(key).ok())
        .join(APP_DIR)
        .join(LOG_NAME);

    let file = match open_truncated(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("pixelgrid: no session log at {}: {}", path.display(), e);
            return;
        }
    };
    let _ = SESSION.set(Session {
        path: path.clone(),
        file: Mutex::new(file),
    });

    append(&format!(
        "--- PixelGrid {} started at unix {} ---",
        env!("CARGO_PKG_VERSION"),
        unix_seconds().unwrap_or_default()
    ));
    append(&format!("log: {}", path.display()));

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        record(Level::Panic, &info.to_string());
        previous(info);
    }));
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

/// Per-user data directory, resolved through `env` so it can be tested.
fn base_dir(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if cfg!(target_os = "windows")
        && let Some(appdata) = env("APPDATA")
    {
        return PathBuf::from(appdata);
    }
    if cfg!(target_os = "macos")
        && let Some(home) = env("HOME")
    {
        return Path::new(&home).join("Library/Application Support");
    }
    if let Some(xdg) = env("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    env("HOME").map_or_else(|| PathBuf::from("."), |home| Path::new(&home).join(".local/share"))
}

fn unix_seconds() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

fn timestamp() -> String {
    unix_seconds().map_or_else(|| "--:--:--".to_string(), clock_string)
}

/// `HH:MM:SS` of the UTC day.
fn clock_string(secs: u64) -> String {
    let day = secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, day % 3600 / 60, day % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_wraps_at_midnight() {
        assert_eq!(clock_string(0), "00:00:00");
        assert_eq!(clock_string(3 * 3600 + 25 * 60 + 7), "03:25:07");
        assert_eq!(clock_string(86_400 + 61), "00:01:01");
    }

    #[test]
    fn line_layout() {
        assert_eq!(
            format_line("12:00:00", Level::Warn, "export unavailable"),
            "[12:00:00] [WARN] export unavailable"
        );
    }

    #[test]
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn base_dir_prefers_xdg_then_home() {
        let xdg = base_dir(|k| match k {
            "XDG_DATA_HOME" => Some("/data".into()),
            "HOME" => Some("/home/ada".into()),
            _ => None,
        });
        assert_eq!(xdg, PathBuf::from("/data"));

        let home = base_dir(|k| (k == "HOME").then(|| "/home/ada".into()));
        assert_eq!(home, PathBuf::from("/home/ada/.local/share"));

        assert_eq!(base_dir(|_| None), PathBuf::from("."));
    }

    #[test]
    fn logging_before_init_is_silent() {
        crate::log_info!("cell {} painted", 3);
        crate::log_err!("encode failed: {}", "boom");
        assert!(log_path().is_none());
    }
}
