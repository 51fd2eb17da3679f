//! Logging setup
//!
//! Installs a `tracing` subscriber. The CLI logs to stderr; the GUI has no
//! console, so it logs to `ngview.log` inside the data directory.
//!
//! The filter comes from `NGVIEW_LOG` (env-filter syntax) and defaults to
//! `info`, or `debug` when debug mode is on.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "NGVIEW_LOG";

/// Log file name used by the GUI
pub const LOG_FILE: &str = "ngview.log";

/// Where log records go
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Log file inside the given data directory
    pub fn file_in(data_dir: &Path) -> Self {
        LogTarget::File(data_dir.join(LOG_FILE))
    }
}

fn filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug_mode { "debug" } else { "info" })
    })
}

/// Initialize the global subscriber. Later calls are ignored.
pub fn init(target: LogTarget, debug_mode: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(debug_mode));

    match target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Start fresh each run
                .open(&path)
            {
                Ok(file) => {
                    let _ = builder
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .try_init();
                }
                Err(e) => {
                    eprintln!("[NgView] Cannot open log file {}: {}", path.display(), e);
                    let _ = builder.with_writer(std::io::stderr).try_init();
                }
            }
        }
    }
}
