use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TASKFLOW_LOG=debug`
pub const LOG_ENV: &str = "TASKFLOW_LOG";
pub const LOG_FILE: &str = "taskflow.log";
const DEFAULT_FILTER: &str = "info";

/// Filter from `TASKFLOW_LOG`, falling back to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Send tracing output to `taskflow.log` under `log_dir`. Logs go to a file
/// because the TUI owns the terminal.
pub fn init(log_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(path)
}
