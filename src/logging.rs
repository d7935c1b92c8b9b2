use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_PATH_ENV: &str = "CHEZ_TUI_LOG";

/// The TUI owns stdout, so events only go somewhere when `CHEZ_TUI_LOG`
/// names a file. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path() {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file: {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }

    Ok(())
}

fn log_path() -> Option<PathBuf> {
    parse_log_path(std::env::var(LOG_PATH_ENV).ok())
}

fn parse_log_path(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
