use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILE: &str = "crux-debug.log";

/// Where log lines go, if anywhere. Stdout belongs to the console.
pub fn resolve_log_path(config: &Config) -> Option<PathBuf> {
    config.log_path.clone().or_else(|| {
        if config.debug {
            Some(std::env::temp_dir().join(DEFAULT_LOG_FILE))
        } else {
            None
        }
    })
}

fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "crux=debug" } else { "crux=info" })
    })
}

/// Installs the global subscriber and returns the log file path.
pub fn init(config: &Config) -> Result<Option<PathBuf>> {
    let Some(path) = resolve_log_path(config) else {
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(default_filter(config.debug))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(Some(path))
}
