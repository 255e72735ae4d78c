use crate::util::{env_flag, env_nonempty};
use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const MODEL_ENV: &str = "CRUX_MODEL";
const LOG_PATH_ENV: &str = "CRUX_LOG_PATH";
const DEBUG_ENV: &str = "CRUX_DEBUG";
const CHUNK_DELAY_ENV: &str = "CRUX_CHUNK_DELAY_MS";

const DEFAULT_MODEL: &str = "echo";
const DEFAULT_CHUNK_DELAY_MS: u64 = 20;
const MAX_CHUNK_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "crux", version, about = "Interactive agent console")]
pub struct Cli {
    /// Write debug logs (to CRUX_LOG_PATH or the temp dir)
    #[arg(long)]
    pub debug: bool,

    /// Replay a JSON-lines file of render events for every prompt
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Model label shown in the status line
    #[arg(long, value_name = "LABEL")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model: String,
    pub debug: bool,
    pub log_path: Option<PathBuf>,
    pub replay: Option<PathBuf>,
    pub chunk_delay_ms: u64,
}

impl Config {
    /// Flags win over environment variables.
    pub fn load(cli: &Cli) -> Result<Self> {
        let model = cli
            .model
            .clone()
            .or_else(|| env_nonempty(MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let debug = cli.debug || env_flag(DEBUG_ENV);

        let log_path = env_nonempty(LOG_PATH_ENV).map(PathBuf::from);

        let chunk_delay_ms = match env_nonempty(CHUNK_DELAY_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => ms.min(MAX_CHUNK_DELAY_MS),
                Err(_) => bail!("Invalid {CHUNK_DELAY_ENV} '{raw}': expected milliseconds"),
            },
            None => DEFAULT_CHUNK_DELAY_MS,
        };

        Ok(Self {
            model,
            debug,
            log_path,
            replay: cli.replay.clone(),
            chunk_delay_ms,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            bail!("Model label must not be empty (set --model or {MODEL_ENV})");
        }

        if let Some(path) = &self.replay {
            if !path.is_file() {
                bail!("Replay file '{}' does not exist or is not a file", path.display());
            }
        }

        Ok(())
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}
