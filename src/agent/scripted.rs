use super::{paced_stream, AgentRuntime, EventStream, RenderEvent};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Replays the same event script for every run.
pub struct ScriptedRuntime {
    events: Vec<RenderEvent>,
    delay: Duration,
    cancel: CancellationToken,
    prompts: Vec<String>,
    aborts: AtomicUsize,
}

impl ScriptedRuntime {
    pub fn new(events: Vec<RenderEvent>) -> Self {
        Self {
            events,
            delay: Duration::ZERO,
            cancel: CancellationToken::new(),
            prompts: Vec::new(),
            aborts: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// One JSON-encoded `RenderEvent` per line; blank lines are skipped.
    pub fn from_jsonl<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RenderEvent = serde_json::from_str(&line)
                .with_context(|| format!("invalid render event on line {}", idx + 1))?;
            events.push(event);
        }
        Ok(Self::new(events))
    }

    pub fn from_jsonl_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        Self::from_jsonl(std::io::BufReader::new(file))
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl AgentRuntime for ScriptedRuntime {
    fn run(&mut self, prompt: &str) -> EventStream {
        self.prompts.push(prompt.to_string());
        self.cancel = CancellationToken::new();
        paced_stream(self.events.clone(), self.delay, self.cancel.clone())
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
    }
}
