use crate::agent::{RenderEvent, Usage};
use crate::error::AgentError;
use crate::ui::ansi::DEFAULT_COLUMNS;
use crate::ui::markdown::{render_line, render_markdown};
use crate::ui::theme::{BOLD, DIM, ERROR, MUTED, RESET, THINKING, WARNING};
use std::io::{self, Write};

pub fn abort_warning() -> String {
    format!("\n{WARNING} ⚠ Aborted{RESET}\n")
}

pub fn error_line(message: &str) -> String {
    format!("{ERROR}{BOLD} ✗ {message}{RESET}\n")
}

/// Counters that live for the whole console session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub completed_runs: u64,
    pub last_tokens: u64,
}

impl SessionStats {
    fn record(&mut self, usage: Usage) {
        self.completed_runs += 1;
        self.last_tokens = usage.total();
    }
}

/// Turns thinking, output and settlement events into styled terminal text.
///
/// Output arrives in arbitrary chunks; only complete lines are formatted
/// and printed, the unterminated tail waits in `pending` until its newline
/// or the end of the output block.
#[derive(Debug)]
pub struct StreamRenderer {
    model_label: String,
    columns: usize,
    pending: String,
    in_fence: bool,
    output_started: bool,
    abort_announced: bool,
    stats: SessionStats,
}

impl StreamRenderer {
    pub fn new(model_label: impl Into<String>) -> Self {
        Self {
            model_label: model_label.into(),
            columns: DEFAULT_COLUMNS,
            pending: String::new(),
            in_fence: false,
            output_started: false,
            abort_announced: false,
            stats: SessionStats::default(),
        }
    }

    pub fn begin_run(&mut self, columns: usize) {
        self.columns = columns;
        self.pending.clear();
        self.in_fence = false;
        self.output_started = false;
        self.abort_announced = false;
    }

    /// The abort warning was already shown for this run.
    pub fn mark_abort_announced(&mut self) {
        self.abort_announced = true;
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn in_fence(&self) -> bool {
        self.in_fence
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Tool events are not handled here and produce no output.
    pub fn render<W: Write>(&mut self, event: &RenderEvent, out: &mut W) -> io::Result<()> {
        match event {
            RenderEvent::ThinkingStart => {}
            RenderEvent::ThinkingChunk { text } => {
                write!(out, "{THINKING}{DIM}{text}{RESET}")?;
            }
            RenderEvent::ThinkingEnd => writeln!(out)?,
            RenderEvent::OutputStart => {
                self.output_started = true;
                writeln!(out)?;
            }
            RenderEvent::OutputChunk { text } => self.push_output(text, out)?,
            RenderEvent::OutputEnd => self.end_output(out)?,
            RenderEvent::ToolCall(_) | RenderEvent::ToolResult(_) => {}
            RenderEvent::Complete { response, usage } => {
                self.settle_partial_output(out)?;
                if !self.output_started && !response.is_empty() {
                    writeln!(out, "{}", render_markdown(response, self.columns))?;
                }
                self.stats.record(*usage);
                writeln!(
                    out,
                    " {MUTED}{} · {} steps · {} tokens{RESET}",
                    self.model_label, self.stats.completed_runs, self.stats.last_tokens
                )?;
            }
            RenderEvent::Error { error } => {
                self.settle_partial_output(out)?;
                self.render_error(error, out)?;
            }
        }
        out.flush()
    }

    fn render_error<W: Write>(&mut self, error: &AgentError, out: &mut W) -> io::Result<()> {
        if error.is_abort() {
            if !self.abort_announced {
                self.abort_announced = true;
                write!(out, "{}", abort_warning())?;
            }
            return Ok(());
        }
        tracing::debug!(%error, "run failed");
        write!(out, "{}", error_line(&error.to_string()))
    }

    fn push_output<W: Write>(&mut self, chunk: &str, out: &mut W) -> io::Result<()> {
        self.output_started = true;
        self.pending.extend(chunk.chars().filter(|ch| *ch != '\r'));

        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            let line = &line[..line.len() - 1];
            writeln!(out, "{}", render_line(line, &mut self.in_fence, self.columns))?;
        }
        Ok(())
    }

    fn end_output<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            write!(out, "{}", render_line(&line, &mut self.in_fence, self.columns))?;
        }
        self.in_fence = false;
        if self.output_started {
            writeln!(out)?;
        }
        Ok(())
    }

    /// A run can settle in the middle of an output block. Whatever is still
    /// pending is printed so the next line starts clean.
    pub fn settle_partial_output<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.end_output(out)
    }
}
