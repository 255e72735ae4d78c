pub mod cancel;

use crate::agent::{AgentRuntime, RenderEvent};
use crate::terminal::{CrlfWriter, RawModeGuard, Terminal, INPUT_POLL_INTERVAL};
use crate::ui::editor::{EditorOutcome, RawInputEditor};
use crate::ui::stream::StreamRenderer;
use crate::ui::theme::{ACCENT, BOLD, MUTED, RESET};
use crate::ui::tool_activity::{format_call, format_result};
use anyhow::Result;
use cancel::{event_bytes, CancellationBridge};
use futures::StreamExt;
use std::io::{self, Write};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Put the terminal in raw mode while reading and while a run is active.
    pub raw_mode: bool,
    pub model_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Idle,
    Reading,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Empty,
    Exit,
    Prompt(String),
}

pub fn classify(text: &str) -> Submission {
    match text.trim() {
        "" => Submission::Empty,
        "exit" | "quit" => Submission::Exit,
        prompt => Submission::Prompt(prompt.to_string()),
    }
}

pub fn header() -> String {
    format!("\n {ACCENT}{BOLD}⚡ crux{RESET} {MUTED}— ops agent{RESET}\n\n")
}

pub fn farewell() -> String {
    format!("{MUTED} Goodbye.{RESET}\n")
}

/// Read, run, render; one run at a time.
pub struct Console<T: Terminal, R: AgentRuntime, W: Write> {
    terminal: T,
    runtime: R,
    out: CrlfWriter<W>,
    renderer: StreamRenderer,
    raw_mode: bool,
    state: ConsoleState,
}

impl<T: Terminal, R: AgentRuntime, W: Write> Console<T, R, W> {
    pub fn new(terminal: T, runtime: R, out: W, options: ConsoleOptions) -> Self {
        Self {
            terminal,
            runtime,
            out: CrlfWriter::new(out, options.raw_mode),
            renderer: StreamRenderer::new(options.model_label),
            raw_mode: options.raw_mode,
            state: ConsoleState::Idle,
        }
    }

    pub fn state(&self) -> ConsoleState {
        self.state
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn output(&self) -> &W {
        self.out.get_ref()
    }

    pub fn renderer(&self) -> &StreamRenderer {
        &self.renderer
    }

    fn transition(&mut self, next: ConsoleState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "console state");
            self.state = next;
        }
    }

    /// Returns once the operator quits or input closes.
    pub async fn run(&mut self) -> Result<()> {
        write!(self.out, "{}", header())?;
        self.out.flush()?;

        loop {
            self.transition(ConsoleState::Reading);
            let outcome = {
                let _raw = RawModeGuard::acquire(self.raw_mode)?;
                RawInputEditor::new()
                    .read(&mut self.terminal, &mut self.out)
                    .await?
            };

            let text = match outcome {
                EditorOutcome::Submitted(text) => text,
                EditorOutcome::Quit => {
                    writeln!(self.out)?;
                    return self.finish();
                }
            };

            match classify(&text) {
                Submission::Empty => self.transition(ConsoleState::Idle),
                Submission::Exit => return self.finish(),
                Submission::Prompt(prompt) => {
                    self.run_turn(&prompt).await?;
                    self.transition(ConsoleState::Idle);
                }
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        write!(self.out, "{}", farewell())?;
        self.out.flush()?;
        self.transition(ConsoleState::Idle);
        tracing::info!(runs = self.renderer.stats().completed_runs, "console closed");
        Ok(())
    }

    async fn run_turn(&mut self, prompt: &str) -> Result<()> {
        self.transition(ConsoleState::Running);
        tracing::info!(chars = prompt.chars().count(), "starting run");

        let _raw = RawModeGuard::acquire(self.raw_mode)?;
        let mut bridge = CancellationBridge::arm();
        let columns = self.terminal.columns();
        self.renderer.begin_run(columns);

        let mut events = self.runtime.run(prompt);
        let mut input_tick = tokio::time::interval(INPUT_POLL_INTERVAL);
        input_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else {
                        tracing::warn!("event stream ended before the run settled");
                        self.renderer.settle_partial_output(&mut self.out)?;
                        break;
                    };
                    let settled = event.is_terminal();
                    self.dispatch(&event, columns)?;
                    if settled {
                        break;
                    }
                }
                _ = input_tick.tick() => {
                    self.drain_input(&mut bridge)?;
                }
            }
        }

        tracing::info!(aborted = bridge.fired(), "run settled");
        Ok(())
    }

    /// Input typed during a run only matters for interrupts; the rest is
    /// discarded so it cannot leak into the next prompt.
    fn drain_input(&mut self, bridge: &mut CancellationBridge) -> Result<()> {
        while let Some(event) = self.terminal.poll_event()? {
            let bytes = event_bytes(&event);
            if bridge.inspect(&bytes, &self.runtime, &mut self.out)? {
                self.renderer.mark_abort_announced();
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: &RenderEvent, columns: usize) -> io::Result<()> {
        match event {
            RenderEvent::ToolCall(call) => {
                tracing::debug!(tool = %call.name, id = %call.id, "tool call");
                write!(self.out, "{}", format_call(call))?;
            }
            RenderEvent::ToolResult(result) => {
                tracing::debug!(tool = %result.name, is_error = result.is_error, "tool result");
                write!(self.out, "{}", format_result(result, columns))?;
            }
            other => return self.renderer.render(other, &mut self.out),
        }
        self.out.flush()
    }
}
