use crate::agent::AgentRuntime;
use crate::ui::stream::abort_warning;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::{self, Write};

/// What a raw terminal delivers for Ctrl+C.
pub const INTERRUPT_BYTE: u8 = 0x03;

/// Watches input during one run and turns the first interrupt into an abort.
///
/// Create one per run with `arm`; dropping it detaches it.
#[derive(Debug)]
pub struct CancellationBridge {
    fired: bool,
}

impl CancellationBridge {
    pub fn arm() -> Self {
        Self { fired: false }
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Returns true when this call raised the abort.
    pub fn inspect<R, W>(&mut self, bytes: &[u8], runtime: &R, out: &mut W) -> io::Result<bool>
    where
        R: AgentRuntime + ?Sized,
        W: Write,
    {
        if self.fired || !bytes.contains(&INTERRUPT_BYTE) {
            return Ok(false);
        }
        self.fired = true;
        tracing::info!("interrupt received, aborting run");
        runtime.abort();
        write!(out, "{}", abort_warning())?;
        out.flush()?;
        Ok(true)
    }
}

/// Bytes a raw-mode terminal would have produced for `event`.
pub fn event_bytes(event: &Event) -> Vec<u8> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char(ch) if ctrl && ch.is_ascii_alphabetic() => {
                    vec![(ch.to_ascii_lowercase() as u8) & 0x1f]
                }
                KeyCode::Char(ch) => ch.to_string().into_bytes(),
                KeyCode::Enter => vec![b'\r'],
                KeyCode::Tab => vec![b'\t'],
                KeyCode::Backspace => vec![0x7f],
                KeyCode::Esc => vec![0x1b],
                _ => Vec::new(),
            }
        }
        Event::Paste(text) => text.clone().into_bytes(),
        _ => Vec::new(),
    }
}
