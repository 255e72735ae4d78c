use crate::ui::ansi::DEFAULT_COLUMNS;
use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, size as terminal_size},
};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Once;
use std::time::Duration;

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// How often pending key events are checked while the editor waits or a run
/// is in flight.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
pub enum EditorInput {
    Event(Event),
    /// Nothing typed yet; ask again after the next poll tick.
    Pending,
    Closed,
}

/// Source of key events plus the terminal width.
///
/// `next_input` feeds the editor, `poll_event` is drained while a run is in
/// flight. Neither waits for a keystroke.
pub trait Terminal {
    fn next_input(&mut self) -> Result<EditorInput>;
    fn poll_event(&mut self) -> Result<Option<Event>>;
    fn columns(&self) -> usize;
}

pub fn install_panic_hook_once() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore();
            original_hook(panic_info);
        }));
    });
}

pub fn restore() {
    let _ = execute!(io::stdout(), DisableBracketedPaste, Show);
    let _ = disable_raw_mode();
}

pub fn terminal_columns() -> usize {
    terminal_size()
        .ok()
        .map(|(cols, _)| usize::from(cols))
        .filter(|cols| *cols > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Raw mode for one read cycle or one run; released on drop.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn acquire(enabled: bool) -> Result<Self> {
        if enabled {
            enable_raw_mode()?;
            if let Err(err) = execute!(io::stdout(), EnableBracketedPaste) {
                let _ = disable_raw_mode();
                return Err(err.into());
            }
        }
        Ok(Self { active: enabled })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(io::stdout(), DisableBracketedPaste);
            let _ = disable_raw_mode();
        }
    }
}

/// Raw mode turns off output post-processing, so a bare `\n` no longer
/// returns the carriage. This writer restores `\r\n` line endings.
pub struct CrlfWriter<W: Write> {
    inner: W,
    translate: bool,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W, translate: bool) -> Self {
        Self { inner, translate }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.translate {
            return self.inner.write(buf);
        }
        let mut start = 0;
        for (idx, byte) in buf.iter().enumerate() {
            if *byte == b'\n' {
                self.inner.write_all(&buf[start..idx])?;
                self.inner.write_all(b"\r\n")?;
                start = idx + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Interactive terminal backed by crossterm.
pub struct CrosstermTerminal;

impl Terminal for CrosstermTerminal {
    fn next_input(&mut self) -> Result<EditorInput> {
        Ok(match self.poll_event()? {
            Some(event) => EditorInput::Event(event),
            None => EditorInput::Pending,
        })
    }

    fn poll_event(&mut self) -> Result<Option<Event>> {
        if event::poll(Duration::from_millis(0))? {
            return Ok(Some(event::read()?));
        }
        Ok(None)
    }

    fn columns(&self) -> usize {
        terminal_columns()
    }
}

/// Line-oriented input (a pipe or file) presented as key events: each line
/// becomes its characters followed by Enter, end of input becomes Ctrl+D.
/// Reading the next line may wait on the pipe.
pub struct PipedTerminal<R: BufRead> {
    reader: R,
    queued: VecDeque<Event>,
    closed: bool,
}

impl<R: BufRead> PipedTerminal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            queued: VecDeque::new(),
            closed: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            self.closed = true;
            self.queued.push_back(key_event(KeyCode::Char('d'), KeyModifiers::CONTROL));
            return Ok(());
        }
        for ch in line.trim_end_matches(['\r', '\n']).chars() {
            self.queued.push_back(key_event(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        self.queued.push_back(key_event(KeyCode::Enter, KeyModifiers::NONE));
        Ok(())
    }
}

impl<R: BufRead> Terminal for PipedTerminal<R> {
    fn next_input(&mut self) -> Result<EditorInput> {
        if self.queued.is_empty() {
            if self.closed {
                return Ok(EditorInput::Closed);
            }
            self.fill()?;
        }
        Ok(self
            .queued
            .pop_front()
            .map_or(EditorInput::Closed, EditorInput::Event))
    }

    fn poll_event(&mut self) -> Result<Option<Event>> {
        Ok(None)
    }

    fn columns(&self) -> usize {
        terminal_columns()
    }
}

/// Pre-recorded input for non-interactive drivers: `keys` feed the editor,
/// `during_run` is drained by the run loop.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    keys: VecDeque<Event>,
    during_run: VecDeque<Event>,
    columns: Option<usize>,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn press(mut self, code: KeyCode, modifiers: KeyModifiers) -> Self {
        self.keys.push_back(key_event(code, modifiers));
        self
    }

    /// Types `text` and presses Enter.
    pub fn type_line(mut self, text: &str) -> Self {
        for ch in text.chars() {
            self.keys.push_back(key_event(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        self.press(KeyCode::Enter, KeyModifiers::NONE)
    }

    pub fn during_run(mut self, code: KeyCode, modifiers: KeyModifiers) -> Self {
        self.during_run.push_back(key_event(code, modifiers));
        self
    }

    pub fn remaining_keys(&self) -> usize {
        self.keys.len()
    }
}

impl Terminal for ScriptedTerminal {
    fn next_input(&mut self) -> Result<EditorInput> {
        Ok(self
            .keys
            .pop_front()
            .map_or(EditorInput::Closed, EditorInput::Event))
    }

    fn poll_event(&mut self) -> Result<Option<Event>> {
        Ok(self.during_run.pop_front())
    }

    fn columns(&self) -> usize {
        self.columns.unwrap_or(DEFAULT_COLUMNS)
    }
}

pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
    Event::Key(KeyEvent::new(code, modifiers))
}
