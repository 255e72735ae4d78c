use crate::terminal::{EditorInput, Terminal, INPUT_POLL_INTERVAL};
use crate::ui::ansi::{char_display_width, display_width, visible_width};
use crate::ui::theme::{ACCENT, BOLD, MUTED, RESET};
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::Write;
use tokio::time::MissedTickBehavior;

/// Lines being composed. Never empty; `current` always indexes a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    lines: Vec<String>,
    current: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            current: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_line(&self) -> &str {
        &self.lines[self.current]
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn push_char(&mut self, ch: char) {
        self.lines[self.current].push(ch);
    }

    fn open_line_below(&mut self) {
        self.current += 1;
        self.lines.insert(self.current, String::new());
    }

    fn pop_char(&mut self) -> bool {
        self.lines[self.current].pop().is_some()
    }

    fn remove_current_line(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.lines.remove(self.current);
        self.current -= 1;
        true
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Echo(char),
    RedrawLine,
    NewLine,
    /// The current line was removed and editing moved up one line.
    JoinPrevious,
    Submit(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Submitted(String),
    Quit,
}

pub fn prompt_prefix() -> String {
    format!("{ACCENT}{BOLD}❯ {RESET}")
}

pub fn continuation_prefix() -> String {
    format!("{MUTED}· {RESET}")
}

/// Rows between the first row of a `width`-column line and the row holding
/// the cursor at its end. A line exactly `columns` wide has not wrapped yet.
fn rows_above_cursor(width: usize, columns: usize) -> usize {
    width.saturating_sub(1) / columns.max(1)
}

fn cursor_up(rows: usize) -> String {
    if rows == 0 {
        String::new()
    } else {
        format!("\x1b[{rows}A")
    }
}

/// Multi-line editor fed one key event at a time.
#[derive(Debug, Default)]
pub struct RawInputEditor {
    buffer: InputBuffer,
    /// Columns occupied on screen by the current line, prefix included.
    drawn: usize,
}

impl RawInputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn apply_event(&mut self, event: Event) -> Vec<EditorAction> {
        match event {
            Event::Key(key) => vec![self.apply_key(key)],
            Event::Paste(text) => self.apply_paste(&text),
            _ => Vec::new(),
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.kind == KeyEventKind::Release {
            return EditorAction::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('c') if ctrl => EditorAction::Quit,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    EditorAction::Quit
                } else {
                    EditorAction::None
                }
            }
            KeyCode::Char('j') if ctrl => self.new_line(),
            KeyCode::Enter if alt || shift || ctrl => self.new_line(),
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.buffer).text();
                EditorAction::Submit(text)
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(ch) if !ctrl && !alt && !ch.is_control() => {
                self.buffer.push_char(ch);
                EditorAction::Echo(ch)
            }
            _ => EditorAction::None,
        }
    }

    fn apply_paste(&mut self, text: &str) -> Vec<EditorAction> {
        text.chars()
            .filter_map(|ch| match ch {
                '\r' => None,
                '\n' => Some(self.new_line()),
                ch if ch.is_control() && ch != '\t' => None,
                ch => {
                    self.buffer.push_char(ch);
                    Some(EditorAction::Echo(ch))
                }
            })
            .collect()
    }

    fn new_line(&mut self) -> EditorAction {
        self.buffer.open_line_below();
        EditorAction::NewLine
    }

    fn backspace(&mut self) -> EditorAction {
        if self.buffer.pop_char() {
            return EditorAction::RedrawLine;
        }
        if self.buffer.remove_current_line() {
            return EditorAction::JoinPrevious;
        }
        EditorAction::None
    }

    fn line_prefix(&self) -> String {
        if self.buffer.current() == 0 {
            prompt_prefix()
        } else {
            continuation_prefix()
        }
    }

    fn current_width(&self) -> usize {
        visible_width(&self.line_prefix()) + display_width(self.buffer.current_line())
    }

    /// Writes the visible effect of `action` on a terminal `columns` wide.
    ///
    /// Redraws start from the first row of the edited line so wrapped rows
    /// are cleared too.
    pub fn paint<W: Write>(
        &mut self,
        action: &EditorAction,
        columns: usize,
        out: &mut W,
    ) -> std::io::Result<()> {
        match action {
            EditorAction::None | EditorAction::Quit => return Ok(()),
            EditorAction::Echo(ch) => {
                write!(out, "{ch}")?;
                self.drawn += char_display_width(*ch);
            }
            EditorAction::RedrawLine => {
                let up = rows_above_cursor(self.drawn, columns);
                write!(
                    out,
                    "\r{}\x1b[J{}{}",
                    cursor_up(up),
                    self.line_prefix(),
                    self.buffer.current_line()
                )?;
                self.drawn = self.current_width();
            }
            EditorAction::NewLine => {
                let prefix = continuation_prefix();
                write!(out, "\n{prefix}")?;
                self.drawn = visible_width(&prefix);
            }
            EditorAction::JoinPrevious => {
                // The removed line's rows, then the previous line's wrapped rows.
                let target = self.current_width();
                let up = rows_above_cursor(self.drawn, columns)
                    + 1
                    + rows_above_cursor(target, columns);
                write!(
                    out,
                    "\r{}\x1b[J{}{}",
                    cursor_up(up),
                    self.line_prefix(),
                    self.buffer.current_line()
                )?;
                self.drawn = target;
            }
            EditorAction::Submit(_) => {
                writeln!(out)?;
                self.drawn = 0;
            }
        }
        out.flush()
    }

    /// Shows the prompt and edits until submission or quit. Waits for keys
    /// by polling, yielding to the runtime between checks.
    pub async fn read<T: Terminal, W: Write>(
        mut self,
        term: &mut T,
        out: &mut W,
    ) -> Result<EditorOutcome> {
        let prompt = prompt_prefix();
        write!(out, "{prompt}")?;
        out.flush()?;
        self.drawn = visible_width(&prompt);

        let mut input_tick = tokio::time::interval(INPUT_POLL_INTERVAL);
        input_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = match term.next_input()? {
                EditorInput::Event(event) => event,
                EditorInput::Pending => {
                    input_tick.tick().await;
                    continue;
                }
                EditorInput::Closed => return Ok(EditorOutcome::Quit),
            };
            let columns = term.columns();
            for action in self.apply_event(event) {
                self.paint(&action, columns, out)?;
                match action {
                    EditorAction::Submit(text) => return Ok(EditorOutcome::Submitted(text)),
                    EditorAction::Quit => return Ok(EditorOutcome::Quit),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(editor: &mut RawInputEditor, text: &str) -> Vec<EditorAction> {
        text.chars()
            .map(|ch| editor.apply_key(key(KeyCode::Char(ch))))
            .collect()
    }

    #[test]
    fn test_printable_keys_accumulate_without_submitting() {
        let mut editor = RawInputEditor::new();
        let actions = type_text(&mut editor, "Hello, World!");
        assert!(actions.iter().all(|a| matches!(a, EditorAction::Echo(_))));
        assert_eq!(editor.buffer().text(), "Hello, World!");
        assert_eq!(editor.buffer().lines().len(), 1);
    }

    #[test]
    fn test_plain_enter_submits_and_resets_buffer() {
        let mut editor = RawInputEditor::new();
        type_text(&mut editor, "ls");
        assert_eq!(
            editor.apply_key(key(KeyCode::Enter)),
            EditorAction::Submit("ls".to_string())
        );
        assert!(editor.buffer().is_empty());

        assert_eq!(
            editor.apply_key(key(KeyCode::Enter)),
            EditorAction::Submit(String::new())
        );
    }

    #[test]
    fn test_modified_enter_inserts_line() {
        let mut editor = RawInputEditor::new();
        type_text(&mut editor, "one");
        assert_eq!(
            editor.apply_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)),
            EditorAction::NewLine
        );
        type_text(&mut editor, "two");
        assert_eq!(
            editor.apply_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL)),
            EditorAction::NewLine
        );
        type_text(&mut editor, "three");
        assert_eq!(editor.buffer().current(), 2);
        assert_eq!(
            editor.apply_key(key(KeyCode::Enter)),
            EditorAction::Submit("one\ntwo\nthree".to_string())
        );
    }

    #[test]
    fn test_backspace_edits_line_then_joins_previous() {
        let mut editor = RawInputEditor::new();
        type_text(&mut editor, "ab");
        editor.apply_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut editor, "c");

        assert_eq!(editor.apply_key(key(KeyCode::Backspace)), EditorAction::RedrawLine);
        assert_eq!(editor.buffer().current_line(), "");
        assert_eq!(editor.apply_key(key(KeyCode::Backspace)), EditorAction::JoinPrevious);
        assert_eq!(editor.buffer().current(), 0);
        assert_eq!(editor.buffer().current_line(), "ab");
        assert_eq!(editor.apply_key(key(KeyCode::Backspace)), EditorAction::RedrawLine);
        assert_eq!(editor.buffer().text(), "a");

        let mut empty = RawInputEditor::new();
        assert_eq!(empty.apply_key(key(KeyCode::Backspace)), EditorAction::None);
        assert_eq!(empty.buffer().lines().len(), 1);
    }

    #[test]
    fn test_interrupt_and_eof_quit() {
        let mut editor = RawInputEditor::new();
        type_text(&mut editor, "pending");
        assert_eq!(
            editor.apply_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            EditorAction::None
        );
        assert_eq!(
            editor.apply_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            EditorAction::Quit
        );

        let mut empty = RawInputEditor::new();
        assert_eq!(
            empty.apply_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            EditorAction::Quit
        );
    }

    #[test]
    fn test_navigation_and_function_keys_are_ignored() {
        let mut editor = RawInputEditor::new();
        type_text(&mut editor, "x");
        for code in [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Tab,
            KeyCode::BackTab,
            KeyCode::Esc,
            KeyCode::Home,
            KeyCode::End,
            KeyCode::PageUp,
            KeyCode::PageDown,
            KeyCode::Insert,
            KeyCode::Delete,
            KeyCode::F(5),
        ] {
            assert_eq!(editor.apply_key(key(code)), EditorAction::None, "{code:?}");
        }
        assert_eq!(
            editor.apply_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)),
            EditorAction::None
        );
        assert_eq!(editor.buffer().text(), "x");
    }

    #[test]
    fn test_paste_splits_lines_without_submitting() {
        let mut editor = RawInputEditor::new();
        let actions = editor.apply_event(Event::Paste("a\r\nb".to_string()));
        assert_eq!(
            actions,
            vec![
                EditorAction::Echo('a'),
                EditorAction::NewLine,
                EditorAction::Echo('b')
            ]
        );
        assert_eq!(editor.buffer().text(), "a\nb");
    }

    /// Applies `code` and paints the result, like `read` does.
    fn press_and_paint(editor: &mut RawInputEditor, code: KeyEvent, columns: usize) -> String {
        let action = editor.apply_key(code);
        let mut out = Vec::new();
        editor.paint(&action, columns, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn type_and_paint(editor: &mut RawInputEditor, text: &str, columns: usize) {
        for ch in text.chars() {
            press_and_paint(editor, key(KeyCode::Char(ch)), columns);
        }
    }

    /// Editor as `read` leaves it right after printing the prompt.
    fn prompted_editor() -> RawInputEditor {
        let mut editor = RawInputEditor::new();
        editor.drawn = visible_width(&prompt_prefix());
        editor
    }

    #[tokio::test]
    async fn test_read_echoes_keys_and_returns_submission() {
        let mut term = ScriptedTerminal::new()
            .type_line("hi")
            .press(KeyCode::Char('z'), KeyModifiers::NONE);
        let mut out = Vec::new();
        let outcome = RawInputEditor::new().read(&mut term, &mut out).await.unwrap();

        assert_eq!(outcome, EditorOutcome::Submitted("hi".to_string()));
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}hi\n", prompt_prefix()));
        assert_eq!(term.remaining_keys(), 1);
    }

    /// Reports nothing typed for a few polls before handing out keys.
    struct IdleThenScripted {
        idle_polls: usize,
        keys: ScriptedTerminal,
    }

    impl Terminal for IdleThenScripted {
        fn next_input(&mut self) -> Result<EditorInput> {
            if self.idle_polls > 0 {
                self.idle_polls -= 1;
                return Ok(EditorInput::Pending);
            }
            self.keys.next_input()
        }

        fn poll_event(&mut self) -> Result<Option<Event>> {
            Ok(None)
        }

        fn columns(&self) -> usize {
            80
        }
    }

    #[tokio::test]
    async fn test_read_waits_while_input_is_pending() {
        let mut term = IdleThenScripted {
            idle_polls: 3,
            keys: ScriptedTerminal::new().type_line("ok"),
        };
        let mut out = Vec::new();
        let outcome = RawInputEditor::new().read(&mut term, &mut out).await.unwrap();
        assert_eq!(outcome, EditorOutcome::Submitted("ok".to_string()));
        assert_eq!(term.idle_polls, 0);
    }

    #[tokio::test]
    async fn test_read_quits_when_input_closes() {
        let mut term = ScriptedTerminal::new();
        let mut out = Vec::new();
        let outcome = RawInputEditor::new().read(&mut term, &mut out).await.unwrap();
        assert_eq!(outcome, EditorOutcome::Quit);
    }

    #[test]
    fn test_backspace_on_short_line_stays_on_its_row() {
        let mut editor = prompted_editor();
        type_and_paint(&mut editor, "abc", 80);
        assert_eq!(
            press_and_paint(&mut editor, key(KeyCode::Backspace), 80),
            format!("\r\x1b[J{}ab", prompt_prefix())
        );
    }

    #[test]
    fn test_backspace_on_wrapped_line_redraws_from_first_row() {
        let mut editor = prompted_editor();
        // prompt (2) + 30 chars on a 20-column terminal spans two rows
        type_and_paint(&mut editor, &"x".repeat(30), 20);
        let painted = press_and_paint(&mut editor, key(KeyCode::Backspace), 20);
        assert_eq!(
            painted,
            format!("\r\x1b[1A\x1b[J{}{}", prompt_prefix(), "x".repeat(29))
        );

        // 2 + 18 fits exactly in one row, no wrap yet
        let mut exact = prompted_editor();
        type_and_paint(&mut exact, &"y".repeat(18), 20);
        let painted = press_and_paint(&mut exact, key(KeyCode::Backspace), 20);
        assert!(!painted.contains("\x1b[1A"), "{painted:?}");
    }

    #[test]
    fn test_join_previous_moves_up_to_previous_line() {
        let mut editor = prompted_editor();
        type_and_paint(&mut editor, "ab", 80);
        press_and_paint(&mut editor, KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT), 80);
        assert_eq!(
            press_and_paint(&mut editor, key(KeyCode::Backspace), 80),
            format!("\r\x1b[1A\x1b[J{}ab", prompt_prefix())
        );
    }

    #[test]
    fn test_join_previous_accounts_for_wrapped_previous_line() {
        let mut editor = prompted_editor();
        // prompt (2) + 15 chars on a 10-column terminal spans two rows
        type_and_paint(&mut editor, &"p".repeat(15), 10);
        press_and_paint(&mut editor, KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT), 10);
        assert_eq!(
            press_and_paint(&mut editor, key(KeyCode::Backspace), 10),
            format!("\r\x1b[2A\x1b[J{}{}", prompt_prefix(), "p".repeat(15))
        );
    }
}
