use crate::ui::theme::RESET;
use regex::Regex;
use std::sync::OnceLock;
use unicode_width::UnicodeWidthChar;

pub const DEFAULT_COLUMNS: usize = 80;
const TAB_WIDTH: usize = 8;

fn csi_pattern() -> &'static Regex {
    static CSI: OnceLock<Regex> = OnceLock::new();
    CSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid CSI pattern"))
}

/// Removes CSI sequences (colours, erase, cursor moves), all zero-width.
pub fn strip_ansi(text: &str) -> String {
    csi_pattern().replace_all(text, "").into_owned()
}

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

/// Columns `text` occupies once escape sequences are interpreted.
pub fn visible_width(text: &str) -> usize {
    display_width(&strip_ansi(text))
}

/// Keeps at most `max_width` visible columns of `text`, copying escape
/// sequences through untouched.
pub fn truncate_visible(text: &str, max_width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut used = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            out.push(ch);
            for next in chars.by_ref() {
                out.push(next);
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Replaces each tab with spaces up to the next 8-column stop, counting
/// columns from the start of each line and skipping escape sequences.
pub fn expand_tabs(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + TAB_WIDTH);
    let mut column = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\x1b' if chars.peek() == Some(&'[') => {
                out.push(ch);
                for next in chars.by_ref() {
                    out.push(next);
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            '\t' => {
                let pad = TAB_WIDTH - column % TAB_WIDTH;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' => {
                out.push(ch);
                column = 0;
            }
            _ => {
                out.push(ch);
                column += char_display_width(ch);
            }
        }
    }
    out
}

/// Pads `line` with spaces to `width` visible columns. Long lines are cut
/// and closed with a reset so trailing styling cannot bleed into the pad.
pub fn pad_visible(line: &str, width: usize) -> String {
    let current = visible_width(line);
    if current > width {
        let mut cut = truncate_visible(line, width);
        cut.push_str(RESET);
        let pad = width.saturating_sub(visible_width(&cut));
        return format!("{cut}{}", " ".repeat(pad));
    }
    format!("{line}{}", " ".repeat(width - current))
}

/// Rounded box spanning `columns` terminal columns.
pub fn draw_box(lines: &[String], border: &str, columns: usize) -> String {
    let inner = columns.saturating_sub(4).max(1);
    let rule = "─".repeat(inner + 2);

    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("{border}╭{rule}╮{RESET}"));
    for line in lines {
        out.push(format!(
            "{border}│{RESET} {} {border}│{RESET}",
            pad_visible(&expand_tabs(line), inner)
        ));
    }
    out.push(format!("{border}╰{rule}╯{RESET}"));
    out.join("\n")
}
