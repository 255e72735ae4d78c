use crate::agent::{ToolCall, ToolResult, SHELL_TOOL_NAME};
use crate::ui::ansi::draw_box;
use crate::ui::markdown::render_markdown;
use crate::ui::theme::{ACCENT, BOLD, ERROR, MUTED, NEUTRAL, RESET, TEXT, WARNING};
use serde::Deserialize;
use serde_json::Value;

const SHELL_MAX_LINES: usize = 10;
const RESULT_MAX_CHARS: usize = 500;
const RESULT_MAX_LINES: usize = 15;
const ARGS_PREVIEW_CHARS: usize = 200;

/// Result body of the shell tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPayload {
    pub exit_code: Option<i64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub timed_out: Option<bool>,
    pub error: Option<String>,
}

impl ToolResultPayload {
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::debug!(%err, "shell result is not a structured payload");
                None
            }
        }
    }
}

pub fn format_call(call: &ToolCall) -> String {
    let detail = if call.name == SHELL_TOOL_NAME {
        let command = match call.args.get("command") {
            Some(Value::String(command)) => command.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        format!("{MUTED}$ {TEXT}{command}{RESET}")
    } else {
        format!("{NEUTRAL}{}{RESET}", preview_args(&call.args))
    };
    format!("\n  {ACCENT}●{RESET} {NEUTRAL}{}{RESET}  {detail}\n", call.name)
}

fn preview_args(args: &Value) -> String {
    let json = args.to_string();
    if json.chars().count() <= ARGS_PREVIEW_CHARS {
        return json;
    }
    let mut cut: String = json.chars().take(ARGS_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

pub fn format_result(result: &ToolResult, columns: usize) -> String {
    if result.name == SHELL_TOOL_NAME {
        if let Some(payload) = ToolResultPayload::parse(&result.result) {
            return format_shell_result(&payload);
        }
    }
    format_generic_result(result, columns)
}

fn push_capped(out: &mut String, text: &str, color: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let lines: Vec<&str> = text.split('\n').collect();
    for line in lines.iter().take(SHELL_MAX_LINES) {
        out.push_str(&format!("  {color}{line}{RESET}\n"));
    }
    if lines.len() > SHELL_MAX_LINES {
        out.push_str(&format!(
            "  {MUTED}… {} more lines{RESET}\n",
            lines.len() - SHELL_MAX_LINES
        ));
    }
}

pub fn format_shell_result(payload: &ToolResultPayload) -> String {
    let mut out = String::new();
    if let Some(stdout) = &payload.stdout {
        push_capped(&mut out, stdout, NEUTRAL);
    }
    if let Some(stderr) = &payload.stderr {
        push_capped(&mut out, stderr, ERROR);
    }
    if payload.timed_out == Some(true) {
        out.push_str(&format!("  {WARNING}⏱ timed out{RESET}\n"));
    }
    if let Some(error) = payload.error.as_deref().filter(|e| !e.is_empty()) {
        out.push_str(&format!("  {ERROR}{error}{RESET}\n"));
    }
    match payload.exit_code {
        Some(code) if code != 0 => out.push_str(&format!("  {ERROR}{BOLD}✗ exit {code}{RESET}\n")),
        _ => {}
    }
    out
}

pub fn format_generic_result(result: &ToolResult, columns: usize) -> String {
    let color = if result.is_error { ERROR } else { NEUTRAL };

    let body = if result.result.chars().count() > RESULT_MAX_CHARS {
        let head: String = result.result.chars().take(RESULT_MAX_CHARS).collect();
        format!("{head}\n… (truncated)")
    } else {
        result.result.clone()
    };

    let rendered = render_markdown(&body, columns);
    let mut lines: Vec<String> = rendered
        .split('\n')
        .map(|line| format!("  {color}{line}{RESET}"))
        .collect();
    if lines.len() > RESULT_MAX_LINES {
        let hidden = lines.len() - RESULT_MAX_LINES;
        lines.truncate(RESULT_MAX_LINES);
        lines.push(format!("  {MUTED}… ({hidden} more lines){RESET}"));
    }

    let mut out = draw_box(&lines, color, columns);
    out.push('\n');
    out
}
