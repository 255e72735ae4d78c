//! Line-level markdown to ANSI conversion.
//!
//! Deliberately heuristic: headers, rules, bullets, bold, dim emphasis and
//! inline code on a single line, plus fenced blocks tracked across lines.
//! No nesting, links, tables or reflow.

use crate::ui::theme::{
    BOLD, DEFAULT_FG, DIM, HEADING, INLINE_CODE, NEUTRAL, NORMAL_INTENSITY, RESET,
};
use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const RULE_WIDTH: usize = 40;
const FENCE: &str = "```";

struct InlinePatterns {
    bullet: Regex,
    bold: Regex,
    emphasis: Regex,
    code: Regex,
}

fn patterns() -> &'static InlinePatterns {
    static PATTERNS: OnceLock<InlinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| InlinePatterns {
        bullet: Regex::new(r"^(\s*)[-*] ").expect("valid bullet pattern"),
        bold: Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"),
        emphasis: Regex::new(r"(^|[^*])\*([^*]+)\*").expect("valid emphasis pattern"),
        code: Regex::new(r"`([^`]+)`").expect("valid code pattern"),
    })
}

/// A fence opens or closes a code block: three backticks, optionally
/// followed by an info string such as a language name.
pub fn is_fence(line: &str) -> bool {
    line.trim()
        .strip_prefix(FENCE)
        .is_some_and(|info| !info.contains('`'))
}

fn is_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && (trimmed.chars().all(|c| c == '-') || trimmed.chars().all(|c| c == '*'))
}

pub fn fence_separator(columns: usize) -> String {
    let width = RULE_WIDTH.min(columns.saturating_sub(2)).max(1);
    format!("{NEUTRAL}{}{RESET}", "─".repeat(width))
}

pub fn format_code_line(line: &str) -> String {
    format!("{NEUTRAL}  {line}{RESET}")
}

/// Formats one line outside a code block.
pub fn format_line(line: &str) -> String {
    for prefix in ["### ", "## ", "# "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return format!("{BOLD}{HEADING}{rest}{RESET}");
        }
    }

    if is_rule(line) {
        return format!("{DIM}{}{RESET}", "─".repeat(RULE_WIDTH));
    }

    let p = patterns();
    let line = p.bullet.replace(line, "${1}• ");
    let line = p
        .bold
        .replace_all(&line, format!("{BOLD}${{1}}{NORMAL_INTENSITY}").as_str());

    let emphasis_source: &str = &line;
    let line = p
        .emphasis
        .replace_all(emphasis_source, |caps: &Captures| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            if emphasis_source[whole.end..].starts_with('*') {
                return caps[0].to_string();
            }
            format!("{}{DIM}{}{NORMAL_INTENSITY}", &caps[1], &caps[2])
        });

    p.code
        .replace_all(&line, format!("{INLINE_CODE}${{1}}{DEFAULT_FG}").as_str())
        .into_owned()
}

/// Renders one line, updating `in_fence` when the line is a fence.
pub fn render_line(line: &str, in_fence: &mut bool, columns: usize) -> String {
    if is_fence(line) {
        *in_fence = !*in_fence;
        return fence_separator(columns);
    }
    if *in_fence {
        return format_code_line(line);
    }
    format_line(line)
}

/// Converts a whole block of markdown, one line at a time.
pub fn render_markdown(text: &str, columns: usize) -> String {
    let mut in_fence = false;
    text.lines()
        .map(|line| render_line(line, &mut in_fence, columns))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ansi::strip_ansi;

    #[test]
    fn test_headers_strip_prefix_and_bold() {
        assert_eq!(format_line("# Title"), format!("{BOLD}{HEADING}Title{RESET}"));
        assert_eq!(format_line("## Sub"), format!("{BOLD}{HEADING}Sub{RESET}"));
        assert_eq!(format_line("### Deep"), format!("{BOLD}{HEADING}Deep{RESET}"));
        assert_eq!(strip_ansi(&format_line("#hashtag")), "#hashtag");
    }

    #[test]
    fn test_rules_and_bullets() {
        let rule = format!("{DIM}{}{RESET}", "─".repeat(RULE_WIDTH));
        assert_eq!(format_line("---"), rule);
        assert_eq!(format_line("  *****  "), rule);
        assert_ne!(format_line("--"), rule);

        assert_eq!(format_line("- item"), "• item");
        assert_eq!(format_line("  * nested"), "  • nested");
        assert_eq!(format_line("-not a bullet"), "-not a bullet");
    }

    #[test]
    fn test_inline_bold_emphasis_and_code() {
        assert_eq!(
            format_line("a **b** c"),
            format!("a {BOLD}b{NORMAL_INTENSITY} c")
        );
        assert_eq!(
            format_line("a *b* c"),
            format!("a {DIM}b{NORMAL_INTENSITY} c")
        );
        assert_eq!(
            format_line("run `ls -la` now"),
            format!("run {INLINE_CODE}ls -la{DEFAULT_FG} now")
        );
        assert_eq!(
            strip_ansi(&format_line("**x** and *y* and `z`")),
            "x and y and z"
        );
    }

    #[test]
    fn test_bullet_with_inline_styles() {
        assert_eq!(
            format_line("- **bold** point"),
            format!("• {BOLD}bold{NORMAL_INTENSITY} point")
        );
    }

    #[test]
    fn test_fence_detection() {
        assert!(is_fence("```"));
        assert!(is_fence("```rust"));
        assert!(is_fence("  ```  "));
        assert!(!is_fence("``` inline ``` code"));
        assert!(!is_fence("text ```"));
    }

    #[test]
    fn test_render_markdown_keeps_fenced_lines_verbatim() {
        let rendered = render_markdown("# Head\n```\n# not a header\n- not a bullet\n```\n- item", 80);
        let lines: Vec<String> = rendered.lines().map(strip_ansi).collect();
        assert_eq!(
            lines,
            vec![
                "Head".to_string(),
                "─".repeat(RULE_WIDTH),
                "  # not a header".to_string(),
                "  - not a bullet".to_string(),
                "─".repeat(RULE_WIDTH),
                "• item".to_string(),
            ]
        );
    }

    #[test]
    fn test_fence_separator_respects_narrow_terminals() {
        assert_eq!(strip_ansi(&fence_separator(12)), "─".repeat(10));
        assert_eq!(strip_ansi(&fence_separator(200)), "─".repeat(RULE_WIDTH));
    }
}
