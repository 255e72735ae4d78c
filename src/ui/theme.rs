//! 256-colour palette for the console.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
/// Ends bold/dim without touching the foreground colour.
pub const NORMAL_INTENSITY: &str = "\x1b[22m";
pub const DEFAULT_FG: &str = "\x1b[39m";

pub const ACCENT: &str = "\x1b[38;5;98m";
pub const TEXT: &str = "\x1b[38;5;252m";
pub const NEUTRAL: &str = "\x1b[38;5;244m";
pub const MUTED: &str = "\x1b[38;5;240m";
pub const HEADING: &str = "\x1b[38;5;117m";
pub const WARNING: &str = "\x1b[38;5;214m";
pub const ERROR: &str = "\x1b[38;5;196m";
pub const THINKING: &str = "\x1b[38;5;244m";
pub const INLINE_CODE: &str = "\x1b[38;5;222m";
