pub mod ansi;
pub mod editor;
pub mod markdown;
pub mod stream;
pub mod theme;
pub mod tool_activity;
