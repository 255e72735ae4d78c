pub mod agent;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod terminal;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;
