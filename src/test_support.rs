use crate::ui::ansi::strip_ansi;
use tokio::sync::Mutex as AsyncMutex;

/// Serializes tests that touch `CRUX_*` and other environment variables.
/// Sync tests take it with `.blocking_lock()`, async tests with `.lock().await`.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Captured console bytes with styling removed.
pub fn plain_text(bytes: &[u8]) -> String {
    strip_ansi(&String::from_utf8_lossy(bytes))
}
