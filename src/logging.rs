//! Console logging for the browser.

use log::{Level, SetLoggerError};

/// Route the `log` facade to the browser console at `level`.
///
/// Native builds (unit tests) only set the max level; no logger is installed.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: Level) -> Result<(), SetLoggerError> {
    console_log::init_with_level(level)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: Level) -> Result<(), SetLoggerError> {
    log::set_max_level(level.to_level_filter());
    Ok(())
}
