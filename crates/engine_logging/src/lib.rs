#![deny(missing_docs)]
//! Shared logging utilities for the unsend workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! the process-wide run tag that prefixes every engine log line, and a minimal
//! test initializer for the global logger.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of the removal run currently driving the engine. Zero means idle.
static RUN_ID: AtomicU64 = AtomicU64::new(0);

/// Sets the run tag used by the logging macros.
/// The removal loop calls this when a run starts and resets it to 0 when it ends.
pub fn set_run_id(run_id: u64) {
    RUN_ID.store(run_id, Ordering::Relaxed);
}

/// Retrieves the current run tag. Returns 0 while no run is active.
pub fn get_run_id() -> u64 {
    RUN_ID.load(Ordering::Relaxed)
}

/// Logs a trace-level message tagged with the current run.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[run {}] {}", $crate::get_run_id(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current run.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[run {}] {}", $crate::get_run_id(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current run.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[run {}] {}", $crate::get_run_id(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current run.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[run {}] {}", $crate::get_run_id(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current run.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[run {}] {}", $crate::get_run_id(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_tag_round_trips() {
        set_run_id(7);
        assert_eq!(get_run_id(), 7);
        set_run_id(0);
        assert_eq!(get_run_id(), 0);
    }
}
