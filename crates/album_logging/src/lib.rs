#![deny(missing_docs)]
//! Shared logging utilities for the album grabber workspace.
//!
//! Library crates log through the `album_*` macros below so that the
//! backend can be chosen once by the binary (terminal, run-directory log
//! file, or both) and once by the test harness.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! album_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! album_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! album_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! album_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! album_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Level used by the binary when `--verbose` is not given.
pub fn default_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
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
    fn verbose_lowers_level_to_debug() {
        assert_eq!(default_level(true), log::LevelFilter::Debug);
        assert_eq!(default_level(false), log::LevelFilter::Info);
    }

    #[test]
    fn macros_expand_without_logger() {
        initialize_for_tests();
        album_info!("page {} fetched", 1);
        album_debug!("debug {}", "line");
        album_warn!("warn");
    }
}
