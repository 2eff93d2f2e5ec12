#![deny(missing_docs)]
//! Shared logging utilities for the promptcast workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread job context that prefixes status lines, and a minimal test
//! initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Ordinal of the job currently being processed on this thread (0 = none).
    static JOB_ORDINAL: Cell<usize> = const { Cell::new(0) };
}

/// Sets the ordinal of the job being processed on the current thread.
/// The orchestrator calls this whenever it starts a new job.
pub fn set_job_ordinal(ordinal: usize) {
    JOB_ORDINAL.with(|v| v.set(ordinal));
}

/// Clears the job context once a run has ended.
pub fn clear_job_ordinal() {
    JOB_ORDINAL.with(|v| v.set(0));
}

/// Retrieves the ordinal of the job being processed on the current thread.
/// Returns 0 outside of a job.
pub fn job_ordinal() -> usize {
    JOB_ORDINAL.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs a human-readable status line for a pipeline stage.
///
/// The line is prefixed with the current job ordinal when one is set, e.g.
/// `[job 2] generating: "a red fox"`.
#[macro_export]
macro_rules! engine_status {
    ($stage:expr, $($arg:tt)*) => {{
        let ordinal = $crate::job_ordinal();
        if ordinal == 0 {
            log::info!(target: "status", "{}: {}", $stage, format_args!($($arg)*));
        } else {
            log::info!(
                target: "status",
                "[job {}] {}: {}",
                ordinal,
                $stage,
                format_args!($($arg)*)
            );
        }
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
    use super::{clear_job_ordinal, job_ordinal, set_job_ordinal};

    #[test]
    fn job_ordinal_is_thread_local_and_clearable() {
        assert_eq!(job_ordinal(), 0);
        set_job_ordinal(3);
        assert_eq!(job_ordinal(), 3);

        let other = std::thread::spawn(job_ordinal).join().unwrap();
        assert_eq!(other, 0);

        clear_job_ordinal();
        assert_eq!(job_ordinal(), 0);
    }
}
