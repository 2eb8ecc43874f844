#![deny(missing_docs)]
//! Shared logging utilities for the generation-run workspace.
//!
//! This crate provides the `run_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is
//! prefixed with the submission tag of the current thread so the interleaved
//! output of one run can be followed per submission.

use std::cell::Cell;
use std::fmt;

thread_local! {
    /// Thread-local storage for the submission currently being driven.
    static SUBMISSION_TAG: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sets the submission tag for the current thread.
/// The run controller calls this whenever it starts handling a submission.
pub fn set_submission_tag(tag: Option<u64>) {
    SUBMISSION_TAG.with(|v| v.set(tag));
}

/// Retrieves the submission tag for the current thread.
/// Returns `None` if no submission is being driven.
pub fn submission_tag() -> Option<u64> {
    SUBMISSION_TAG.with(|v| v.get())
}

/// Display adapter for the current submission tag, `-` when unset.
#[doc(hidden)]
pub struct TagDisplay(pub Option<u64>);

impl fmt::Display for TagDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(tag) => write!(f, "s{tag}"),
            None => f.write_str("-"),
        }
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! run_trace {
    ($($arg:tt)*) => {{
        log::trace!(
            "[{}] {}",
            $crate::TagDisplay($crate::submission_tag()),
            format_args!($($arg)*)
        );
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! run_info {
    ($($arg:tt)*) => {{
        log::info!(
            "[{}] {}",
            $crate::TagDisplay($crate::submission_tag()),
            format_args!($($arg)*)
        );
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! run_debug {
    ($($arg:tt)*) => {{
        log::debug!(
            "[{}] {}",
            $crate::TagDisplay($crate::submission_tag()),
            format_args!($($arg)*)
        );
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! run_warn {
    ($($arg:tt)*) => {{
        log::warn!(
            "[{}] {}",
            $crate::TagDisplay($crate::submission_tag()),
            format_args!($($arg)*)
        );
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! run_error {
    ($($arg:tt)*) => {{
        log::error!(
            "[{}] {}",
            $crate::TagDisplay($crate::submission_tag()),
            format_args!($($arg)*)
        );
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
    use super::{set_submission_tag, submission_tag, TagDisplay};

    #[test]
    fn tag_is_thread_local_and_resettable() {
        assert_eq!(submission_tag(), None);
        set_submission_tag(Some(7));
        assert_eq!(submission_tag(), Some(7));
        let other = std::thread::spawn(submission_tag).join().unwrap();
        assert_eq!(other, None);
        set_submission_tag(None);
        assert_eq!(submission_tag(), None);
    }

    #[test]
    fn tag_display_formats() {
        assert_eq!(TagDisplay(Some(3)).to_string(), "s3");
        assert_eq!(TagDisplay(None).to_string(), "-");
    }
}
