//! Logging infrastructure for flowctl.
//!
//! flowctl uses `tracing` for structured logging. All events use target
//! "flowctl" and include an `event` field for filtering.
//!
//! ## Library Integration
//!
//! The library never initializes a global subscriber; the `flowctl` binary
//! installs `tracing_subscriber` itself.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: module/subsystem (e.g., "quiescence", "scanner")
//! - Use `%` for Display, `?` for Debug formatting

/// Target for all flowctl log events.
pub(crate) const FLOWCTL_TARGET: &str = "flowctl";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "quiescence",
///     event = "work_outstanding",
///     outstanding = 42,
///     sleep_secs = 10,
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::FLOWCTL_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::FLOWCTL_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::FLOWCTL_TARGET, $($field)*)
    };
}

/// Macro for error-level log events.
macro_rules! log_error {
    ($($field:tt)*) => {
        ::tracing::error!(target: $crate::observability::FLOWCTL_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
