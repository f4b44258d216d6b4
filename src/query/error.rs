use thiserror::Error;

/// Caller mistakes detected while building a scan or backoff configuration.
///
/// These are raised before any engine round-trip and always name the
/// offending input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// More than one of the exact / prefix / range row selectors was supplied.
    #[error("conflicting row selectors: {} cannot be combined", selectors.join(", "))]
    ConflictingRowSelectors {
        /// Every selector option that was set, in declaration order.
        selectors: Vec<&'static str>,
    },
    /// A column specifier had more than one `:` separator.
    #[error("column '{0}' has too many fields (indicated by ':')")]
    MalformedColumn(String),
    /// Backoff bounds where the minimum exceeds the maximum.
    #[error("invalid backoff bounds: min sleep {min}s exceeds max sleep {max}s")]
    InvalidBackoff {
        /// Requested minimum sleep in seconds.
        min: u64,
        /// Requested maximum sleep in seconds.
        max: u64,
    },
}
