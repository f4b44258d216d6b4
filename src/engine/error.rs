use std::{error::Error, time::Duration};

use thiserror::Error;

/// Failure reported by an engine round-trip.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// The engine did not answer within the client retry timeout.
    #[error("engine did not respond within {0:?}")]
    Timeout(Duration),
    /// Any other engine-side failure.
    #[error("engine error: {0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

impl EngineError {
    /// Wrap an arbitrary engine-side error.
    pub fn other(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        EngineError::Other(err.into())
    }

    /// Whether the engine was unreachable or too slow to answer.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_) | EngineError::Timeout(_))
    }
}
