use std::{num::NonZeroU64, time::Duration};

use crate::backoff::BackoffPolicy;

/// Default bound on each engine round-trip issued by an operator command.
pub const DEFAULT_CLIENT_RETRY_TIMEOUT: Duration = Duration::from_millis(500);

/// Settings shared by the operator commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    pub(crate) application: String,
    pub(crate) worker_instances: NonZeroU64,
    pub(crate) client_retry_timeout: Duration,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) clock_read_ticks: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig {
            application: "flow".to_string(),
            worker_instances: NonZeroU64::MIN,
            client_retry_timeout: DEFAULT_CLIENT_RETRY_TIMEOUT,
            backoff: BackoffPolicy::default(),
            clock_read_ticks: 1,
        }
    }
}

impl OperatorConfig {
    /// Application name shown in command output.
    pub fn application(self, application: impl Into<String>) -> Self {
        OperatorConfig {
            application: application.into(),
            ..self
        }
    }

    /// Number of workers processing notifications.
    pub fn worker_instances(self, worker_instances: NonZeroU64) -> Self {
        OperatorConfig {
            worker_instances,
            ..self
        }
    }

    /// Upper bound on every engine round-trip.
    pub fn client_retry_timeout(self, client_retry_timeout: Duration) -> Self {
        OperatorConfig {
            client_retry_timeout,
            ..self
        }
    }

    /// Sleep sizing between quiescence polls.
    pub fn backoff(self, backoff: BackoffPolicy) -> Self {
        OperatorConfig { backoff, ..self }
    }

    /// How far a bare clock read advances the logical clock.
    ///
    /// An idle engine shows `T2 == T1 + clock_read_ticks` across one poll.
    pub fn clock_read_ticks(self, clock_read_ticks: u64) -> Self {
        OperatorConfig {
            clock_read_ticks,
            ..self
        }
    }
}

impl OperatorConfig {
    /// Configured application name.
    pub fn application_name(&self) -> &str {
        &self.application
    }

    /// Configured worker count.
    pub fn workers(&self) -> NonZeroU64 {
        self.worker_instances
    }

    /// Configured round-trip bound.
    pub fn retry_timeout(&self) -> Duration {
        self.client_retry_timeout
    }

    /// Configured backoff policy.
    pub fn backoff_policy(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Configured clock advance per bare read.
    pub fn read_ticks(&self) -> u64 {
        self.clock_read_ticks
    }
}
