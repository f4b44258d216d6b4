//! Detect when all reactive work in the cluster has drained.
//!
//! Each poll reads the logical clock, the outstanding notification count and
//! the clock again, in that order and through the same engine handle. The
//! cluster is quiescent only when the count is zero *and* the clock advanced
//! by exactly the ticks our own two reads cost: a larger jump means some
//! transaction committed inside the window, possibly creating and resolving
//! work that a zero count alone would hide.

use std::{num::NonZeroU64, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    backoff::BackoffPolicy,
    engine::{bounded, EngineError, LogicalClock, NotificationSource},
    mvcc::Timestamp,
    observability::{log_error, log_info, log_warn},
    option::OperatorConfig,
};

/// One `(clock, count, clock)` observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkSample {
    /// Clock read before counting.
    pub clock_before: Timestamp,
    /// Outstanding notifications.
    pub outstanding: u64,
    /// Clock read after counting.
    pub clock_after: Timestamp,
}

impl WorkSample {
    /// Build a sample from raw readings.
    pub fn new(clock_before: u64, outstanding: u64, clock_after: u64) -> Self {
        Self {
            clock_before: Timestamp::new(clock_before),
            outstanding,
            clock_after: Timestamp::new(clock_after),
        }
    }

    /// Whether no work was pending and nothing committed during the window.
    pub fn is_quiescent(&self, clock_read_ticks: u64) -> bool {
        self.outstanding == 0
            && self.clock_before.checked_add(clock_read_ticks) == Some(self.clock_after)
    }

    /// Verdict for this sample under the given backoff policy and worker count.
    pub fn verdict(
        &self,
        backoff: &BackoffPolicy,
        workers: NonZeroU64,
        clock_read_ticks: u64,
    ) -> QuiescenceVerdict {
        if self.is_quiescent(clock_read_ticks) {
            QuiescenceVerdict::Finished
        } else {
            QuiescenceVerdict::StillWorking {
                sleep_secs: backoff.next_sleep_secs(self.outstanding, workers),
            }
        }
    }
}

/// Result of judging one [`WorkSample`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuiescenceVerdict {
    /// No work remains.
    Finished,
    /// Work may remain; poll again after `sleep_secs`.
    StillWorking {
        /// Seconds to wait before the next poll.
        sleep_secs: u64,
    },
}

/// How a wait ended without failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// All processing finished.
    Finished {
        /// Polls taken, including the final one.
        polls: u64,
    },
    /// The operator aborted the wait.
    Cancelled {
        /// Polls completed before the abort.
        polls: u64,
    },
}

/// Fatal failure of a wait.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The count or clock source failed; the wait is not retried.
    #[error("failed to sample outstanding work: {0}")]
    Engine(#[from] EngineError),
}

/// Polls the engine until quiescent, cancelled, or unreachable.
#[derive(Debug)]
pub struct QuiescenceDetector<S> {
    source: S,
    config: OperatorConfig,
}

impl<S> QuiescenceDetector<S>
where
    S: NotificationSource + LogicalClock,
{
    /// Detector sampling `source`, which must serve both clock and count on
    /// one logical session.
    pub fn new(source: S, config: OperatorConfig) -> Self {
        Self { source, config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Take one observation: clock, count, clock.
    pub async fn sample(&self) -> Result<WorkSample, EngineError> {
        let timeout = self.config.client_retry_timeout;
        let clock_before = bounded(timeout, self.source.now()).await?;
        let outstanding = bounded(timeout, self.source.count()).await?;
        let clock_after = bounded(timeout, self.source.now()).await?;
        Ok(WorkSample {
            clock_before,
            outstanding,
            clock_after,
        })
    }

    /// Judge a sample with the configured policy.
    pub fn judge(&self, sample: &WorkSample) -> QuiescenceVerdict {
        sample.verdict(
            &self.config.backoff,
            self.config.worker_instances,
            self.config.clock_read_ticks,
        )
    }

    /// Poll until the cluster is quiescent.
    ///
    /// `cancel` is checked before every poll and interrupts the sleep between
    /// polls. A failed sample ends the wait immediately.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<WaitOutcome, WaitError> {
        log_info!(
            component = "quiescence",
            event = "wait_started",
            workers = self.config.worker_instances.get(),
            "the wait will exit when all notifications are processed"
        );
        let mut polls = 0u64;
        loop {
            if cancel.is_cancelled() {
                return Ok(cancelled(polls));
            }

            let sample = match self.sample().await {
                Ok(sample) => sample,
                Err(err) => {
                    log_error!(
                        component = "quiescence",
                        event = "sample_failed",
                        polls = polls,
                        error = %err,
                    );
                    return Err(WaitError::Engine(err));
                }
            };
            polls += 1;

            match self.judge(&sample) {
                QuiescenceVerdict::Finished => {
                    log_info!(
                        component = "quiescence",
                        event = "processing_finished",
                        polls = polls,
                        clock = %sample.clock_after,
                        "all processing has finished"
                    );
                    return Ok(WaitOutcome::Finished { polls });
                }
                QuiescenceVerdict::StillWorking { sleep_secs } => {
                    log_info!(
                        component = "quiescence",
                        event = "work_outstanding",
                        outstanding = sample.outstanding,
                        clock_before = %sample.clock_before,
                        clock_after = %sample.clock_after,
                        sleep_secs = sleep_secs,
                        "{} notifications are still outstanding, will try again in {} seconds",
                        sample.outstanding,
                        sleep_secs
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(cancelled(polls)),
                        _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
                    }
                }
            }
        }
    }
}

fn cancelled(polls: u64) -> WaitOutcome {
    log_warn!(
        component = "quiescence",
        event = "wait_cancelled",
        polls = polls,
    );
    WaitOutcome::Cancelled { polls }
}
