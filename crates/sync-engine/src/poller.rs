//! Sync task poller
//!
//! Queries the status of a server-side sync task at a fixed interval until it
//! reaches a terminal state, the deadline passes, or the attempt is cancelled.
//! The first query happens one interval after the poll starts, and at most one
//! query is in flight at any time. All timers live inside [`TaskPoller::poll`]
//! and are dropped when it returns.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::collaborators::{RemoteResult, TaskStatusApi};
use crate::config::SyncConfig;
use crate::types::{TaskReport, TaskStatus};

/// How a poll ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Succeeded,
    /// The task reported failure, with the server's message if any
    Failed { message: Option<String> },
    TimedOut,
    Cancelled,
}

/// Fixed-interval poller with a hard deadline
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    interval: Duration,
    timeout: Duration,
}

impl TaskPoller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.poll_interval(), config.poll_timeout())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `task_id` until it is terminal
    ///
    /// `on_report` is called with every status report received, terminal or
    /// not. A failed status query ends the poll with that error.
    pub async fn poll<F>(
        &self,
        api: &dyn TaskStatusApi,
        task_id: &str,
        cancel: &CancellationToken,
        mut on_report: F,
    ) -> RemoteResult<PollOutcome>
    where
        F: FnMut(&TaskReport) + Send,
    {
        let deadline = Instant::now() + self.timeout;
        let mut queries = 0usize;

        loop {
            let next_query = Instant::now() + self.interval;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("Poll of task '{}' cancelled after {} queries", task_id, queries);
                    return Ok(PollOutcome::Cancelled);
                }
                _ = sleep_until(deadline) => {
                    log::warn!("Poll of task '{}' timed out after {} queries", task_id, queries);
                    return Ok(PollOutcome::TimedOut);
                }
                _ = sleep_until(next_query) => {}
            }

            queries += 1;
            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = sleep_until(deadline) => {
                    log::warn!("Status query {} for task '{}' outlived the deadline", queries, task_id);
                    return Ok(PollOutcome::TimedOut);
                }
                report = api.status(task_id) => report?,
            };

            log::debug!(
                "Task '{}' query {}: {:?} (progress {:?})",
                task_id,
                queries,
                report.status,
                report.progress
            );
            on_report(&report);

            match report.status {
                TaskStatus::Succeeded => return Ok(PollOutcome::Succeeded),
                TaskStatus::Failed => {
                    return Ok(PollOutcome::Failed {
                        message: report.message,
                    })
                }
                TaskStatus::Pending | TaskStatus::Running => {}
            }
        }
    }
}
