//! Bounded task runner.
//!
//! Runs a list of independent fallible tasks with at most `limit` of them in
//! flight. Each task gets its own hard timeout. The result vector is aligned
//! with the input: slot `i` holds task `i`'s value, or `None` when that task
//! failed or ran past the ceiling. One task failing never affects another,
//! and [`BoundedRunner::run`] itself cannot fail.
//!
//! # Scheduling
//!
//! ```text
//!   queue: [t0 t1 t2 t3 t4 t5 ...]     (shared, claimed by index)
//!            ▲   ▲   ▲
//!   worker 0─┘   │   │   each worker loops: claim next → run with
//!   worker 1─────┘   │   timeout → record (index, value) → repeat
//!   worker 2─────────┘
//! ```
//!
//! Workers are futures polled together on the calling task, not spawned
//! tasks, so tasks may borrow from the caller. A slow task only holds its
//! own worker; the others keep draining the queue.

use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tagport_core::constants::{DEFAULT_CONCURRENCY_LIMIT, DEFAULT_TASK_CEILING_MS};
use tracing::trace;

/// Concurrency-limited executor with a per-task timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRunner {
    limit: usize,
    ceiling: Duration,
}

impl Default for BoundedRunner {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONCURRENCY_LIMIT,
            Duration::from_millis(DEFAULT_TASK_CEILING_MS),
        )
    }
}

impl BoundedRunner {
    /// A limit of 0 is treated as 1.
    pub fn new(limit: usize, ceiling: Duration) -> Self {
        Self {
            limit: limit.max(1),
            ceiling,
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Run every task and return their results in input order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use tagport_reader::BoundedRunner;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let runner = BoundedRunner::new(2, Duration::from_millis(50));
    /// let tasks: Vec<_> = (0..4u32)
    ///     .map(|i| move || async move {
    ///         if i == 2 { Err("boom") } else { Ok(i * 10) }
    ///     })
    ///     .collect();
    ///
    /// let results = runner.run(tasks).await;
    /// assert_eq!(results, vec![Some(0), Some(10), None, Some(30)]);
    /// # }
    /// ```
    pub async fn run<F, Fut, T, E>(&self, tasks: Vec<F>) -> Vec<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }

        let queue = Mutex::new(tasks.into_iter().enumerate());
        let queue = &queue;
        let ceiling = self.ceiling;
        let workers = self.limit.min(total);

        let drained = join_all((0..workers).map(|worker| async move {
            let mut finished = Vec::new();
            loop {
                let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                let Some((index, task)) = next else {
                    break;
                };

                let value = match tokio::time::timeout(ceiling, task()).await {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(e)) => {
                        trace!(worker, index, error = %e, "Task failed");
                        None
                    }
                    Err(_) => {
                        trace!(
                            worker,
                            index,
                            ceiling_ms = ceiling.as_millis() as u64,
                            "Task exceeded ceiling"
                        );
                        None
                    }
                };
                finished.push((index, value));
            }
            finished
        }))
        .await;

        let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        for (index, value) in drained.into_iter().flatten() {
            results[index] = value;
        }
        results
    }
}
