//! Scheduler for concurrent detail fetches
//!
//! This module handles:
//! - Bounding in-flight detail fetches with a semaphore-backed worker pool
//! - Delivering results in completion order to a single consumer
//! - Isolating a faulting fetch so the rest of the batch completes
//! - The politeness pause between batches

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs batches of fetch jobs under a fixed-size worker pool
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    /// Maximum number of jobs in flight at once
    workers: usize,

    /// Pause applied by `pause` between batches
    politeness_delay: Duration,
}

impl FetchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `workers` - Pool size; values below 1 are raised to 1
    /// * `politeness_delay` - Pause between batches
    pub fn new(workers: usize, politeness_delay: Duration) -> Self {
        Self {
            workers: workers.max(1),
            politeness_delay,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `fetch` for every job and hands each result to `sink`
    ///
    /// Jobs start in submission order but `sink` sees them in completion order.
    /// `sink` runs on the calling task only, so it may mutate state without
    /// further locking.
    ///
    /// A job whose fetch panics or is otherwise lost still reaches `sink`,
    /// paired with `R::default()`.
    pub async fn run<J, R, F, Fut, S>(&self, jobs: Vec<J>, fetch: F, mut sink: S)
    where
        J: Clone + Send + 'static,
        R: Default + Send + 'static,
        F: Fn(J) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        S: FnMut(J, R),
    {
        if jobs.is_empty() {
            return;
        }

        let total = jobs.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let work = fetch(job.clone());

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (job, R::default()),
                };

                // A separate task keeps a panic inside `work` from taking the
                // job with it
                let result = match tokio::spawn(work).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("Detail fetch task failed: {}", e);
                        R::default()
                    }
                };

                (job, result)
            });
        }

        let mut completed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((job, result)) => {
                    completed += 1;
                    sink(job, result);
                }
                Err(e) => {
                    tracing::error!("Scheduler worker lost: {}", e);
                }
            }
        }

        tracing::debug!(
            "Batch finished: {}/{} jobs delivered with {} workers",
            completed,
            total,
            self.workers
        );
    }

    /// Sleeps for the configured politeness delay
    pub async fn pause(&self) {
        if !self.politeness_delay.is_zero() {
            tokio::time::sleep(self.politeness_delay).await;
        }
    }
}
