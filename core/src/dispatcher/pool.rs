//! Bounded pool for blocking engine calls

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Failure of a pooled job outside of its own return value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool was shut down before the job could start
    #[error("worker pool is closed")]
    Closed,

    /// The job panicked
    #[error("search worker panicked: {0}")]
    Panicked(String),

    /// The blocking task was cancelled before completion
    #[error("search worker was cancelled")]
    Cancelled,
}

/// Fixed-size pool running blocking jobs on tokio's blocking threads
///
/// Admission goes through a fair semaphore, so waiting jobs start in the
/// order they arrived and at most `size` jobs execute at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool allowing `size` concurrent jobs
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Configured pool size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop admitting new jobs; queued jobs fail with [`PoolError::Closed`]
    pub fn close(&self) {
        self.permits.close();
    }

    /// Wait for a free slot
    ///
    /// Slots are granted in call order, so a caller that admits jobs one
    /// after another starts them in that order.
    pub async fn admit(&self) -> Result<Admission, PoolError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(Admission { permit })
    }

    /// Run `job` once a slot is free and return its value
    ///
    /// A panic inside `job` is caught and reported as [`PoolError::Panicked`];
    /// it never propagates to the caller or to other jobs.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.admit().await?.run(job).await
    }
}

/// A held pool slot, released when the job it runs finishes
#[derive(Debug)]
pub struct Admission {
    permit: OwnedSemaphorePermit,
}

impl Admission {
    /// Run `job` on the blocking threads while holding this slot
    pub async fn run<F, T>(self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.permit;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        });

        handle.await.map_err(|e| {
            if e.is_panic() {
                PoolError::Panicked(panic_message(e.into_panic()))
            } else {
                PoolError::Cancelled
            }
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_job_value() {
        let pool = WorkerPool::new(1);
        assert_eq!(pool.run(|| 21 * 2).await, Ok(42));
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let pool = WorkerPool::new(1);
        let result: Result<(), _> = pool.run(|| panic!("engine exploded")).await;
        assert_eq!(result, Err(PoolError::Panicked("engine exploded".into())));

        // The slot is released after a panic
        assert_eq!(pool.run(|| 1).await, Ok(1));
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_jobs() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert_eq!(pool.run(|| 1).await, Err(PoolError::Closed));
    }

    #[tokio::test]
    async fn test_admission_holds_slot_until_job_ends() {
        let pool = WorkerPool::new(2);
        let first = pool.admit().await.unwrap();
        let second = pool.admit().await.unwrap();
        assert_eq!(pool.available(), 0);

        assert_eq!(first.run(|| "done").await, Ok("done"));
        assert_eq!(pool.available(), 1);

        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut jobs = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            jobs.spawn(async move {
                pool.run(move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            });
        }
        while let Some(joined) = jobs.join_next().await {
            assert!(joined.unwrap().is_ok());
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }
}
