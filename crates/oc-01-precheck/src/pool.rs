//! Bounded worker pool.
//!
//! A dispatcher calls [`WorkerPool::submit`] for each job. Submitting waits
//! while every worker slot is busy, which pushes backpressure onto the
//! dispatcher's input queue. [`WorkerPool::stop_wait`] waits for in-flight
//! jobs and refuses new ones.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("worker pool {0} is closed")]
pub struct PoolClosed(pub &'static str);

pub struct WorkerPool {
    name: &'static str,
    capacity: usize,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    /// A pool running at most `capacity` jobs at once (at least one).
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently running.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    /// Run `job` on a free worker slot, waiting for one if necessary.
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolClosed(self.name))?;

        tokio::spawn(async move {
            job.await;
            drop(slot);
        });
        Ok(())
    }

    /// Wait for every running job to finish, then close the pool.
    pub async fn stop_wait(&self) {
        // Holding every slot means nothing is running.
        if let Ok(all) = self.slots.acquire_many(self.capacity as u32).await {
            self.slots.close();
            drop(all);
        }
        debug!(pool = self.name, "Worker pool drained");
    }
}
