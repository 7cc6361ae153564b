use crate::utils::error::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many orchestrations run at once and how many may wait for a slot.
#[derive(Debug, Clone)]
pub struct AdmissionQueue {
    workers: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
}

/// Holds a worker slot until dropped.
#[derive(Debug)]
pub struct Admission {
    _permit: OwnedSemaphorePermit,
}

struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionQueue {
    pub fn new(concurrency: usize, max_pending: usize) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(concurrency)),
            pending: Arc::new(AtomicUsize::new(0)),
            max_pending,
        }
    }

    pub async fn admit(&self) -> Result<Admission> {
        let reserved = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_pending).then_some(n + 1)
            });
        if reserved.is_err() {
            tracing::warn!("🚦 Queue full, rejecting request (max {})", self.max_pending);
            return Err(AppError::QueueFull {
                max: self.max_pending,
            });
        }

        // 等待期間被取消時也要釋放名額
        let _waiting = PendingGuard(self.pending.clone());

        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::ConfigError {
                message: "admission queue closed".to_string(),
            })?;

        Ok(Admission { _permit: permit })
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    async fn wait_for_pending(queue: &AdmissionQueue, expected: usize) {
        while queue.pending() != expected {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_admit_within_concurrency() {
        let queue = AdmissionQueue::new(2, 4);

        let first = assert_ok!(queue.admit().await);
        let _second = assert_ok!(queue.admit().await);
        assert_eq!(queue.available_workers(), 0);
        assert_eq!(queue.pending(), 0);

        drop(first);
        assert_eq!(queue.available_workers(), 1);
    }

    #[tokio::test]
    async fn test_rejects_when_pending_limit_reached() {
        let queue = AdmissionQueue::new(1, 1);
        let running = assert_ok!(queue.admit().await);

        let waiting_queue = queue.clone();
        let waiter = tokio::spawn(async move { waiting_queue.admit().await.map(|_| ()) });
        wait_for_pending(&queue, 1).await;

        let rejected = assert_err!(queue.admit().await);
        assert!(matches!(rejected, AppError::QueueFull { max: 1 }));

        drop(running);
        assert_ok!(waiter.await.unwrap());
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_pending_slot() {
        let queue = AdmissionQueue::new(1, 1);
        let _running = assert_ok!(queue.admit().await);

        let waiting_queue = queue.clone();
        let waiter = tokio::spawn(async move { waiting_queue.admit().await.map(|_| ()) });
        wait_for_pending(&queue, 1).await;

        waiter.abort();
        let _ = waiter.await;
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_zero_pending_rejects_everything() {
        let queue = AdmissionQueue::new(1, 0);
        assert!(queue.admit().await.is_err());
        assert_eq!(queue.max_pending(), 0);
    }
}
