//! Serialized background execution for key generation.
//!
//! A [`KeygenQueue`] owns one named worker thread fed by an unbounded FIFO
//! channel, so jobs run one at a time and complete in submission order.
//! Each job reports back through a one-shot channel that the submitter waits
//! on, either blocking ([`JobHandle::wait`]) or awaiting
//! ([`JobHandle::wait_async`]).

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use cryptoplane_core::KeygenConfig;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{PkError, PkResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    pub jobs_submitted_total: u64,
    pub jobs_completed_total: u64,
    pub jobs_panicked_total: u64,
}

/// Single-worker job queue.
pub struct KeygenQueue {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl KeygenQueue {
    /// Spawns the worker thread under `name`.
    pub fn start(name: impl Into<String>) -> PkResult<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    job();
                }
            })
            .map_err(|e| {
                PkError::SubmissionFailed(format!("failed to spawn worker {name}: {e}"))
            })?;

        info!(worker = %name, "key generation queue started");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn from_config(config: &KeygenConfig) -> PkResult<Self> {
        Self::start(config.worker_name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the queue still accepts jobs.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Queues `job` behind every job already submitted.
    ///
    /// A job that panics is contained: its handle resolves to
    /// [`PkError::OperationFailed`] and the worker moves on.
    pub fn submit<F, T>(&self, job: F) -> PkResult<JobHandle<T>>
    where
        F: FnOnce() -> PkResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let counters = Arc::clone(&self.counters);
        let worker = self.name.clone();

        let wrapped: Job = Box::new(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(result) => result,
                Err(_) => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    error!(worker = %worker, "key generation job panicked");
                    Err(PkError::OperationFailed(
                        "key generation job panicked".to_string(),
                    ))
                }
            };
            counters.completed.fetch_add(1, Ordering::Relaxed);
            if done_tx.send(result).is_err() {
                debug!(worker = %worker, "job submitter went away before completion");
            }
        });

        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard
            .as_ref()
            .ok_or_else(|| PkError::SubmissionFailed(format!("queue {} is shut down", self.name)))?;
        sender
            .send(wrapped)
            .map_err(|_| PkError::SubmissionFailed(format!("worker {} has exited", self.name)))?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        Ok(JobHandle { done: done_rx })
    }

    /// Stops accepting jobs, runs whatever is already queued, and joins the
    /// worker. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() && worker.is_none() {
            return;
        }
        drop(sender);

        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                warn!(worker = %self.name, "queue shut down from its own worker; not joining");
            } else if worker.join().is_err() {
                error!(worker = %self.name, "key generation worker terminated abnormally");
            }
        }
        info!(
            worker = %self.name,
            completed = self.counters.completed.load(Ordering::Relaxed),
            "key generation queue shut down"
        );
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            jobs_submitted_total: self.counters.submitted.load(Ordering::Relaxed),
            jobs_completed_total: self.counters.completed.load(Ordering::Relaxed),
            jobs_panicked_total: self.counters.panicked.load(Ordering::Relaxed),
        }
    }
}

impl Drop for KeygenQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Completion of one submitted job.
#[must_use = "a submitted job's result is only observable through its handle"]
pub struct JobHandle<T> {
    done: oneshot::Receiver<PkResult<T>>,
}

impl<T> JobHandle<T> {
    /// Blocks the current thread until the job finishes.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`JobHandle::wait_async`] there.
    pub fn wait(self) -> PkResult<T> {
        self.done.blocking_recv().unwrap_or_else(|_| Err(lost_job()))
    }

    pub async fn wait_async(self) -> PkResult<T> {
        self.done.await.unwrap_or_else(|_| Err(lost_job()))
    }
}

fn lost_job() -> PkError {
    PkError::SubmissionFailed("worker dropped the job before completing it".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    #[test]
    fn test_jobs_complete_in_submission_order() {
        let queue = KeygenQueue::start("test-order").unwrap();
        let (order_tx, order_rx) = std_mpsc::channel();

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let order_tx = order_tx.clone();
                queue
                    .submit(move || {
                        thread::sleep(Duration::from_millis(u64::from(8 - i)));
                        order_tx.send(i).unwrap();
                        Ok(i)
                    })
                    .unwrap()
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.wait().unwrap(), i as u32);
        }
        drop(order_tx);
        let order: Vec<u32> = order_rx.iter().collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
        assert_eq!(queue.metrics().jobs_completed_total, 8);
    }

    #[test]
    fn test_panicking_job_is_contained() {
        let queue = KeygenQueue::start("test-panic").unwrap();
        let failing = queue
            .submit::<_, ()>(|| panic!("prime search exploded"))
            .unwrap();
        assert!(matches!(failing.wait(), Err(PkError::OperationFailed(_))));

        let next = queue.submit(|| Ok(7)).unwrap();
        assert_eq!(next.wait().unwrap(), 7);
        assert_eq!(queue.metrics().jobs_panicked_total, 1);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let queue = KeygenQueue::start("test-shutdown").unwrap();
        assert!(queue.is_running());
        queue.shutdown();
        queue.shutdown();
        assert!(!queue.is_running());
        assert!(matches!(
            queue.submit(|| Ok(())),
            Err(PkError::SubmissionFailed(_))
        ));
    }

    #[test]
    fn test_shutdown_drains_pending_jobs() {
        let queue = KeygenQueue::start("test-drain").unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                queue
                    .submit(move || {
                        thread::sleep(Duration::from_millis(5));
                        Ok(i)
                    })
                    .unwrap()
            })
            .collect();
        queue.shutdown();
        let results: Vec<i32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_wait_async() {
        let queue = KeygenQueue::start("test-async").unwrap();
        let handle = queue.submit(|| Ok("done")).unwrap();
        assert_eq!(handle.wait_async().await.unwrap(), "done");
    }

    #[test]
    fn test_worker_thread_is_named() {
        let queue = KeygenQueue::start("named-worker").unwrap();
        let name = queue
            .submit(|| Ok(thread::current().name().map(str::to_owned)))
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(name.as_deref(), Some("named-worker"));
    }
}
