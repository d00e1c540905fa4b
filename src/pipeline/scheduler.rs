//! Bounded concurrent scheduling of per-row work.
//!
//! A counting gate of `2 * worker_count` permits caps in-flight samples so
//! fetched-but-unwritten payloads cannot accumulate without bound. The feeder
//! acquires one permit before spawning each item's task — the single producer
//! suspension point — and each task releases its permit as soon as its result
//! is computed, before the result is delivered, on every exit path. Results
//! arrive in completion order, not submission order; callers identify rows by
//! synthetic key, not arrival position.
//!
//! Every item yields exactly one result, even when `work` panics: the panic
//! unwinds its own task and the item is converted through the caller-supplied
//! recovery function, so no row is ever dropped silently.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;

/// Runs many work items concurrently behind the in-flight gate.
#[derive(Debug, Clone, Copy)]
pub struct BoundedScheduler {
    worker_count: usize,
}

impl BoundedScheduler {
    /// Create a scheduler for `worker_count` parallel workers.
    pub fn new(worker_count: usize) -> Self {
        Self { worker_count }
    }

    /// Size of the in-flight gate.
    pub fn permit_count(&self) -> usize {
        self.worker_count * 2
    }

    /// Process `items` with `work`, delivering results in completion order.
    ///
    /// The returned channel closes once every item has produced exactly one
    /// result. The gate is released on every exit path of `work` before the
    /// result is sent, so the gate never leaks permits and the feeder never
    /// deadlocks. A panic inside `work` is contained: the item is handed back
    /// to `recover` together with the panic message, and the recovered value
    /// is delivered in the panicked result's place.
    pub fn run<I, T, F, Fut, R>(
        &self,
        items: Vec<I>,
        work: F,
        recover: R,
    ) -> mpsc::UnboundedReceiver<T>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        R: Fn(I, String) -> T + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Semaphore::new(self.permit_count()));
        let work = Arc::new(work);
        let recover = Arc::new(recover);

        tokio::spawn(async move {
            for item in items {
                let permit = match gate.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("in-flight gate closed unexpectedly — stopping feed");
                        break;
                    }
                };
                let work = work.clone();
                let recover = recover.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    // The work future runs in its own task so a panic unwinds
                    // there instead of taking this delivery task with it.
                    let fallback = item.clone();
                    let result = match tokio::spawn(work(item)).await {
                        Ok(result) => result,
                        Err(e) => recover(fallback, panic_message(e)),
                    };
                    drop(permit); // release the gate before delivery
                    let _ = tx.send(result);
                });
            }
        });

        rx
    }
}

/// Best-effort description of a failed worker task.
fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                (*message).to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "worker panicked".to_string()
            }
        }
        Err(e) => e.to_string(),
    }
}
